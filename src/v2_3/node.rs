//! Composed nodes with the RSD 2.3 attach semantics.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::connector::Connector;
use crate::error::{Error, Result};
use crate::fields;
use crate::resource::Resource;
use crate::v2_1::node::Node as NodeV2_1;

const ATTACH_ENDPOINT_ACTION: &str = "#ComposedNode.AttachEndpoint";

/// One parameter of an attach-resource action-info document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionParameter {
    pub name: Option<String>,
    pub required: Option<bool>,
    pub data_type: Option<String>,
    pub object_data_type: Option<String>,
    /// For the `Resource` parameter the advertised objects are narrowed to
    /// their member identities; other parameters keep the raw values.
    pub allowable_values: Option<Value>,
}

/// The `ActionInfo` document describing an attach-resource action.
#[derive(Debug)]
pub struct AttachResourceActionInfo {
    resource: Resource,
}

impl AttachResourceActionInfo {
    pub async fn load(
        conn: Arc<Connector>,
        path: impl Into<String>,
        redfish_version: Option<String>,
    ) -> Result<Self> {
        Ok(Self::new(Resource::load(conn, path, redfish_version).await?))
    }

    pub(crate) fn new(resource: Resource) -> Self {
        Self { resource }
    }

    pub fn path(&self) -> &str {
        self.resource.path()
    }

    pub fn identity(&self) -> Result<String> {
        self.resource.required_string("Id")
    }

    pub fn name(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Name"])
    }

    pub fn description(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Description"])
    }

    pub fn parameters(&self) -> Vec<ActionParameter> {
        let items = fields::value_at(self.resource.json(), &["Parameters"])
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        items
            .iter()
            .map(|item| {
                let name = fields::string_at(item, &["Name"]);
                let mut allowable_values = fields::value_at(item, &["AllowableValues"]).cloned();
                if name.as_deref() == Some("Resource") {
                    allowable_values = allowable_values
                        .map(|values| json!(fields::members_identities(&values)));
                }
                ActionParameter {
                    name,
                    required: fields::bool_at(item, &["Required"]),
                    data_type: fields::string_at(item, &["DataType"]),
                    object_data_type: fields::string_at(item, &["ObjectDataType"]),
                    allowable_values,
                }
            })
            .collect()
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

/// A composed node. The attribute map carries over from 2.1; only the
/// attach-endpoint payload changes.
#[derive(Debug)]
pub struct Node {
    inner: NodeV2_1,
}

impl Node {
    pub async fn load(
        conn: Arc<Connector>,
        path: impl Into<String>,
        redfish_version: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            inner: NodeV2_1::load(conn, path, redfish_version).await?,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_resource(resource: Resource) -> Self {
        Self {
            inner: NodeV2_1::new(resource),
        }
    }

    pub fn base(&self) -> &NodeV2_1 {
        &self.inner
    }

    fn resource(&self) -> &Resource {
        self.inner.resource()
    }

    /// Attach an endpoint from the available pool to the composed node.
    /// `protocol` names the protocol of the remote drive, e.g. `NVMe`.
    pub async fn attach_endpoint(
        &self,
        endpoint: Option<&str>,
        protocol: Option<&str>,
    ) -> Result<()> {
        let block = self.resource().action_block(ATTACH_ENDPOINT_ACTION)?;
        let target_uri = self.resource().action_target(ATTACH_ENDPOINT_ACTION)?;
        let valid_endpoints = fields::value_at(block, &["Resource@Redfish.AllowableValues"])
            .map(fields::members_identities)
            .unwrap_or_default();

        if let Some(endpoint) = endpoint {
            if !valid_endpoints.iter().any(|v| v == endpoint) {
                return Err(Error::InvalidParameter {
                    parameter: "endpoint",
                    value: endpoint.to_string(),
                    valid_values: valid_endpoints,
                });
            }
        }

        let mut data = Map::new();
        if let Some(endpoint) = endpoint {
            data.insert("Resource".to_string(), json!({"@odata.id": endpoint}));
        }
        if let Some(protocol) = protocol {
            data.insert("Protocol".to_string(), json!(protocol));
        }

        self.resource()
            .connector()
            .post(&target_uri, Some(&Value::Object(data)))
            .await?;
        Ok(())
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.inner.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conn() -> Arc<Connector> {
        Arc::new(Connector::new("https://localhost:8443").unwrap())
    }

    #[tokio::test]
    async fn test_attach_endpoint_invalid_endpoint() {
        let node = Node::from_resource(Resource::from_json(
            conn(),
            "/redfish/v1/Nodes/Node1",
            None,
            json!({
                "Id": "Node1",
                "Actions": {
                    "#ComposedNode.AttachEndpoint": {
                        "target": "/redfish/v1/Nodes/Node1/Actions/ComposedNode.AttachEndpoint",
                        "Resource@Redfish.AllowableValues": [
                            {"@odata.id": "/redfish/v1/StorageServices/1/Volumes/1"}
                        ]
                    }
                }
            }),
        ));
        let err = node
            .attach_endpoint(Some("/redfish/v1/StorageServices/1/Volumes/2"), Some("NVMe"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_action_info_parameters() {
        let info = AttachResourceActionInfo::new(Resource::from_json(
            conn(),
            "/redfish/v1/Nodes/Node1/Actions/AttachResourceActionInfo",
            None,
            json!({
                "Id": "AttachResourceActionInfo",
                "Name": "Attach Resource ActionInfo",
                "Parameters": [
                    {
                        "Name": "Resource",
                        "Required": true,
                        "DataType": "Object",
                        "ObjectDataType": "#Resource.Resource",
                        "AllowableValues": [
                            {"@odata.id": "/redfish/v1/StorageServices/1/Volumes/1"}
                        ]
                    },
                    {
                        "Name": "Protocol",
                        "Required": false,
                        "DataType": "String",
                        "ObjectDataType": null,
                        "AllowableValues": ["NVMe"]
                    }
                ]
            }),
        ));
        let parameters = info.parameters();
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[0].name.as_deref(), Some("Resource"));
        assert_eq!(parameters[0].required, Some(true));
        assert_eq!(
            parameters[0].allowable_values,
            Some(json!(["/redfish/v1/StorageServices/1/Volumes/1"]))
        );
        assert_eq!(parameters[1].allowable_values, Some(json!(["NVMe"])));
    }
}
