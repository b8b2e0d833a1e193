//! Fabric endpoints with the RSD 2.3 NVMe-over-Fabrics extensions.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::common::{Identifier, Status};
use crate::connector::Connector;
use crate::error::{Error, Result};
use crate::fields;
use crate::resource::{Collection, Resource};
use crate::schemas;
use crate::v2_1::fabric::ConnectedEntity;

/// Links from an endpoint to its related components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointLinks {
    pub ports: Vec<String>,
    pub endpoints: Vec<String>,
    /// Oem-scoped zone links.
    pub zones: Vec<String>,
    /// Oem-scoped link to the owning ethernet interface.
    pub interface: Option<String>,
}

/// One IP transport of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpTransportDetail {
    pub transport_protocol: Option<String>,
    pub ipv4_address: Option<String>,
    pub ipv6_address: Option<String>,
    pub port: Option<i64>,
}

/// Credentials an endpoint uses to authenticate its peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct Endpoint {
    resource: Resource,
}

impl Endpoint {
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

    pub fn protocol(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["EndpointProtocol"])
    }

    pub fn status(&self) -> Option<Status> {
        Status::read(self.resource.json(), "Status")
    }

    pub fn connected_entities(&self) -> Option<Vec<ConnectedEntity>> {
        ConnectedEntity::read_list(self.resource.json(), "ConnectedEntities")
    }

    pub fn identifiers(&self) -> Option<Vec<Identifier>> {
        Identifier::read_list(self.resource.json(), "Identifiers")
    }

    /// Collapses to `None` when the `Links` block is absent.
    pub fn links(&self) -> Option<EndpointLinks> {
        let body = fields::value_at(self.resource.json(), &["Links"])?;
        Some(EndpointLinks {
            ports: fields::members_identities_at(body, &["Ports"]).unwrap_or_default(),
            endpoints: fields::members_identities_at(body, &["Endpoints"]).unwrap_or_default(),
            zones: fields::members_identities_at(body, &["Oem", "Intel_RackScale", "Zones"])
                .unwrap_or_default(),
            interface: fields::identity_at(body, &["Oem", "Intel_RackScale", "Interface"]),
        })
    }

    pub fn ip_transport_details(&self) -> Option<Vec<IpTransportDetail>> {
        let items = fields::value_at(self.resource.json(), &["IPTransportDetails"])?.as_array()?;
        Some(
            items
                .iter()
                .map(|item| IpTransportDetail {
                    transport_protocol: fields::string_at(item, &["TransportProtocol"]),
                    ipv4_address: fields::string_at(item, &["IPv4Address", "Address"]),
                    ipv6_address: fields::string_at(item, &["IPv6Address", "Address"]),
                    port: fields::int_at(item, &["Port"]),
                })
                .collect(),
        )
    }

    pub fn authentication(&self) -> Option<Authentication> {
        let body = fields::value_at(
            self.resource.json(),
            &["Oem", "Intel_RackScale", "Authentication"],
        )?;
        Some(Authentication {
            username: fields::string_at(body, &["Username"]),
            password: fields::string_at(body, &["Password"]),
        })
    }

    /// Change the credentials the endpoint authenticates with. At least one
    /// of `username` and `password` must be given.
    pub async fn update_authentication(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        if username.is_none() && password.is_none() {
            return Err(Error::InvalidParameter {
                parameter: "username",
                value: "None".to_string(),
                valid_values: vec!["at least one of username and password".to_string()],
            });
        }

        let mut authentication = serde_json::Map::new();
        if let Some(username) = username {
            authentication.insert("Username".to_string(), json!(username));
        }
        if let Some(password) = password {
            authentication.insert("Password".to_string(), json!(password));
        }
        schemas::validate(
            schemas::endpoint_authentication_request(),
            &Value::Object(authentication.clone()),
        )?;

        let data = json!({
            "Oem": {
                "Intel_RackScale": {
                    "@odata.type": "#Intel.Oem.Endpoint",
                    "Authentication": authentication
                }
            }
        });
        self.resource
            .connector()
            .patch(self.resource.path(), &data)
            .await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

#[derive(Debug)]
pub struct EndpointCollection {
    collection: Collection,
}

impl EndpointCollection {
    pub async fn load(
        conn: Arc<Connector>,
        path: impl Into<String>,
        redfish_version: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            collection: Collection::load(conn, path, redfish_version).await?,
        })
    }

    pub fn members_identities(&self) -> &[String] {
        self.collection.members_identities()
    }

    pub fn path(&self) -> &str {
        self.collection.path()
    }

    pub async fn get_member(&self, path: &str) -> Result<Endpoint> {
        Endpoint::load(
            Arc::clone(self.collection.connector()),
            path,
            self.collection.redfish_version().map(|s| s.to_string()),
        )
        .await
    }

    pub async fn get_members(&self) -> Result<Vec<Endpoint>> {
        let mut members = Vec::with_capacity(self.collection.members_identities().len());
        for identity in self.collection.members_identities().to_vec() {
            members.push(self.get_member(&identity).await?);
        }
        Ok(members)
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.collection.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conn() -> Arc<Connector> {
        Arc::new(Connector::new("https://localhost:8443").unwrap())
    }

    fn endpoint() -> Endpoint {
        Endpoint::new(Resource::from_json(
            conn(),
            "/redfish/v1/Fabrics/NVMeoE/Endpoints/1",
            None,
            json!({
                "Id": "1",
                "Name": "Fabric Endpoint",
                "EndpointProtocol": "NVMeOverFabrics",
                "Status": {"State": "Enabled", "Health": "OK"},
                "IPTransportDetails": [{
                    "TransportProtocol": "RoCEv2",
                    "IPv4Address": {"Address": "192.168.0.10"},
                    "IPv6Address": {},
                    "Port": 1023
                }],
                "Links": {
                    "Ports": [{"@odata.id": "/redfish/v1/Fabrics/NVMeoE/Switches/1/Ports/1"}],
                    "Endpoints": [],
                    "Oem": {
                        "Intel_RackScale": {
                            "Zones": [{"@odata.id": "/redfish/v1/Fabrics/NVMeoE/Zones/1"}],
                            "Interface": {
                                "@odata.id": "/redfish/v1/Systems/Target/EthernetInterfaces/1"
                            }
                        }
                    }
                },
                "Oem": {
                    "Intel_RackScale": {
                        "Authentication": {"Username": "admin", "Password": null}
                    }
                }
            }),
        ))
    }

    #[test]
    fn test_links_and_transport() {
        let endpoint = endpoint();
        let links = endpoint.links().unwrap();
        assert_eq!(links.ports.len(), 1);
        assert_eq!(
            links.zones,
            vec!["/redfish/v1/Fabrics/NVMeoE/Zones/1".to_string()]
        );
        assert_eq!(
            links.interface.as_deref(),
            Some("/redfish/v1/Systems/Target/EthernetInterfaces/1")
        );

        let transports = endpoint.ip_transport_details().unwrap();
        assert_eq!(transports[0].transport_protocol.as_deref(), Some("RoCEv2"));
        assert_eq!(transports[0].ipv4_address.as_deref(), Some("192.168.0.10"));
        assert_eq!(transports[0].ipv6_address, None);
        assert_eq!(transports[0].port, Some(1023));
    }

    #[test]
    fn test_authentication_composite() {
        let auth = endpoint().authentication().unwrap();
        assert_eq!(auth.username.as_deref(), Some("admin"));
        assert_eq!(auth.password, None);
    }

    #[tokio::test]
    async fn test_update_authentication_requires_an_argument() {
        let err = endpoint()
            .update_authentication(None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }
}
