//! Fabrics, zones and endpoints.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;

use crate::common::{Identifier, Status};
use crate::connector::Connector;
use crate::error::Result;
use crate::fields;
use crate::resource::{Collection, Resource};

/// An entity connected to an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedEntity {
    pub entity_type: Option<String>,
    pub entity_role: Option<String>,
    /// Link to the connected resource.
    pub entity_link: Option<String>,
    pub identifiers: Option<Vec<Identifier>>,
}

impl ConnectedEntity {
    pub(crate) fn read_list(body: &Value, key: &str) -> Option<Vec<ConnectedEntity>> {
        let items = fields::value_at(body, &[key])?.as_array()?;
        Some(
            items
                .iter()
                .map(|item| ConnectedEntity {
                    entity_type: fields::string_at(item, &["EntityType"]),
                    entity_role: fields::string_at(item, &["EntityRole"]),
                    entity_link: fields::identity_at(item, &["EntityLink"]),
                    identifiers: Identifier::read_list(item, "Identifiers"),
                })
                .collect(),
        )
    }
}

/// A fabric endpoint.
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

    /// Protocol spoken by the endpoint, e.g. `PCIe` or `NVMeOverFabrics`.
    pub fn protocol(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["EndpointProtocol"])
    }

    pub fn host_reservation_memory_bytes(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["HostReservationMemoryBytes"])
    }

    pub fn connected_entities(&self) -> Option<Vec<ConnectedEntity>> {
        ConnectedEntity::read_list(self.resource.json(), "ConnectedEntities")
    }

    pub fn identifiers(&self) -> Option<Vec<Identifier>> {
        Identifier::read_list(self.resource.json(), "Identifiers")
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

/// A zone groups endpoints that are allowed to talk to each other.
#[derive(Debug)]
pub struct Zone {
    resource: Resource,
}

impl Zone {
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

    /// URIs of the endpoints grouped by this zone. An absent `Links` block
    /// or `Endpoints` array reads as empty.
    pub fn endpoint_identities(&self) -> Vec<String> {
        fields::members_identities_at(self.resource.json(), &["Links", "Endpoints"])
            .unwrap_or_default()
    }

    /// Construct every endpoint in the zone, in link order.
    pub async fn get_endpoints(&self) -> Result<Vec<Endpoint>> {
        let identities = self.endpoint_identities();
        let mut endpoints = Vec::with_capacity(identities.len());
        for identity in identities {
            endpoints.push(
                Endpoint::load(
                    Arc::clone(self.resource.connector()),
                    identity,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await?,
            );
        }
        Ok(endpoints)
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

#[derive(Debug)]
pub struct ZoneCollection {
    collection: Collection,
}

impl ZoneCollection {
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

    pub async fn get_member(&self, path: &str) -> Result<Zone> {
        Zone::load(
            Arc::clone(self.collection.connector()),
            path,
            self.collection.redfish_version().map(|s| s.to_string()),
        )
        .await
    }

    pub async fn get_members(&self) -> Result<Vec<Zone>> {
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

/// A switch fabric, e.g. the PCIe fabric of a rack.
#[derive(Debug)]
pub struct Fabric {
    resource: Resource,
    endpoints: OnceCell<EndpointCollection>,
    zones: OnceCell<ZoneCollection>,
}

impl Fabric {
    pub async fn load(
        conn: Arc<Connector>,
        path: impl Into<String>,
        redfish_version: Option<String>,
    ) -> Result<Self> {
        Ok(Self::new(Resource::load(conn, path, redfish_version).await?))
    }

    pub(crate) fn new(resource: Resource) -> Self {
        Self {
            resource,
            endpoints: OnceCell::new(),
            zones: OnceCell::new(),
        }
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

    pub fn fabric_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["FabricType"])
    }

    pub fn max_zones(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["MaxZones"])
    }

    pub fn status(&self) -> Option<Status> {
        Status::read(self.resource.json(), "Status")
    }

    fn endpoint_collection_path(&self) -> Result<String> {
        self.resource.required_link_at(&["Endpoints"], "Endpoints")
    }

    fn zone_collection_path(&self) -> Result<String> {
        self.resource.required_link_at(&["Zones"], "Zones")
    }

    /// Endpoints of this fabric. Loaded once on first access; reset by
    /// [`refresh`](Self::refresh).
    pub async fn endpoints(&self) -> Result<&EndpointCollection> {
        self.endpoints
            .get_or_try_init(|| async {
                EndpointCollection::load(
                    Arc::clone(self.resource.connector()),
                    self.endpoint_collection_path()?,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    /// Zones of this fabric. Loaded once on first access; reset by
    /// [`refresh`](Self::refresh).
    pub async fn zones(&self) -> Result<&ZoneCollection> {
        self.zones
            .get_or_try_init(|| async {
                ZoneCollection::load(
                    Arc::clone(self.resource.connector()),
                    self.zone_collection_path()?,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await?;
        self.endpoints = OnceCell::new();
        self.zones = OnceCell::new();
        Ok(())
    }
}

#[derive(Debug)]
pub struct FabricCollection {
    collection: Collection,
}

impl FabricCollection {
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

    pub async fn get_member(&self, path: &str) -> Result<Fabric> {
        Fabric::load(
            Arc::clone(self.collection.connector()),
            path,
            self.collection.redfish_version().map(|s| s.to_string()),
        )
        .await
    }

    pub async fn get_members(&self) -> Result<Vec<Fabric>> {
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

    #[test]
    fn test_fabric_attributes() {
        let fabric = Fabric::new(Resource::from_json(
            conn(),
            "/redfish/v1/Fabrics/PCIe",
            None,
            json!({
                "Id": "PCIe",
                "Name": "PCIe Fabric",
                "FabricType": "PCIe",
                "MaxZones": 6,
                "Endpoints": {"@odata.id": "/redfish/v1/Fabrics/PCIe/Endpoints"},
                "Zones": {"@odata.id": "/redfish/v1/Fabrics/PCIe/Zones"},
                "Status": {"State": "Enabled", "Health": "OK"}
            }),
        ));
        assert_eq!(fabric.identity().unwrap(), "PCIe");
        assert_eq!(fabric.fabric_type().as_deref(), Some("PCIe"));
        assert_eq!(fabric.max_zones(), Some(6));
        assert_eq!(
            fabric.endpoint_collection_path().unwrap(),
            "/redfish/v1/Fabrics/PCIe/Endpoints"
        );
        assert_eq!(
            fabric.zone_collection_path().unwrap(),
            "/redfish/v1/Fabrics/PCIe/Zones"
        );
    }

    #[test]
    fn test_zone_endpoint_identities() {
        let zone = Zone::new(Resource::from_json(
            conn(),
            "/redfish/v1/Fabrics/PCIe/Zones/1",
            None,
            json!({
                "Id": "1",
                "Links": {
                    "Endpoints": [
                        {"@odata.id": "/redfish/v1/Fabrics/PCIe/Endpoints/2"},
                        {"@odata.id": "/redfish/v1/Fabrics/PCIe/Endpoints/1"}
                    ]
                }
            }),
        ));
        assert_eq!(
            zone.endpoint_identities(),
            vec![
                "/redfish/v1/Fabrics/PCIe/Endpoints/2".to_string(),
                "/redfish/v1/Fabrics/PCIe/Endpoints/1".to_string()
            ]
        );
    }

    #[test]
    fn test_zone_without_links_is_empty() {
        let zone = Zone::new(Resource::from_json(
            conn(),
            "/redfish/v1/Fabrics/PCIe/Zones/1",
            None,
            json!({"Id": "1"}),
        ));
        assert!(zone.endpoint_identities().is_empty());
    }

    #[test]
    fn test_endpoint_connected_entities() {
        let endpoint = Endpoint::new(Resource::from_json(
            conn(),
            "/redfish/v1/Fabrics/PCIe/Endpoints/1",
            None,
            json!({
                "Id": "1",
                "EndpointProtocol": "PCIe",
                "ConnectedEntities": [{
                    "EntityType": "Drive",
                    "EntityRole": "Target",
                    "EntityLink": {
                        "@odata.id": "/redfish/v1/Chassis/PCIeSwitchChassis/Drives/Disk.Bay.1"
                    },
                    "Identifiers": [{
                        "DurableNameFormat": "UUID",
                        "DurableName": "00000000-0000-0000-0000-000000000000"
                    }]
                }],
                "Identifiers": [{
                    "DurableNameFormat": "UUID",
                    "DurableName": "00000000-0000-0000-0000-000000000001"
                }]
            }),
        ));
        let entities = endpoint.connected_entities().unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].entity_type.as_deref(), Some("Drive"));
        assert_eq!(
            entities[0].entity_link.as_deref(),
            Some("/redfish/v1/Chassis/PCIeSwitchChassis/Drives/Disk.Bay.1")
        );
        assert_eq!(
            entities[0].identifiers.as_ref().unwrap()[0]
                .durable_name_format
                .as_deref(),
            Some("UUID")
        );
        assert!(endpoint.identifiers().is_some());
    }
}
