//! Resource interface for RSD API 2.1 and all previous versions.

pub mod fabric;
pub mod memory;
pub mod node;
pub mod storage;
pub mod system;

use std::sync::Arc;

use crate::connector::Connector;
use crate::error::Result;
use crate::resource::Resource;

/// Versioned entry point over a loaded service root document.
#[derive(Debug)]
pub struct ServiceV2_1 {
    root: Resource,
}

impl ServiceV2_1 {
    pub(crate) fn new(root: Resource) -> Self {
        Self { root }
    }

    fn conn(&self) -> Arc<Connector> {
        Arc::clone(self.root.connector())
    }

    fn version(&self) -> Option<String> {
        self.root.redfish_version().map(|s| s.to_string())
    }

    fn systems_path(&self) -> Result<String> {
        self.root.required_link_at(&["Systems"], "Systems")
    }

    fn nodes_path(&self) -> Result<String> {
        self.root.required_link_at(&["Nodes"], "Nodes")
    }

    fn storage_services_path(&self) -> Result<String> {
        self.root.required_link_at(&["Services"], "Services")
    }

    fn fabrics_path(&self) -> Result<String> {
        self.root.required_link_at(&["Fabrics"], "Fabrics")
    }

    pub async fn get_system_collection(&self) -> Result<system::SystemCollection> {
        system::SystemCollection::load(self.conn(), self.systems_path()?, self.version()).await
    }

    pub async fn get_system(&self, identity: &str) -> Result<system::System> {
        system::System::load(self.conn(), identity, self.version()).await
    }

    pub async fn get_node_collection(&self) -> Result<node::NodeCollection> {
        node::NodeCollection::load(self.conn(), self.nodes_path()?, self.version()).await
    }

    pub async fn get_node(&self, identity: &str) -> Result<node::Node> {
        node::Node::load(self.conn(), identity, self.version()).await
    }

    pub async fn get_storage_service_collection(
        &self,
    ) -> Result<storage::StorageServiceCollection> {
        storage::StorageServiceCollection::load(
            self.conn(),
            self.storage_services_path()?,
            self.version(),
        )
        .await
    }

    pub async fn get_storage_service(&self, identity: &str) -> Result<storage::StorageService> {
        storage::StorageService::load(self.conn(), identity, self.version()).await
    }

    pub async fn get_fabric_collection(&self) -> Result<fabric::FabricCollection> {
        fabric::FabricCollection::load(self.conn(), self.fabrics_path()?, self.version()).await
    }

    pub async fn get_fabric(&self, identity: &str) -> Result<fabric::Fabric> {
        fabric::Fabric::load(self.conn(), identity, self.version()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn service() -> ServiceV2_1 {
        ServiceV2_1::new(Resource::from_json(
            Arc::new(Connector::new("https://localhost:8443").unwrap()),
            "/redfish/v1/",
            Some("1.0.2".to_string()),
            json!({
                "RedfishVersion": "1.0.2",
                "Systems": {"@odata.id": "/redfish/v1/Systems"},
                "Nodes": {"@odata.id": "/redfish/v1/Nodes"},
                "Services": {"@odata.id": "/redfish/v1/Services"},
                "Fabrics": {"@odata.id": "/redfish/v1/Fabrics"}
            }),
        ))
    }

    #[test]
    fn test_root_paths() {
        let service = service();
        assert_eq!(service.systems_path().unwrap(), "/redfish/v1/Systems");
        assert_eq!(service.nodes_path().unwrap(), "/redfish/v1/Nodes");
        assert_eq!(
            service.storage_services_path().unwrap(),
            "/redfish/v1/Services"
        );
        assert_eq!(service.fabrics_path().unwrap(), "/redfish/v1/Fabrics");
    }

    #[test]
    fn test_missing_root_link() {
        let service = ServiceV2_1::new(Resource::from_json(
            Arc::new(Connector::new("https://localhost:8443").unwrap()),
            "/redfish/v1/",
            None,
            json!({"RedfishVersion": "1.0.2"}),
        ));
        assert!(matches!(
            service.nodes_path().unwrap_err(),
            Error::MissingAttribute { .. }
        ));
    }
}
