//! Resource interface for RSD API 2.2.
//!
//! Node and storage service collections move under `Oem/Intel_RackScale`,
//! and the telemetry service appears.

pub mod system;
pub mod telemetry;

use std::sync::Arc;

use crate::connector::Connector;
use crate::error::Result;
use crate::resource::Resource;
use crate::v2_1::{fabric, node, storage};

#[derive(Debug)]
pub struct ServiceV2_2 {
    root: Resource,
}

impl ServiceV2_2 {
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
        self.root
            .required_link_at(&["Oem", "Intel_RackScale", "Nodes"], "Nodes")
    }

    fn storage_services_path(&self) -> Result<String> {
        self.root
            .required_link_at(&["Oem", "Intel_RackScale", "Services"], "Services")
    }

    fn fabrics_path(&self) -> Result<String> {
        self.root.required_link_at(&["Fabrics"], "Fabrics")
    }

    fn telemetry_service_path(&self) -> Result<String> {
        self.root
            .required_link_at(&["TelemetryService"], "TelemetryService")
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

    pub async fn get_telemetry_service(&self) -> Result<telemetry::Telemetry> {
        telemetry::Telemetry::load(self.conn(), self.telemetry_service_path()?, self.version())
            .await
    }
}
