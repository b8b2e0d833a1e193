//! Computer systems backing composed nodes.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::common::Status;
use crate::connector::Connector;
use crate::error::Result;
use crate::fields;
use crate::resource::{Collection, Resource};
use crate::v2_1::memory::MemoryCollection;

/// A computer system.
#[derive(Debug)]
pub struct System {
    resource: Resource,
    memory: OnceCell<MemoryCollection>,
}

impl System {
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
            memory: OnceCell::new(),
        }
    }

    pub(crate) fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn path(&self) -> &str {
        self.resource.path()
    }

    pub fn redfish_version(&self) -> Option<&str> {
        self.resource.redfish_version()
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

    pub fn uuid(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["UUID"])
    }

    pub fn hostname(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["HostName"])
    }

    pub fn power_state(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["PowerState"])
    }

    pub fn manufacturer(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Manufacturer"])
    }

    pub fn model(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Model"])
    }

    pub fn serial_number(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["SerialNumber"])
    }

    pub fn status(&self) -> Option<Status> {
        Status::read(self.resource.json(), "Status")
    }

    pub(crate) fn memory_collection_path(&self) -> Result<String> {
        self.resource
            .required_link_at(&["Memory"], "Memory")
    }

    /// Memory modules of this system. Loaded once on first access; reset
    /// by [`refresh`](Self::refresh).
    pub async fn memory(&self) -> Result<&MemoryCollection> {
        self.memory
            .get_or_try_init(|| async {
                MemoryCollection::load(
                    Arc::clone(self.resource.connector()),
                    self.memory_collection_path()?,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await?;
        self.memory = OnceCell::new();
        Ok(())
    }
}

#[derive(Debug)]
pub struct SystemCollection {
    collection: Collection,
}

impl SystemCollection {
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

    pub fn name(&self) -> Option<String> {
        self.collection.name()
    }

    pub fn path(&self) -> &str {
        self.collection.path()
    }

    pub async fn get_member(&self, path: &str) -> Result<System> {
        System::load(
            Arc::clone(self.collection.connector()),
            path,
            self.collection.redfish_version().map(|s| s.to_string()),
        )
        .await
    }

    pub async fn get_members(&self) -> Result<Vec<System>> {
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
