//! Storage services: logical drives, physical drives, remote targets.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;

use crate::common::Status;
use crate::connector::Connector;
use crate::error::Result;
use crate::fields;
use crate::resource::{Collection, Resource};

/// An LVM logical volume exposed by a storage service.
#[derive(Debug)]
pub struct LogicalDrive {
    resource: Resource,
}

impl LogicalDrive {
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

    pub fn drive_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Type"])
    }

    /// Drive mode; for `Type == "LVM"` the only supported mode is `LV`.
    pub fn mode(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Mode"])
    }

    pub fn protected(&self) -> Option<bool> {
        fields::bool_at(self.resource.json(), &["Protected"])
    }

    pub fn capacity_gib(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["CapacityGiB"])
    }

    /// Name identifying the content of the image copied to this volume.
    pub fn image(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Image"])
    }

    pub fn bootable(&self) -> Option<bool> {
        fields::bool_at(self.resource.json(), &["Bootable"])
    }

    pub fn snapshot(&self) -> Option<bool> {
        fields::bool_at(self.resource.json(), &["Snapshot"])
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

#[derive(Debug)]
pub struct LogicalDriveCollection {
    collection: Collection,
}

impl LogicalDriveCollection {
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

    pub async fn get_member(&self, path: &str) -> Result<LogicalDrive> {
        LogicalDrive::load(
            Arc::clone(self.collection.connector()),
            path,
            self.collection.redfish_version().map(|s| s.to_string()),
        )
        .await
    }

    pub async fn get_members(&self) -> Result<Vec<LogicalDrive>> {
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

/// A physical disk behind a storage service.
#[derive(Debug)]
pub struct PhysicalDrive {
    resource: Resource,
}

impl PhysicalDrive {
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

    pub fn interface(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Interface"])
    }

    pub fn capacity_gib(&self) -> Option<f64> {
        fields::float_at(self.resource.json(), &["CapacityGiB"])
    }

    pub fn drive_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Type"])
    }

    pub fn rpm(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["RPM"])
    }

    // The controller really does spell the key without the trailing 'r'.
    pub fn manufacturer(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Manufacture"])
    }

    pub fn model(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Model"])
    }

    pub fn serial_number(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["SerialNumber"])
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

#[derive(Debug)]
pub struct PhysicalDriveCollection {
    collection: Collection,
}

impl PhysicalDriveCollection {
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

    pub async fn get_member(&self, path: &str) -> Result<PhysicalDrive> {
        PhysicalDrive::load(
            Arc::clone(self.collection.connector()),
            path,
            self.collection.redfish_version().map(|s| s.to_string()),
        )
        .await
    }

    pub async fn get_members(&self) -> Result<Vec<PhysicalDrive>> {
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

/// An iSCSI remote target exposed by a storage service.
#[derive(Debug)]
pub struct RemoteTarget {
    resource: Resource,
}

impl RemoteTarget {
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

    pub fn target_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Type"])
    }

    /// Raw iSCSI address blocks, shape varies with the target type.
    pub fn addresses(&self) -> Option<&Value> {
        fields::value_at(self.resource.json(), &["Addresses"])
    }

    pub fn initiator(&self) -> Option<&Value> {
        fields::value_at(self.resource.json(), &["Initiator"])
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

#[derive(Debug)]
pub struct RemoteTargetCollection {
    collection: Collection,
}

impl RemoteTargetCollection {
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

    pub async fn get_member(&self, path: &str) -> Result<RemoteTarget> {
        RemoteTarget::load(
            Arc::clone(self.collection.connector()),
            path,
            self.collection.redfish_version().map(|s| s.to_string()),
        )
        .await
    }

    pub async fn get_members(&self) -> Result<Vec<RemoteTarget>> {
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

/// A storage service aggregating drives and remote targets.
#[derive(Debug)]
pub struct StorageService {
    resource: Resource,
    logical_drives: OnceCell<LogicalDriveCollection>,
    physical_drives: OnceCell<PhysicalDriveCollection>,
    remote_targets: OnceCell<RemoteTargetCollection>,
}

impl StorageService {
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
            logical_drives: OnceCell::new(),
            physical_drives: OnceCell::new(),
            remote_targets: OnceCell::new(),
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

    pub fn status(&self) -> Option<Status> {
        Status::read(self.resource.json(), "Status")
    }

    fn logical_drive_collection_path(&self) -> Result<String> {
        self.resource
            .required_link_at(&["LogicalDrives"], "LogicalDrives")
    }

    // The physical drive collection hangs off the 'Drives' key.
    fn physical_drive_collection_path(&self) -> Result<String> {
        self.resource
            .required_link_at(&["Drives"], "PhysicalDrives")
    }

    fn remote_target_collection_path(&self) -> Result<String> {
        self.resource
            .required_link_at(&["RemoteTargets"], "RemoteTargets")
    }

    /// Logical drives of this service. Loaded once on first access; reset
    /// by [`refresh`](Self::refresh).
    pub async fn logical_drives(&self) -> Result<&LogicalDriveCollection> {
        self.logical_drives
            .get_or_try_init(|| async {
                LogicalDriveCollection::load(
                    Arc::clone(self.resource.connector()),
                    self.logical_drive_collection_path()?,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn physical_drives(&self) -> Result<&PhysicalDriveCollection> {
        self.physical_drives
            .get_or_try_init(|| async {
                PhysicalDriveCollection::load(
                    Arc::clone(self.resource.connector()),
                    self.physical_drive_collection_path()?,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn remote_targets(&self) -> Result<&RemoteTargetCollection> {
        self.remote_targets
            .get_or_try_init(|| async {
                RemoteTargetCollection::load(
                    Arc::clone(self.resource.connector()),
                    self.remote_target_collection_path()?,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await?;
        self.logical_drives = OnceCell::new();
        self.physical_drives = OnceCell::new();
        self.remote_targets = OnceCell::new();
        Ok(())
    }
}

#[derive(Debug)]
pub struct StorageServiceCollection {
    collection: Collection,
}

impl StorageServiceCollection {
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

    pub async fn get_member(&self, path: &str) -> Result<StorageService> {
        StorageService::load(
            Arc::clone(self.collection.connector()),
            path,
            self.collection.redfish_version().map(|s| s.to_string()),
        )
        .await
    }

    pub async fn get_members(&self) -> Result<Vec<StorageService>> {
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
    use crate::error::Error;
    use serde_json::json;

    fn conn() -> Arc<Connector> {
        Arc::new(Connector::new("https://localhost:8443").unwrap())
    }

    fn service() -> StorageService {
        StorageService::new(Resource::from_json(
            conn(),
            "/redfish/v1/Services/RSS1",
            None,
            json!({
                "Id": "RSS1",
                "Name": "Storage Service",
                "LogicalDrives": {"@odata.id": "/redfish/v1/Services/RSS1/LogicalDrives"},
                "Drives": {"@odata.id": "/redfish/v1/Services/RSS1/Drives"},
                "RemoteTargets": {"@odata.id": "/redfish/v1/Services/RSS1/Targets"},
                "Status": {"State": "Enabled", "Health": "OK"}
            }),
        ))
    }

    #[test]
    fn test_collection_paths() {
        let service = service();
        assert_eq!(
            service.logical_drive_collection_path().unwrap(),
            "/redfish/v1/Services/RSS1/LogicalDrives"
        );
        assert_eq!(
            service.physical_drive_collection_path().unwrap(),
            "/redfish/v1/Services/RSS1/Drives"
        );
        assert_eq!(
            service.remote_target_collection_path().unwrap(),
            "/redfish/v1/Services/RSS1/Targets"
        );
    }

    #[test]
    fn test_missing_physical_drives_names_logical_attribute() {
        let service = StorageService::new(Resource::from_json(
            conn(),
            "/redfish/v1/Services/RSS1",
            None,
            json!({"Id": "RSS1"}),
        ));
        let err = service.physical_drive_collection_path().unwrap_err();
        match err {
            Error::MissingAttribute { attribute, .. } => {
                assert_eq!(attribute, "PhysicalDrives");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_logical_drive_attributes() {
        let drive = LogicalDrive::new(Resource::from_json(
            conn(),
            "/redfish/v1/Services/RSS1/LogicalDrives/1",
            None,
            json!({
                "Id": "1",
                "Type": "LVM",
                "Mode": "LV",
                "Protected": false,
                "CapacityGiB": 8096,
                "Image": "Ubuntu 16.04",
                "Bootable": true,
                "Snapshot": false
            }),
        ));
        assert_eq!(drive.identity().unwrap(), "1");
        assert_eq!(drive.drive_type().as_deref(), Some("LVM"));
        assert_eq!(drive.capacity_gib(), Some(8096));
        assert_eq!(drive.bootable(), Some(true));
        assert_eq!(drive.snapshot(), Some(false));
    }

    #[test]
    fn test_physical_drive_attributes() {
        let drive = PhysicalDrive::new(Resource::from_json(
            conn(),
            "/redfish/v1/Services/RSS1/Drives/1",
            None,
            json!({
                "Id": "1",
                "Interface": "SATA",
                "CapacityGiB": 111.25,
                "Type": "SSD",
                "RPM": 0,
                "Manufacture": "Intel",
                "Model": "INTEL SSDMCEAC120B3",
                "SerialNumber": "CVLI310601PY120E"
            }),
        ));
        assert_eq!(drive.interface().as_deref(), Some("SATA"));
        assert_eq!(drive.capacity_gib(), Some(111.25));
        assert_eq!(drive.manufacturer().as_deref(), Some("Intel"));
    }
}
