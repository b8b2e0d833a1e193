//! Swordfish-style storage services of RSD 2.3.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;

use crate::common::{Identifier, Status};
use crate::connector::Connector;
use crate::error::{Error, Result};
use crate::fields;
use crate::resource::{location_to_path, Collection, Resource};
use crate::schemas;

const INITIALIZE_ACTION: &str = "#Volume.Initialize";

/// How a volume should be wiped on initialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitializeType {
    Fast,
    Slow,
}

impl InitializeType {
    pub fn to_wire(self) -> &'static str {
        match self {
            Self::Fast => "Fast",
            Self::Slow => "Slow",
        }
    }
}

/// One capacity source of a volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacitySource {
    pub providing_pools: Vec<String>,
    pub allocated_bytes: Option<i64>,
}

impl CapacitySource {
    fn read_list(body: &Value) -> Option<Vec<CapacitySource>> {
        let items = fields::value_at(body, &["CapacitySources"])?.as_array()?;
        Some(
            items
                .iter()
                .map(|item| CapacitySource {
                    providing_pools: fields::members_identities_at(item, &["ProvidingPools"])
                        .unwrap_or_default(),
                    allocated_bytes: fields::int_at(
                        item,
                        &["ProvidedCapacity", "Data", "AllocatedBytes"],
                    ),
                })
                .collect(),
        )
    }
}

/// Replica relationship of a volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaInfo {
    pub replica_readonly_access: Option<String>,
    pub replica_type: Option<String>,
    pub replica_role: Option<String>,
    pub replica: Option<String>,
}

/// Links from a volume to its related components, Oem-scoped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeLinks {
    pub endpoints: Vec<String>,
    pub metrics: Option<String>,
}

/// A storage volume.
#[derive(Debug)]
pub struct Volume {
    resource: Resource,
}

impl Volume {
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

    pub fn model(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Model"])
    }

    pub fn manufacturer(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Manufacturer"])
    }

    pub fn access_capabilities(&self) -> Option<Vec<String>> {
        fields::string_list_at(self.resource.json(), &["AccessCapabilities"])
    }

    pub fn capacity_bytes(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["CapacityBytes"])
    }

    pub fn allocated_bytes(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["Capacity", "Data", "AllocatedBytes"])
    }

    pub fn capacity_sources(&self) -> Option<Vec<CapacitySource>> {
        CapacitySource::read_list(self.resource.json())
    }

    pub fn identifiers(&self) -> Option<Vec<Identifier>> {
        Identifier::read_list(self.resource.json(), "Identifiers")
    }

    /// Collapses to `None` when the `Links` block is absent.
    pub fn links(&self) -> Option<VolumeLinks> {
        let body = fields::value_at(self.resource.json(), &["Links"])?;
        Some(VolumeLinks {
            endpoints: fields::members_identities_at(
                body,
                &["Oem", "Intel_RackScale", "Endpoints"],
            )
            .unwrap_or_default(),
            metrics: fields::identity_at(body, &["Oem", "Intel_RackScale", "Metrics"]),
        })
    }

    pub fn replica_infos(&self) -> Option<Vec<ReplicaInfo>> {
        let items = fields::value_at(self.resource.json(), &["ReplicaInfos"])?.as_array()?;
        Some(
            items
                .iter()
                .map(|item| ReplicaInfo {
                    replica_readonly_access: fields::string_at(item, &["ReplicaReadOnlyAccess"]),
                    replica_type: fields::string_at(item, &["ReplicaType"]),
                    replica_role: fields::string_at(item, &["ReplicaRole"]),
                    replica: fields::identity_at(item, &["Replica"]),
                })
                .collect(),
        )
    }

    pub fn status(&self) -> Option<Status> {
        Status::read(self.resource.json(), "Status")
    }

    pub fn bootable(&self) -> Option<bool> {
        fields::bool_at(self.resource.json(), &["Oem", "Intel_RackScale", "Bootable"])
    }

    pub fn erased(&self) -> Option<bool> {
        fields::bool_at(self.resource.json(), &["Oem", "Intel_RackScale", "Erased"])
    }

    pub fn erase_on_detach(&self) -> Option<bool> {
        fields::bool_at(
            self.resource.json(),
            &["Oem", "Intel_RackScale", "EraseOnDetach"],
        )
    }

    /// Update the volume's Oem-scoped properties. At least one of
    /// `bootable` and `erased` must be given.
    pub async fn update(&self, bootable: Option<bool>, erased: Option<bool>) -> Result<()> {
        if bootable.is_none() && erased.is_none() {
            return Err(Error::InvalidParameter {
                parameter: "bootable",
                value: "None".to_string(),
                valid_values: vec!["at least one of bootable and erased".to_string()],
            });
        }

        let mut oem = Map::new();
        if let Some(bootable) = bootable {
            oem.insert("Bootable".to_string(), json!(bootable));
        }
        if let Some(erased) = erased {
            oem.insert("Erased".to_string(), json!(erased));
        }

        self.resource
            .connector()
            .patch(
                self.resource.path(),
                &json!({"Oem": {"Intel_RackScale": oem}}),
            )
            .await
    }

    /// Wipe the volume.
    pub async fn initialize(&self, init_type: InitializeType) -> Result<()> {
        let target_uri = self.resource.action_target(INITIALIZE_ACTION)?;
        self.resource
            .connector()
            .post(
                &target_uri,
                Some(&json!({"InitializeType": init_type.to_wire()})),
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self) -> Result<()> {
        self.resource.connector().delete(self.resource.path()).await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

/// Optional requirements for creating a volume; `capacity_bytes` is the
/// only mandatory piece and is passed separately.
#[derive(Debug, Default, Clone)]
pub struct CreateVolumeRequest {
    pub access_capabilities: Option<Value>,
    pub capacity_sources: Option<Value>,
    pub replica_infos: Option<Value>,
    pub bootable: Option<bool>,
}

#[derive(Debug)]
pub struct VolumeCollection {
    collection: Collection,
}

impl VolumeCollection {
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

    pub async fn get_member(&self, path: &str) -> Result<Volume> {
        Volume::load(
            Arc::clone(self.collection.connector()),
            path,
            self.collection.redfish_version().map(|s| s.to_string()),
        )
        .await
    }

    pub async fn get_members(&self) -> Result<Vec<Volume>> {
        let mut members = Vec::with_capacity(self.collection.members_identities().len());
        for identity in self.collection.members_identities().to_vec() {
            members.push(self.get_member(&identity).await?);
        }
        Ok(members)
    }

    pub(crate) fn create_volume_body(
        capacity_bytes: i64,
        request: &CreateVolumeRequest,
    ) -> Result<Value> {
        let mut body = Map::new();

        schemas::validate(schemas::volume_capacity_request(), &json!(capacity_bytes))?;
        body.insert("CapacityBytes".to_string(), json!(capacity_bytes));

        if let Some(ref access_capabilities) = request.access_capabilities {
            schemas::validate(
                schemas::volume_access_capabilities_request(),
                access_capabilities,
            )?;
            body.insert(
                "AccessCapabilities".to_string(),
                access_capabilities.clone(),
            );
        }
        if let Some(ref capacity_sources) = request.capacity_sources {
            schemas::validate(schemas::volume_capacity_sources_request(), capacity_sources)?;
            body.insert("CapacitySources".to_string(), capacity_sources.clone());
        }
        if let Some(ref replica_infos) = request.replica_infos {
            schemas::validate(schemas::volume_replica_infos_request(), replica_infos)?;
            body.insert("ReplicaInfos".to_string(), replica_infos.clone());
        }
        if let Some(bootable) = request.bootable {
            schemas::validate(schemas::volume_bootable_request(), &json!(bootable))?;
            body.insert(
                "Oem".to_string(),
                json!({"Intel_RackScale": {"Bootable": bootable}}),
            );
        }

        Ok(Value::Object(body))
    }

    /// Create a volume. Returns the location of the new volume, relative to
    /// the service root.
    pub async fn create_volume(
        &self,
        capacity_bytes: i64,
        request: &CreateVolumeRequest,
    ) -> Result<String> {
        let body = Self::create_volume_body(capacity_bytes, request)?;

        let response = self
            .collection
            .connector()
            .post(self.collection.path(), Some(&body))
            .await?;
        let location = response
            .location
            .ok_or_else(|| Error::MissingLocationHeader {
                uri: self.collection.path().to_string(),
            })?;

        tracing::info!("volume created at {}", location);
        Ok(location_to_path(&location, self.collection.path()))
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.collection.refresh().await
    }
}

/// Capacity block of a storage pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capacity {
    pub allocated_bytes: Option<i64>,
    pub consumed_bytes: Option<i64>,
    pub guaranteed_bytes: Option<i64>,
    pub provisioned_bytes: Option<i64>,
}

impl Capacity {
    fn read(body: &Value, key: &str) -> Option<Capacity> {
        let body = fields::value_at(body, &[key])?;
        Some(Capacity {
            allocated_bytes: fields::int_at(body, &["Data", "AllocatedBytes"]),
            consumed_bytes: fields::int_at(body, &["Data", "ConsumedBytes"]),
            guaranteed_bytes: fields::int_at(body, &["Data", "GuaranteedBytes"]),
            provisioned_bytes: fields::int_at(body, &["Data", "ProvisionedBytes"]),
        })
    }
}

/// One capacity source of a storage pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolCapacitySource {
    pub providing_drives: Vec<String>,
    pub provided_capacity: Option<Capacity>,
}

/// A storage pool aggregating drives into allocatable capacity.
#[derive(Debug)]
pub struct StoragePool {
    resource: Resource,
    allocated_volumes: OnceCell<VolumeCollection>,
    allocated_pools: OnceCell<StoragePoolCollection>,
}

impl StoragePool {
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
            allocated_volumes: OnceCell::new(),
            allocated_pools: OnceCell::new(),
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

    pub fn capacity(&self) -> Option<Capacity> {
        Capacity::read(self.resource.json(), "Capacity")
    }

    pub fn capacity_sources(&self) -> Option<Vec<PoolCapacitySource>> {
        let items = fields::value_at(self.resource.json(), &["CapacitySources"])?.as_array()?;
        Some(
            items
                .iter()
                .map(|item| PoolCapacitySource {
                    providing_drives: fields::members_identities_at(item, &["ProvidingDrives"])
                        .unwrap_or_default(),
                    provided_capacity: Capacity::read(item, "ProvidedCapacity"),
                })
                .collect(),
        )
    }

    fn allocated_volumes_path(&self) -> Result<String> {
        self.resource
            .required_link_at(&["AllocatedVolumes"], "AllocatedVolumes")
    }

    fn allocated_pools_path(&self) -> Result<String> {
        self.resource
            .required_link_at(&["AllocatedPools"], "AllocatedPools")
    }

    /// Volumes carved out of this pool. Loaded once on first access; reset
    /// by [`refresh`](Self::refresh).
    pub async fn allocated_volumes(&self) -> Result<&VolumeCollection> {
        self.allocated_volumes
            .get_or_try_init(|| async {
                VolumeCollection::load(
                    Arc::clone(self.resource.connector()),
                    self.allocated_volumes_path()?,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn allocated_pools(&self) -> Result<&StoragePoolCollection> {
        self.allocated_pools
            .get_or_try_init(|| async {
                StoragePoolCollection::load(
                    Arc::clone(self.resource.connector()),
                    self.allocated_pools_path()?,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await?;
        self.allocated_volumes = OnceCell::new();
        self.allocated_pools = OnceCell::new();
        Ok(())
    }
}

#[derive(Debug)]
pub struct StoragePoolCollection {
    collection: Collection,
}

impl StoragePoolCollection {
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

    pub async fn get_member(&self, path: &str) -> Result<StoragePool> {
        StoragePool::load(
            Arc::clone(self.collection.connector()),
            path,
            self.collection.redfish_version().map(|s| s.to_string()),
        )
        .await
    }

    pub async fn get_members(&self) -> Result<Vec<StoragePool>> {
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

/// Oem block of a drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveOem {
    pub erased: Option<bool>,
    pub erase_on_detach: Option<bool>,
    pub firmware_version: Option<String>,
    pub storage: Option<String>,
    pub pcie_function: Option<String>,
}

/// Location entry of a drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveLocation {
    pub info: Option<String>,
    pub info_format: Option<String>,
}

/// Links from a drive to its related components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveLinks {
    pub chassis: Option<String>,
    pub volumes: Vec<String>,
    pub endpoints: Vec<String>,
}

/// A physical drive behind a 2.3 storage service.
#[derive(Debug)]
pub struct Drive {
    resource: Resource,
}

impl Drive {
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

    pub fn protocol(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Protocol"])
    }

    pub fn drive_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Type"])
    }

    pub fn media_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["MediaType"])
    }

    pub fn capacity_bytes(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["CapacityBytes"])
    }

    pub fn manufacturer(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Manufacturer"])
    }

    pub fn model(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Model"])
    }

    pub fn revision(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Revision"])
    }

    pub fn sku(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["SKU"])
    }

    pub fn serial_number(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["SerialNumber"])
    }

    pub fn part_number(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["PartNumber"])
    }

    pub fn asset_tag(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["AssetTag"])
    }

    pub fn rotation_speed_rpm(&self) -> Option<f64> {
        fields::float_at(self.resource.json(), &["RotationSpeedRPM"])
    }

    pub fn status_indicator(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["StatusIndicator"])
    }

    pub fn indicator_led(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["IndicatorLED"])
    }

    pub fn capable_speed_gbs(&self) -> Option<f64> {
        fields::float_at(self.resource.json(), &["CapableSpeedGbs"])
    }

    pub fn negotiated_speed_gbs(&self) -> Option<f64> {
        fields::float_at(self.resource.json(), &["NegotiatedSpeedGbs"])
    }

    pub fn predicted_media_life_left_percent(&self) -> Option<f64> {
        fields::float_at(self.resource.json(), &["PredictedMediaLifeLeftPercent"])
    }

    pub fn identifiers(&self) -> Option<Vec<Identifier>> {
        Identifier::read_list(self.resource.json(), "Identifiers")
    }

    pub fn location(&self) -> Option<Vec<DriveLocation>> {
        let items = fields::value_at(self.resource.json(), &["Location"])?.as_array()?;
        Some(
            items
                .iter()
                .map(|item| DriveLocation {
                    info: fields::string_at(item, &["Info"]),
                    info_format: fields::string_at(item, &["InfoFormat"]),
                })
                .collect(),
        )
    }

    pub fn status(&self) -> Option<Status> {
        Status::read(self.resource.json(), "Status")
    }

    pub fn oem(&self) -> Option<DriveOem> {
        let body = fields::value_at(self.resource.json(), &["Oem"])?;
        Some(DriveOem {
            erased: fields::bool_at(body, &["Intel_RackScale", "DriveErased"]),
            erase_on_detach: fields::bool_at(body, &["Intel_RackScale", "EraseOnDetach"]),
            firmware_version: fields::string_at(body, &["Intel_RackScale", "FirmwareVersion"]),
            storage: fields::string_at(body, &["Intel_RackScale", "Storage"]),
            pcie_function: fields::string_at(body, &["Intel_RackScale", "PCIeFunction"]),
        })
    }

    pub fn links(&self) -> Option<DriveLinks> {
        let body = fields::value_at(self.resource.json(), &["Links"])?;
        Some(DriveLinks {
            chassis: fields::identity_at(body, &["Chassis"]),
            volumes: fields::members_identities_at(body, &["Volumes"]).unwrap_or_default(),
            endpoints: fields::members_identities_at(body, &["Endpoints"]).unwrap_or_default(),
        })
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

#[derive(Debug)]
pub struct DriveCollection {
    collection: Collection,
}

impl DriveCollection {
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

    pub async fn get_member(&self, path: &str) -> Result<Drive> {
        Drive::load(
            Arc::clone(self.collection.connector()),
            path,
            self.collection.redfish_version().map(|s| s.to_string()),
        )
        .await
    }

    pub async fn get_members(&self) -> Result<Vec<Drive>> {
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

/// A storage service aggregating volumes, pools and drives.
#[derive(Debug)]
pub struct StorageService {
    resource: Resource,
    volumes: OnceCell<VolumeCollection>,
    storage_pools: OnceCell<StoragePoolCollection>,
    drives: OnceCell<DriveCollection>,
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
            volumes: OnceCell::new(),
            storage_pools: OnceCell::new(),
            drives: OnceCell::new(),
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

    fn volumes_path(&self) -> Result<String> {
        self.resource.required_link_at(&["Volumes"], "Volumes")
    }

    fn storage_pools_path(&self) -> Result<String> {
        self.resource
            .required_link_at(&["StoragePools"], "StoragePools")
    }

    fn drives_path(&self) -> Result<String> {
        self.resource.required_link_at(&["Drives"], "Drives")
    }

    /// Volumes of this service. Loaded once on first access; reset by
    /// [`refresh`](Self::refresh).
    pub async fn volumes(&self) -> Result<&VolumeCollection> {
        self.volumes
            .get_or_try_init(|| async {
                VolumeCollection::load(
                    Arc::clone(self.resource.connector()),
                    self.volumes_path()?,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn storage_pools(&self) -> Result<&StoragePoolCollection> {
        self.storage_pools
            .get_or_try_init(|| async {
                StoragePoolCollection::load(
                    Arc::clone(self.resource.connector()),
                    self.storage_pools_path()?,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn drives(&self) -> Result<&DriveCollection> {
        self.drives
            .get_or_try_init(|| async {
                DriveCollection::load(
                    Arc::clone(self.resource.connector()),
                    self.drives_path()?,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await?;
        self.volumes = OnceCell::new();
        self.storage_pools = OnceCell::new();
        self.drives = OnceCell::new();
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
    use serde_json::json;

    fn conn() -> Arc<Connector> {
        Arc::new(Connector::new("https://localhost:8443").unwrap())
    }

    fn volume() -> Volume {
        Volume::new(Resource::from_json(
            conn(),
            "/redfish/v1/StorageServices/NVMeoE1/Volumes/1",
            None,
            json!({
                "Id": "1",
                "Name": "NVMe remote storage",
                "CapacityBytes": 3071983104_i64,
                "Capacity": {"Data": {"AllocatedBytes": 3071983104_i64}},
                "AccessCapabilities": ["Read", "Write"],
                "CapacitySources": [{
                    "ProvidingPools": [
                        {"@odata.id": "/redfish/v1/StorageServices/NVMeoE1/StoragePools/2"}
                    ],
                    "ProvidedCapacity": {"Data": {"AllocatedBytes": 3071983104_i64}}
                }],
                "Identifiers": [{
                    "DurableNameFormat": "NQN",
                    "DurableName": "nqn.2014-08.org.nvmexpress:uuid:397f9b78"
                }],
                "ReplicaInfos": [{
                    "ReplicaReadOnlyAccess": "SourceElement",
                    "ReplicaType": "Snapshot",
                    "ReplicaRole": "Target",
                    "Replica": {"@odata.id": "/redfish/v1/StorageServices/NVMeoE1/Volumes/2"}
                }],
                "Links": {
                    "Oem": {
                        "Intel_RackScale": {
                            "Endpoints": [
                                {"@odata.id": "/redfish/v1/Fabrics/NVMeoE/Endpoints/1"}
                            ],
                            "Metrics": {
                                "@odata.id":
                                    "/redfish/v1/StorageServices/NVMeoE1/Volumes/1/Metrics"
                            }
                        }
                    }
                },
                "Status": {"State": "Enabled", "Health": "OK"},
                "Oem": {
                    "Intel_RackScale": {
                        "Bootable": true,
                        "Erased": false,
                        "EraseOnDetach": true
                    }
                },
                "Actions": {
                    "#Volume.Initialize": {
                        "target":
                            "/redfish/v1/StorageServices/NVMeoE1/Volumes/1/Actions/Volume.Initialize"
                    }
                }
            }),
        ))
    }

    #[test]
    fn test_volume_attributes() {
        let volume = volume();
        assert_eq!(volume.identity().unwrap(), "1");
        assert_eq!(volume.capacity_bytes(), Some(3071983104));
        assert_eq!(volume.allocated_bytes(), Some(3071983104));
        assert_eq!(volume.bootable(), Some(true));
        assert_eq!(volume.erased(), Some(false));
        assert_eq!(volume.erase_on_detach(), Some(true));

        let sources = volume.capacity_sources().unwrap();
        assert_eq!(
            sources[0].providing_pools,
            vec!["/redfish/v1/StorageServices/NVMeoE1/StoragePools/2".to_string()]
        );
        assert_eq!(sources[0].allocated_bytes, Some(3071983104));

        let replicas = volume.replica_infos().unwrap();
        assert_eq!(replicas[0].replica_type.as_deref(), Some("Snapshot"));
        assert_eq!(
            replicas[0].replica.as_deref(),
            Some("/redfish/v1/StorageServices/NVMeoE1/Volumes/2")
        );

        let links = volume.links().unwrap();
        assert_eq!(links.endpoints.len(), 1);
        assert!(links.metrics.is_some());
    }

    #[tokio::test]
    async fn test_update_requires_an_argument() {
        let err = volume().update(None, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_create_volume_body_minimal() {
        let body =
            VolumeCollection::create_volume_body(1073741824, &CreateVolumeRequest::default())
                .unwrap();
        assert_eq!(body, json!({"CapacityBytes": 1073741824}));
    }

    #[test]
    fn test_create_volume_body_full() {
        let body = VolumeCollection::create_volume_body(
            1073741824,
            &CreateVolumeRequest {
                access_capabilities: Some(json!(["Read", "Write"])),
                capacity_sources: Some(json!([{
                    "ProvidingPools": [
                        {"@odata.id": "/redfish/v1/StorageServices/NVMeoE1/StoragePools/2"}
                    ]
                }])),
                replica_infos: Some(json!([{
                    "ReplicaType": "Snapshot",
                    "Replica": {"@odata.id": "/redfish/v1/StorageServices/NVMeoE1/Volumes/1"}
                }])),
                bootable: Some(true),
            },
        )
        .unwrap();
        assert_eq!(body["CapacityBytes"], json!(1073741824));
        assert_eq!(body["AccessCapabilities"], json!(["Read", "Write"]));
        assert_eq!(body["Oem"], json!({"Intel_RackScale": {"Bootable": true}}));
    }

    #[test]
    fn test_create_volume_body_invalid_access_capability() {
        let err = VolumeCollection::create_volume_body(
            1073741824,
            &CreateVolumeRequest {
                access_capabilities: Some(json!(["Execute"])),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaValidation { .. }));
    }

    #[test]
    fn test_storage_pool_capacity() {
        let pool = StoragePool::new(Resource::from_json(
            conn(),
            "/redfish/v1/StorageServices/NVMeoE1/StoragePools/1",
            None,
            json!({
                "Id": "1",
                "Name": "BasePool",
                "Capacity": {
                    "Data": {
                        "AllocatedBytes": 12884901888_i64,
                        "ConsumedBytes": 6442450944_i64,
                        "GuaranteedBytes": 6442450944_i64
                    }
                },
                "CapacitySources": [{
                    "ProvidingDrives": [
                        {"@odata.id": "/redfish/v1/StorageServices/NVMeoE1/Drives/Disk.Bay.0"}
                    ],
                    "ProvidedCapacity": {"Data": {"AllocatedBytes": 12884901888_i64}}
                }],
                "AllocatedVolumes": {
                    "@odata.id": "/redfish/v1/StorageServices/NVMeoE1/StoragePools/1/AllocatedVolumes"
                },
                "AllocatedPools": {
                    "@odata.id": "/redfish/v1/StorageServices/NVMeoE1/StoragePools/1/AllocatedPools"
                }
            }),
        ));
        let capacity = pool.capacity().unwrap();
        assert_eq!(capacity.allocated_bytes, Some(12884901888));
        assert_eq!(capacity.provisioned_bytes, None);
        let sources = pool.capacity_sources().unwrap();
        assert_eq!(sources[0].providing_drives.len(), 1);
        assert_eq!(
            sources[0].provided_capacity.as_ref().unwrap().allocated_bytes,
            Some(12884901888)
        );
        assert!(pool.allocated_volumes_path().is_ok());
        assert!(pool.allocated_pools_path().is_ok());
    }

    #[test]
    fn test_drive_oem_and_links() {
        let drive = Drive::new(Resource::from_json(
            conn(),
            "/redfish/v1/StorageServices/NVMeoE1/Drives/Disk.Bay.0",
            None,
            json!({
                "Id": "Disk.Bay.0",
                "Protocol": "NVMe",
                "MediaType": "SSD",
                "CapacityBytes": 899527000000_i64,
                "Oem": {
                    "Intel_RackScale": {
                        "DriveErased": true,
                        "EraseOnDetach": false,
                        "FirmwareVersion": "1.17",
                        "Storage": null
                    }
                },
                "Links": {
                    "Chassis": {"@odata.id": "/redfish/v1/Chassis/1"},
                    "Volumes": [
                        {"@odata.id": "/redfish/v1/StorageServices/NVMeoE1/Volumes/1"}
                    ]
                }
            }),
        ));
        let oem = drive.oem().unwrap();
        assert_eq!(oem.erased, Some(true));
        assert_eq!(oem.firmware_version.as_deref(), Some("1.17"));
        let links = drive.links().unwrap();
        assert_eq!(links.chassis.as_deref(), Some("/redfish/v1/Chassis/1"));
        assert_eq!(links.volumes.len(), 1);
        assert!(links.endpoints.is_empty());
    }

    #[test]
    fn test_storage_service_collection_paths() {
        let service = StorageService::new(Resource::from_json(
            conn(),
            "/redfish/v1/StorageServices/NVMeoE1",
            None,
            json!({
                "Id": "NVMeoE1",
                "Volumes": {"@odata.id": "/redfish/v1/StorageServices/NVMeoE1/Volumes"},
                "StoragePools": {"@odata.id": "/redfish/v1/StorageServices/NVMeoE1/StoragePools"},
                "Drives": {"@odata.id": "/redfish/v1/StorageServices/NVMeoE1/Drives"}
            }),
        ));
        assert!(service.volumes_path().is_ok());
        assert!(service.storage_pools_path().is_ok());
        assert!(service.drives_path().is_ok());
    }
}
