//! Memory modules of a computer system.

use std::sync::Arc;

use crate::common::Status;
use crate::connector::Connector;
use crate::error::Result;
use crate::fields;
use crate::resource::{Collection, Resource};

/// Physical location of a memory module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryLocation {
    pub socket: Option<i64>,
    pub memory_controller: Option<i64>,
    pub channel: Option<i64>,
    pub slot: Option<i64>,
}

/// A memory module resource.
#[derive(Debug)]
pub struct Memory {
    resource: Resource,
}

impl Memory {
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

    pub(crate) fn resource(&self) -> &Resource {
        &self.resource
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

    pub fn memory_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["MemoryType"])
    }

    pub fn memory_device_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["MemoryDeviceType"])
    }

    pub fn base_module_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["BaseModuleType"])
    }

    pub fn memory_media(&self) -> Option<Vec<String>> {
        fields::string_list_at(self.resource.json(), &["MemoryMedia"])
    }

    pub fn capacity_mib(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["CapacityMiB"])
    }

    pub fn data_width_bits(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["DataWidthBits"])
    }

    pub fn bus_width_bits(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["BusWidthBits"])
    }

    pub fn manufacturer(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Manufacturer"])
    }

    pub fn serial_number(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["SerialNumber"])
    }

    pub fn part_number(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["PartNumber"])
    }

    pub fn allowed_speeds_mhz(&self) -> Option<Vec<i64>> {
        let items = fields::value_at(self.resource.json(), &["AllowedSpeedsMHz"])?.as_array()?;
        Some(items.iter().filter_map(|v| v.as_i64()).collect())
    }

    pub fn firmware_revision(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["FirmwareRevision"])
    }

    pub fn firmware_api_version(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["FirmwareApiVersion"])
    }

    pub fn function_classes(&self) -> Option<Vec<String>> {
        fields::string_list_at(self.resource.json(), &["FunctionClasses"])
    }

    pub fn vendor_id(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["VendorID"])
    }

    pub fn device_id(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["DeviceID"])
    }

    pub fn rank_count(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["RankCount"])
    }

    pub fn device_locator(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["DeviceLocator"])
    }

    pub fn error_correction(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["ErrorCorrection"])
    }

    pub fn operating_speed_mhz(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["OperatingSpeedMhz"])
    }

    pub fn operating_memory_modes(&self) -> Option<Vec<String>> {
        fields::string_list_at(self.resource.json(), &["OperatingMemoryModes"])
    }

    pub fn memory_location(&self) -> Option<MemoryLocation> {
        let body = fields::value_at(self.resource.json(), &["MemoryLocation"])?;
        Some(MemoryLocation {
            socket: fields::int_at(body, &["Socket"]),
            memory_controller: fields::int_at(body, &["MemoryController"]),
            channel: fields::int_at(body, &["Channel"]),
            slot: fields::int_at(body, &["Slot"]),
        })
    }

    pub fn status(&self) -> Option<Status> {
        Status::read(self.resource.json(), "Status")
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

#[derive(Debug)]
pub struct MemoryCollection {
    collection: Collection,
}

impl MemoryCollection {
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

    pub async fn get_member(&self, path: &str) -> Result<Memory> {
        Memory::load(
            Arc::clone(self.collection.connector()),
            path,
            self.collection.redfish_version().map(|s| s.to_string()),
        )
        .await
    }

    pub async fn get_members(&self) -> Result<Vec<Memory>> {
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

    fn memory() -> Memory {
        Memory::new(Resource::from_json(
            Arc::new(Connector::new("https://localhost:8443").unwrap()),
            "/redfish/v1/Systems/System1/Memory/Dimm1",
            None,
            json!({
                "Id": "Dimm1",
                "Name": "DIMM",
                "MemoryType": "DRAM",
                "MemoryDeviceType": "DDR4",
                "CapacityMiB": 16384,
                "DataWidthBits": 64,
                "BusWidthBits": 72,
                "Manufacturer": "Contoso",
                "AllowedSpeedsMHz": [2133, 2400],
                "OperatingSpeedMhz": 2400,
                "OperatingMemoryModes": ["Volatile"],
                "MemoryLocation": {
                    "Socket": 1,
                    "MemoryController": 2,
                    "Channel": 1,
                    "Slot": 3
                },
                "Status": {"State": "Enabled", "Health": "OK"}
            }),
        ))
    }

    #[test]
    fn test_parse_attributes() {
        let memory = memory();
        assert_eq!(memory.identity().unwrap(), "Dimm1");
        assert_eq!(memory.memory_device_type().as_deref(), Some("DDR4"));
        assert_eq!(memory.capacity_mib(), Some(16384));
        assert_eq!(memory.allowed_speeds_mhz(), Some(vec![2133, 2400]));
        let location = memory.memory_location().unwrap();
        assert_eq!(location.socket, Some(1));
        assert_eq!(location.slot, Some(3));
    }

    #[test]
    fn test_absent_location_collapses() {
        let memory = Memory::new(Resource::from_json(
            Arc::new(Connector::new("https://localhost:8443").unwrap()),
            "/redfish/v1/Systems/System1/Memory/Dimm1",
            None,
            json!({"Id": "Dimm1"}),
        ));
        assert_eq!(memory.memory_location(), None);
    }
}
