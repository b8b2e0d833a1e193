//! Composed nodes and their collection.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;

use crate::common::Status;
use crate::connector::Connector;
use crate::error::{Error, Result};
use crate::fields;
use crate::resource::{location_to_path, Collection, Resource};
use crate::schemas;
use crate::v2_1::system::System;

const RESET_ACTION: &str = "#ComposedNode.Reset";
const ASSEMBLE_ACTION: &str = "#ComposedNode.Assemble";
const ATTACH_ENDPOINT_ACTION: &str = "#ComposedNode.AttachEndpoint";
const DETACH_ENDPOINT_ACTION: &str = "#ComposedNode.DetachEndpoint";
const COMPOSE_ACTION: &str = "#ComposedNodeCollection.Allocate";

/// Target value for a node reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetType {
    On,
    ForceOn,
    ForceOff,
    ForceRestart,
    GracefulRestart,
    GracefulShutdown,
    Nmi,
    PushPowerButton,
}

impl ResetType {
    pub const ALL: [ResetType; 8] = [
        ResetType::On,
        ResetType::ForceOn,
        ResetType::ForceOff,
        ResetType::ForceRestart,
        ResetType::GracefulRestart,
        ResetType::GracefulShutdown,
        ResetType::Nmi,
        ResetType::PushPowerButton,
    ];

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "On" => Some(Self::On),
            "ForceOn" => Some(Self::ForceOn),
            "ForceOff" => Some(Self::ForceOff),
            "ForceRestart" => Some(Self::ForceRestart),
            "GracefulRestart" => Some(Self::GracefulRestart),
            "GracefulShutdown" => Some(Self::GracefulShutdown),
            "Nmi" => Some(Self::Nmi),
            "PushPowerButton" => Some(Self::PushPowerButton),
            _ => None,
        }
    }

    pub fn to_wire(self) -> &'static str {
        match self {
            Self::On => "On",
            Self::ForceOn => "ForceOn",
            Self::ForceOff => "ForceOff",
            Self::ForceRestart => "ForceRestart",
            Self::GracefulRestart => "GracefulRestart",
            Self::GracefulShutdown => "GracefulShutdown",
            Self::Nmi => "Nmi",
            Self::PushPowerButton => "PushPowerButton",
        }
    }
}

/// Boot source override target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootSourceTarget {
    None,
    Pxe,
    Floppy,
    Cd,
    Usb,
    Hdd,
    BiosSetup,
    Utilities,
    Diags,
    SdCard,
    UefiTarget,
}

impl BootSourceTarget {
    pub const ALL: [BootSourceTarget; 11] = [
        BootSourceTarget::None,
        BootSourceTarget::Pxe,
        BootSourceTarget::Floppy,
        BootSourceTarget::Cd,
        BootSourceTarget::Usb,
        BootSourceTarget::Hdd,
        BootSourceTarget::BiosSetup,
        BootSourceTarget::Utilities,
        BootSourceTarget::Diags,
        BootSourceTarget::SdCard,
        BootSourceTarget::UefiTarget,
    ];

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "None" => Some(Self::None),
            "Pxe" => Some(Self::Pxe),
            "Floppy" => Some(Self::Floppy),
            "Cd" => Some(Self::Cd),
            "Usb" => Some(Self::Usb),
            "Hdd" => Some(Self::Hdd),
            "BiosSetup" => Some(Self::BiosSetup),
            "Utilities" => Some(Self::Utilities),
            "Diags" => Some(Self::Diags),
            "SDCard" => Some(Self::SdCard),
            "UefiTarget" => Some(Self::UefiTarget),
            _ => None,
        }
    }

    pub fn to_wire(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Pxe => "Pxe",
            Self::Floppy => "Floppy",
            Self::Cd => "Cd",
            Self::Usb => "Usb",
            Self::Hdd => "Hdd",
            Self::BiosSetup => "BiosSetup",
            Self::Utilities => "Utilities",
            Self::Diags => "Diags",
            Self::SdCard => "SDCard",
            Self::UefiTarget => "UefiTarget",
        }
    }
}

/// Boot source override frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootSourceEnabled {
    Once,
    Continuous,
    Disabled,
}

impl BootSourceEnabled {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "Once" => Some(Self::Once),
            "Continuous" => Some(Self::Continuous),
            "Disabled" => Some(Self::Disabled),
            _ => None,
        }
    }

    pub fn to_wire(self) -> &'static str {
        match self {
            Self::Once => "Once",
            Self::Continuous => "Continuous",
            Self::Disabled => "Disabled",
        }
    }
}

/// Boot source override mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootSourceMode {
    Uefi,
    Legacy,
}

impl BootSourceMode {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "UEFI" => Some(Self::Uefi),
            "Legacy" => Some(Self::Legacy),
            _ => None,
        }
    }

    pub fn to_wire(self) -> &'static str {
        match self {
            Self::Uefi => "UEFI",
            Self::Legacy => "Legacy",
        }
    }
}

/// Node power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    On,
    Off,
    PoweringOn,
    PoweringOff,
}

impl PowerState {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "On" => Some(Self::On),
            "Off" => Some(Self::Off),
            "PoweringOn" => Some(Self::PoweringOn),
            "PoweringOff" => Some(Self::PoweringOff),
            _ => None,
        }
    }
}

/// Assembly state of a composed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComposedNodeState {
    Allocating,
    Allocated,
    Assembling,
    Assembled,
    Failed,
}

impl ComposedNodeState {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "Allocating" => Some(Self::Allocating),
            "Allocated" => Some(Self::Allocated),
            "Assembling" => Some(Self::Assembling),
            "Assembled" => Some(Self::Assembled),
            "Failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// The node's `Boot` block: current override target, frequency and mode.
#[derive(Debug, Clone)]
pub struct Boot {
    /// Raw `BootSourceOverrideTarget@Redfish.AllowableValues` as advertised.
    pub allowed_values: Option<Vec<String>>,
    pub enabled: Option<BootSourceEnabled>,
    pub mode: Option<BootSourceMode>,
    pub target: Option<BootSourceTarget>,
}

/// Summary info of the node's memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySummary {
    /// Health state of memory along with its dependent resources.
    pub health: Option<String>,
    /// Total installed, operating-system accessible memory in GiB.
    pub size_gib: Option<i64>,
}

/// Summary info of the node's processors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorSummary {
    pub health: Option<String>,
    pub count: Option<i64>,
    pub model: Option<String>,
}

/// A composed node.
#[derive(Debug)]
pub struct Node {
    resource: Resource,
    system: OnceCell<System>,
}

impl Node {
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
            system: OnceCell::new(),
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

    /// The node identity string.
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

    pub fn power_state(&self) -> Option<PowerState> {
        fields::string_at(self.resource.json(), &["PowerState"])
            .and_then(|v| PowerState::from_wire(&v))
    }

    /// Current state of the assembly process for this node.
    pub fn composed_node_state(&self) -> Option<ComposedNodeState> {
        fields::string_at(self.resource.json(), &["ComposedNodeState"])
            .and_then(|v| ComposedNodeState::from_wire(&v))
    }

    pub fn status(&self) -> Option<Status> {
        Status::read(self.resource.json(), "Status")
    }

    /// The `Boot` block is required on nodes.
    pub fn boot(&self) -> Result<Boot> {
        let body = fields::value_at(self.resource.json(), &["Boot"])
            .ok_or_else(|| self.resource.missing_attribute("Boot"))?;
        Ok(Boot {
            allowed_values: fields::string_list_at(
                body,
                &["BootSourceOverrideTarget@Redfish.AllowableValues"],
            ),
            enabled: fields::string_at(body, &["BootSourceOverrideEnabled"])
                .and_then(|v| BootSourceEnabled::from_wire(&v)),
            mode: fields::string_at(body, &["BootSourceOverrideMode"])
                .and_then(|v| BootSourceMode::from_wire(&v)),
            target: fields::string_at(body, &["BootSourceOverrideTarget"])
                .and_then(|v| BootSourceTarget::from_wire(&v)),
        })
    }

    /// Collapses to `None` when the `Memory` block is absent.
    pub fn memory_summary(&self) -> Option<MemorySummary> {
        let body = fields::value_at(self.resource.json(), &["Memory"])?;
        Some(MemorySummary {
            health: fields::string_at(body, &["Status", "Health"]),
            size_gib: fields::int_at(body, &["TotalSystemMemoryGiB"]),
        })
    }

    pub fn processor_summary(&self) -> Option<ProcessorSummary> {
        let body = fields::value_at(self.resource.json(), &["Processors"])?;
        Some(ProcessorSummary {
            health: fields::string_at(body, &["Status", "Health"]),
            count: fields::int_at(body, &["Count"]),
            model: fields::string_at(body, &["Model"]),
        })
    }

    /// Allowed values for resetting the node. Falls back to the full set
    /// when the controller does not advertise any.
    pub fn get_allowed_reset_node_values(&self) -> Result<HashSet<ResetType>> {
        let block = self.resource.action_block(RESET_ACTION)?;
        let advertised =
            fields::string_list_at(block, &["ResetType@Redfish.AllowableValues"])
                .unwrap_or_default();

        if advertised.is_empty() {
            tracing::warn!(
                node = %self.resource.path(),
                "could not figure out the allowed values for the reset node action"
            );
            return Ok(ResetType::ALL.into_iter().collect());
        }

        Ok(advertised
            .iter()
            .filter_map(|v| ResetType::from_wire(v))
            .collect())
    }

    /// Reset the node.
    pub async fn reset_node(&self, value: ResetType) -> Result<()> {
        let valid_resets = self.get_allowed_reset_node_values()?;
        if !valid_resets.contains(&value) {
            return Err(invalid_parameter("value", value.to_wire(), &valid_resets));
        }

        let target_uri = self.resource.action_target(RESET_ACTION)?;
        self.resource
            .connector()
            .post(&target_uri, Some(&json!({"ResetType": value.to_wire()})))
            .await?;
        Ok(())
    }

    /// Assemble the composed node.
    pub async fn assemble_node(&self) -> Result<()> {
        let target_uri = self.resource.action_target(ASSEMBLE_ACTION)?;
        self.resource.connector().post(&target_uri, None).await?;
        Ok(())
    }

    /// Allowed values for changing the boot source. Falls back to the full
    /// set when the controller does not advertise any.
    pub fn get_allowed_node_boot_source_values(&self) -> Result<HashSet<BootSourceTarget>> {
        let advertised = self.boot()?.allowed_values.unwrap_or_default();

        if advertised.is_empty() {
            tracing::warn!(
                node = %self.resource.path(),
                "could not figure out the allowed values for configuring the boot source"
            );
            return Ok(BootSourceTarget::ALL.into_iter().collect());
        }

        Ok(advertised
            .iter()
            .filter_map(|v| BootSourceTarget::from_wire(v))
            .collect())
    }

    /// Set the boot source to use on next reboot of the node.
    pub async fn set_node_boot_source(
        &self,
        target: BootSourceTarget,
        enabled: BootSourceEnabled,
        mode: Option<BootSourceMode>,
    ) -> Result<()> {
        let valid_targets = self.get_allowed_node_boot_source_values()?;
        if !valid_targets.contains(&target) {
            return Err(invalid_parameter(
                "target",
                target.to_wire(),
                &valid_targets,
            ));
        }

        let mut boot = Map::new();
        boot.insert(
            "BootSourceOverrideTarget".to_string(),
            Value::String(target.to_wire().to_string()),
        );
        boot.insert(
            "BootSourceOverrideEnabled".to_string(),
            Value::String(enabled.to_wire().to_string()),
        );
        if let Some(mode) = mode {
            boot.insert(
                "BootSourceOverrideMode".to_string(),
                Value::String(mode.to_wire().to_string()),
            );
        }

        self.resource
            .connector()
            .patch(self.resource.path(), &json!({ "Boot": boot }))
            .await
    }

    fn attach_endpoint_allowed_values(&self) -> Result<(String, Vec<String>)> {
        let block = self.resource.action_block(ATTACH_ENDPOINT_ACTION)?;
        let target_uri = self.resource.action_target(ATTACH_ENDPOINT_ACTION)?;
        let allowed = fields::value_at(block, &["Resource@Redfish.AllowableValues"])
            .map(fields::members_identities)
            .unwrap_or_default();
        Ok((target_uri, allowed))
    }

    /// Attach an endpoint from the available pool to the composed node.
    /// `endpoint` is a link to the endpoint, `capacity_gib` the requested
    /// drive capacity.
    pub async fn attach_endpoint(
        &self,
        endpoint: Option<&str>,
        capacity_gib: Option<i64>,
    ) -> Result<()> {
        let (target_uri, valid_endpoints) = self.attach_endpoint_allowed_values()?;

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
        if let Some(capacity) = capacity_gib {
            data.insert("CapacityGiB".to_string(), json!(capacity));
        }

        self.resource
            .connector()
            .post(&target_uri, Some(&Value::Object(data)))
            .await?;
        Ok(())
    }

    /// Detach an already attached endpoint from the composed node.
    pub async fn detach_endpoint(&self, endpoint: &str) -> Result<()> {
        let block = self.resource.action_block(DETACH_ENDPOINT_ACTION)?;
        let target_uri = self.resource.action_target(DETACH_ENDPOINT_ACTION)?;
        let valid_endpoints = fields::value_at(block, &["Resource@Redfish.AllowableValues"])
            .map(fields::members_identities)
            .unwrap_or_default();

        if !valid_endpoints.iter().any(|v| v == endpoint) {
            return Err(Error::InvalidParameter {
                parameter: "endpoint",
                value: endpoint.to_string(),
                valid_values: valid_endpoints,
            });
        }

        self.resource
            .connector()
            .post(&target_uri, Some(&json!({ "Resource": endpoint })))
            .await?;
        Ok(())
    }

    /// Delete (disassemble) the node. The computer system is shut down
    /// gracefully, non-reserved VLANs are removed from associated switch
    /// ports, and the system and remote target are deallocated.
    pub async fn delete_node(&self) -> Result<()> {
        self.resource.connector().delete(self.resource.path()).await
    }

    fn system_path(&self) -> Result<String> {
        fields::identity_at(self.resource.json(), &["Links", "ComputerSystem"])
            .ok_or_else(|| self.resource.missing_attribute("System"))
    }

    /// The `System` backing this node. Loaded once on first access; reset
    /// by [`refresh`](Self::refresh).
    pub async fn system(&self) -> Result<&System> {
        self.system
            .get_or_try_init(|| async {
                System::load(
                    Arc::clone(self.resource.connector()),
                    self.system_path()?,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await?;
        self.system = OnceCell::new();
        Ok(())
    }
}

fn invalid_parameter<T: Copy + Into<&'static str>>(
    parameter: &'static str,
    value: &str,
    valid: &HashSet<T>,
) -> Error {
    let mut valid_values: Vec<String> = valid.iter().map(|v| (*v).into().to_string()).collect();
    valid_values.sort();
    Error::InvalidParameter {
        parameter,
        value: value.to_string(),
        valid_values,
    }
}

impl From<ResetType> for &'static str {
    fn from(value: ResetType) -> Self {
        value.to_wire()
    }
}

impl From<BootSourceTarget> for &'static str {
    fn from(value: BootSourceTarget) -> Self {
        value.to_wire()
    }
}

/// Optional requirements for composing a node. Only the keys the caller
/// supplies end up in the request body.
#[derive(Debug, Default, Clone)]
pub struct ComposeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub processors: Option<Value>,
    pub memory: Option<Value>,
    pub remote_drives: Option<Value>,
    pub local_drives: Option<Value>,
    pub ethernet_interfaces: Option<Value>,
}

impl ComposeRequest {
    /// Validate the structured requirements and build the wire body.
    pub(crate) fn to_body(&self) -> Result<Value> {
        let mut request = Map::new();

        if let Some(ref name) = self.name {
            request.insert("Name".to_string(), json!(name));
        }
        if let Some(ref description) = self.description {
            request.insert("Description".to_string(), json!(description));
        }
        if let Some(ref processors) = self.processors {
            schemas::validate(schemas::processor_request(), processors)?;
            request.insert("Processors".to_string(), processors.clone());
        }
        if let Some(ref memory) = self.memory {
            schemas::validate(schemas::memory_request(), memory)?;
            request.insert("Memory".to_string(), memory.clone());
        }
        if let Some(ref remote_drives) = self.remote_drives {
            schemas::validate(schemas::remote_drive_request(), remote_drives)?;
            request.insert("RemoteDrives".to_string(), remote_drives.clone());
        }
        if let Some(ref local_drives) = self.local_drives {
            schemas::validate(schemas::local_drive_request(), local_drives)?;
            request.insert("LocalDrives".to_string(), local_drives.clone());
        }
        if let Some(ref ethernet_interfaces) = self.ethernet_interfaces {
            schemas::validate(
                schemas::ethernet_interface_request(),
                ethernet_interfaces,
            )?;
            request.insert(
                "EthernetInterfaces".to_string(),
                ethernet_interfaces.clone(),
            );
        }

        Ok(Value::Object(request))
    }
}

/// The composed node collection, including the allocate/compose action.
#[derive(Debug)]
pub struct NodeCollection {
    collection: Collection,
}

impl NodeCollection {
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

    pub async fn get_member(&self, path: &str) -> Result<Node> {
        Node::load(
            Arc::clone(self.collection.connector()),
            path,
            self.collection.redfish_version().map(|s| s.to_string()),
        )
        .await
    }

    /// Construct every member in order. Fail-fast: the first member that
    /// fails to load aborts the call.
    pub async fn get_members(&self) -> Result<Vec<Node>> {
        let mut members = Vec::with_capacity(self.collection.members_identities().len());
        for identity in self.collection.members_identities().to_vec() {
            members.push(self.get_member(&identity).await?);
        }
        Ok(members)
    }

    fn compose_target(&self) -> Result<String> {
        self.collection.resource().action_target(COMPOSE_ACTION)
    }

    /// Compose a node from RackScale hardware. Returns the location of the
    /// composed node, relative to the service root.
    pub async fn compose_node(&self, request: &ComposeRequest) -> Result<String> {
        let target_uri = self.compose_target()?;
        let body = request.to_body()?;

        let response = self
            .collection
            .connector()
            .post(&target_uri, Some(&body))
            .await?;
        let location = response
            .location
            .ok_or_else(|| Error::MissingLocationHeader {
                uri: target_uri.clone(),
            })?;

        tracing::info!("node created at {}", location);
        Ok(location_to_path(&location, self.collection.path()))
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.collection.refresh().await
    }
}
