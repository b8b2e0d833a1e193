//! Computer systems with the telemetry extensions of RSD 2.2.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::connector::Connector;
use crate::error::Result;
use crate::fields;
use crate::resource::{Collection, Resource};
use crate::v2_1::system::System as SystemV2_1;

/// Aggregated utilization metrics of a whole system.
#[derive(Debug)]
pub struct SystemMetrics {
    resource: Resource,
}

impl SystemMetrics {
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

    pub fn identity(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Id"])
    }

    pub fn name(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Name"])
    }

    pub fn description(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Description"])
    }

    pub fn processor_bandwidth_percent(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["ProcessorBandwidthPercent"])
    }

    pub fn memory_bandwidth_percent(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["MemoryBandwidthPercent"])
    }

    pub fn memory_throttled_cycles_percent(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["MemoryThrottledCyclesPercent"])
    }

    pub fn processor_power_watt(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["ProcessorPowerWatt"])
    }

    pub fn memory_power_watt(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["MemoryPowerWatt"])
    }

    pub fn io_bandwidth_gbps(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["IOBandwidthGBps"])
    }

    /// Detail health events reported for this system.
    pub fn health(&self) -> Option<Vec<String>> {
        fields::string_list_at(self.resource.json(), &["Health"])
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

/// Utilization metrics of one memory module.
#[derive(Debug)]
pub struct MemoryMetrics {
    resource: Resource,
}

impl MemoryMetrics {
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

    pub fn identity(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Id"])
    }

    pub fn name(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Name"])
    }

    pub fn bandwidth_percent(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["BandwidthPercent"])
    }

    pub fn throttled_cycles_percent(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["ThrottledCyclesPercent"])
    }

    pub fn temperature_celsius(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["TemperatureCelsius"])
    }

    pub fn consumed_power_watt(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["ConsumedPowerWatt"])
    }

    pub fn health(&self) -> Option<Vec<String>> {
        fields::string_list_at(self.resource.json(), &["Health"])
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

/// Utilization metrics of one processor.
#[derive(Debug)]
pub struct ProcessorMetrics {
    resource: Resource,
}

impl ProcessorMetrics {
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

    pub fn identity(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Id"])
    }

    pub fn name(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Name"])
    }

    pub fn average_frequency_mhz(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["AverageFrequencyMHz"])
    }

    pub fn throttling_celsius(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["ThrottlingCelsius"])
    }

    pub fn temperature_celsius(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["TemperatureCelsius"])
    }

    pub fn consumed_power_watt(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["ConsumedPowerWatt"])
    }

    pub fn health(&self) -> Option<Vec<String>> {
        fields::string_list_at(self.resource.json(), &["Health"])
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

/// A memory module with its RSD 2.2 metrics link.
#[derive(Debug)]
pub struct Memory {
    inner: crate::v2_1::memory::Memory,
    metrics: OnceCell<MemoryMetrics>,
}

impl Memory {
    pub async fn load(
        conn: Arc<Connector>,
        path: impl Into<String>,
        redfish_version: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            inner: crate::v2_1::memory::Memory::load(conn, path, redfish_version).await?,
            metrics: OnceCell::new(),
        })
    }

    /// The RSD 2.1 attribute map carries over unchanged.
    pub fn base(&self) -> &crate::v2_1::memory::Memory {
        &self.inner
    }

    pub fn max_tdp_milliwatts(&self) -> Option<Vec<i64>> {
        let items =
            fields::value_at(self.inner.resource().json(), &["MaxTDPMilliWatts"])?.as_array()?;
        Some(items.iter().filter_map(|v| v.as_i64()).collect())
    }

    fn metrics_path(&self) -> Result<String> {
        self.inner
            .resource()
            .required_link_at(&["Metrics"], "Memory Metrics")
    }

    /// Metrics of this memory module. Loaded once on first access; reset
    /// by [`refresh`](Self::refresh).
    pub async fn metrics(&self) -> Result<&MemoryMetrics> {
        self.metrics
            .get_or_try_init(|| async {
                MemoryMetrics::load(
                    Arc::clone(self.inner.resource().connector()),
                    self.metrics_path()?,
                    self.inner
                        .resource()
                        .redfish_version()
                        .map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.inner.refresh().await?;
        self.metrics = OnceCell::new();
        Ok(())
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

/// A computer system with the RSD 2.2 metrics link.
#[derive(Debug)]
pub struct System {
    inner: SystemV2_1,
    metrics: OnceCell<SystemMetrics>,
    memory: OnceCell<MemoryCollection>,
}

impl System {
    pub async fn load(
        conn: Arc<Connector>,
        path: impl Into<String>,
        redfish_version: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            inner: SystemV2_1::load(conn, path, redfish_version).await?,
            metrics: OnceCell::new(),
            memory: OnceCell::new(),
        })
    }

    /// The RSD 2.1 attribute map carries over unchanged.
    pub fn base(&self) -> &SystemV2_1 {
        &self.inner
    }

    fn metrics_path(&self) -> Result<String> {
        self.inner
            .resource()
            .required_link_at(&["Oem", "Intel_RackScale", "Metrics"], "Metrics")
    }

    /// System metrics. Loaded once on first access; reset by
    /// [`refresh`](Self::refresh).
    pub async fn metrics(&self) -> Result<&SystemMetrics> {
        self.metrics
            .get_or_try_init(|| async {
                SystemMetrics::load(
                    Arc::clone(self.inner.resource().connector()),
                    self.metrics_path()?,
                    self.inner
                        .resource()
                        .redfish_version()
                        .map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    /// Memory modules with their 2.2 metrics links.
    pub async fn memory(&self) -> Result<&MemoryCollection> {
        self.memory
            .get_or_try_init(|| async {
                MemoryCollection::load(
                    Arc::clone(self.inner.resource().connector()),
                    self.inner.memory_collection_path()?,
                    self.inner
                        .resource()
                        .redfish_version()
                        .map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.inner.refresh().await?;
        self.metrics = OnceCell::new();
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
