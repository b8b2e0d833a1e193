//! Telemetry service and metric definitions.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::common::Status;
use crate::connector::Connector;
use crate::error::{Error, Result};
use crate::fields;
use crate::resource::{Collection, Resource};

/// One input of a calculated metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationParameter {
    pub source_metric: Option<String>,
    pub result_metric: Option<String>,
}

impl CalculationParameter {
    fn read_list(body: &serde_json::Value) -> Option<Vec<CalculationParameter>> {
        let items = fields::value_at(body, &["CalculationParameters"])?.as_array()?;
        Some(
            items
                .iter()
                .map(|item| CalculationParameter {
                    source_metric: fields::string_at(item, &["SourceMetric"]),
                    result_metric: fields::string_at(item, &["ResultMetric"]),
                })
                .collect(),
        )
    }
}

/// Wildcard substitution for metric report definitions referencing this
/// definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wildcard {
    pub name: Option<String>,
    pub values: Option<Vec<String>>,
}

impl Wildcard {
    fn read_list(body: &serde_json::Value) -> Option<Vec<Wildcard>> {
        let items = fields::value_at(body, &["Wildcards"])?.as_array()?;
        Some(
            items
                .iter()
                .map(|item| Wildcard {
                    name: fields::string_at(item, &["Name"]),
                    values: fields::string_list_at(item, &["Values"]),
                })
                .collect(),
        )
    }
}

/// CPU temperature sensor definition.
#[derive(Debug)]
pub struct CpuTemperature {
    resource: Resource,
}

impl CpuTemperature {
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

    pub fn metric_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["MetricType"])
    }

    pub fn sensor_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["SensorType"])
    }

    pub fn implementation(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Implementation"])
    }

    pub fn sensing_interval(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["SensingInterval"])
    }

    pub fn physical_context(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["PhysicalContext"])
    }

    pub fn units(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Units"])
    }

    pub fn min_reading_range(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["MinReadingRange"])
    }

    pub fn max_reading_range(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["MaxReadingRange"])
    }

    pub fn precision(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["Precision"])
    }

    pub fn calibration(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["Calibration"])
    }

    pub fn is_linear(&self) -> Option<bool> {
        fields::bool_at(self.resource.json(), &["IsLinear"])
    }

    pub fn data_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["DataType"])
    }

    pub fn accuracy(&self) -> Option<f64> {
        fields::float_at(self.resource.json(), &["Accuracy"])
    }

    pub fn time_stamp_accuracy(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["TimeStampAccuracy"])
    }

    pub fn wildcards(&self) -> Option<Vec<Wildcard>> {
        Wildcard::read_list(self.resource.json())
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

/// CPU health sensor definition, reporting discrete states.
#[derive(Debug)]
pub struct CpuHealth {
    resource: Resource,
}

impl CpuHealth {
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

    pub fn metric_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["MetricType"])
    }

    pub fn sensor_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["SensorType"])
    }

    pub fn implementation(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Implementation"])
    }

    pub fn sensing_interval(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["SensingInterval"])
    }

    pub fn physical_context(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["PhysicalContext"])
    }

    /// Allowed discrete health states.
    pub fn discrete_values(&self) -> Option<Vec<String>> {
        fields::string_list_at(self.resource.json(), &["DiscreteValues"])
    }

    pub fn is_linear(&self) -> Option<bool> {
        fields::bool_at(self.resource.json(), &["IsLinear"])
    }

    pub fn data_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["DataType"])
    }

    pub fn time_stamp_accuracy(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["TimeStampAccuracy"])
    }

    pub fn wildcards(&self) -> Option<Vec<Wildcard>> {
        Wildcard::read_list(self.resource.json())
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

/// CPU bandwidth sensor definition, a calculated percentage metric.
#[derive(Debug)]
pub struct CpuBandwidth {
    resource: Resource,
}

impl CpuBandwidth {
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

    pub fn metric_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["MetricType"])
    }

    pub fn implementation(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Implementation"])
    }

    pub fn sensing_interval(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["SensingInterval"])
    }

    pub fn physical_context(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["PhysicalContext"])
    }

    pub fn units(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Units"])
    }

    pub fn min_reading_range(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["MinReadingRange"])
    }

    pub fn max_reading_range(&self) -> Option<i64> {
        fields::int_at(self.resource.json(), &["MaxReadingRange"])
    }

    pub fn calculable(&self) -> Option<bool> {
        fields::bool_at(self.resource.json(), &["Calculable"])
    }

    pub fn calculation_algorithm(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["CalculationAlgorithm"])
    }

    pub fn calculation_time_interval(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["CalculationTimeInterval"])
    }

    pub fn calculation_parameters(&self) -> Option<Vec<CalculationParameter>> {
        CalculationParameter::read_list(self.resource.json())
    }

    pub fn is_linear(&self) -> Option<bool> {
        fields::bool_at(self.resource.json(), &["IsLinear"])
    }

    pub fn data_type(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["DataType"])
    }

    pub fn accuracy(&self) -> Option<f64> {
        fields::float_at(self.resource.json(), &["Accuracy"])
    }

    pub fn time_stamp_accuracy(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["TimeStampAccuracy"])
    }

    pub fn wildcards(&self) -> Option<Vec<Wildcard>> {
        Wildcard::read_list(self.resource.json())
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await
    }
}

/// A metric definition, typed by the trailing segment of its URI.
#[derive(Debug)]
pub enum MetricDefinition {
    CpuTemperature(CpuTemperature),
    CpuHealth(CpuHealth),
    CpuBandwidth(CpuBandwidth),
}

fn definition_suffix(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}

#[derive(Debug)]
pub struct MetricDefinitionsCollection {
    collection: Collection,
}

impl MetricDefinitionsCollection {
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

    /// Construct the metric definition at `path`. The concrete subtype is
    /// picked from the URI's trailing segment; a segment outside the known
    /// table is not supported.
    pub async fn get_member(&self, path: &str) -> Result<MetricDefinition> {
        let conn = Arc::clone(self.collection.connector());
        let version = self.collection.redfish_version().map(|s| s.to_string());
        match definition_suffix(path) {
            "CPUTemperature" => Ok(MetricDefinition::CpuTemperature(
                CpuTemperature::load(conn, path, version).await?,
            )),
            "CPUHealth" => Ok(MetricDefinition::CpuHealth(
                CpuHealth::load(conn, path, version).await?,
            )),
            "CPUBandwidth" => Ok(MetricDefinition::CpuBandwidth(
                CpuBandwidth::load(conn, path, version).await?,
            )),
            other => Err(Error::NotSupported(format!(
                "metric definition {other} is not supported"
            ))),
        }
    }

    pub async fn get_members(&self) -> Result<Vec<MetricDefinition>> {
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

/// The telemetry service of an RSD 2.2 pod manager.
#[derive(Debug)]
pub struct Telemetry {
    resource: Resource,
    metric_definitions: OnceCell<MetricDefinitionsCollection>,
}

impl Telemetry {
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
            metric_definitions: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &str {
        self.resource.path()
    }

    pub fn status(&self) -> Option<Status> {
        Status::read(self.resource.json(), "Status")
    }

    fn metric_definitions_path(&self) -> Result<String> {
        self.resource
            .required_link_at(&["MetricDefinitions"], "MetricDefinitions")
    }

    /// Metric definitions advertised by the service. Loaded once on first
    /// access; reset by [`refresh`](Self::refresh).
    pub async fn metric_definitions(&self) -> Result<&MetricDefinitionsCollection> {
        self.metric_definitions
            .get_or_try_init(|| async {
                MetricDefinitionsCollection::load(
                    Arc::clone(self.resource.connector()),
                    self.metric_definitions_path()?,
                    self.resource.redfish_version().map(|s| s.to_string()),
                )
                .await
            })
            .await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await?;
        self.metric_definitions = OnceCell::new();
        Ok(())
    }
}
