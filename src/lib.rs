//! Client library for the Intel RackScale Design (RSD) management REST API.
//!
//! The API is a Redfish/Swordfish-derived hypermedia tree: a service root
//! document links, via `@odata.id` references, to systems, composed nodes,
//! fabrics, storage services and telemetry. [`RsdLib`] loads the root and
//! [`RsdLib::factory`] picks the versioned interface matching the pod
//! manager's advertised RSD API version.
//!
//! ```no_run
//! # async fn run() -> rsd_client::Result<()> {
//! use std::sync::Arc;
//!
//! let conn = Arc::new(
//!     rsd_client::Connector::builder("https://localhost:8443")?
//!         .basic_auth("admin", "admin")
//!         .build()?,
//! );
//! let rsd = rsd_client::RsdLib::connect(conn, "/redfish/v1/").await?;
//! if let rsd_client::RsdService::V2_3(service) = rsd.factory()? {
//!     let nodes = service.get_node_collection().await?;
//!     for uri in nodes.members_identities() {
//!         println!("{uri}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod connector;
pub mod error;
pub mod fields;
pub mod resource;
mod schemas;
pub mod v2_1;
pub mod v2_2;
pub mod v2_3;

use std::sync::Arc;

pub use connector::{Connector, ConnectorBuilder};
pub use error::{Error, Result};

use resource::Resource;

/// The versioned interface picked by [`RsdLib::factory`].
#[derive(Debug)]
pub enum RsdService {
    V2_1(v2_1::ServiceV2_1),
    V2_2(v2_2::ServiceV2_2),
    V2_3(v2_3::ServiceV2_3),
}

/// The service root of an RSD pod manager.
#[derive(Debug)]
pub struct RsdLib {
    root: Resource,
}

impl RsdLib {
    /// Load the service root document at `root_prefix`.
    pub async fn connect(conn: Arc<Connector>, root_prefix: impl Into<String>) -> Result<Self> {
        Ok(Self {
            root: Resource::load(conn, root_prefix, None).await?,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_resource(root: Resource) -> Self {
        Self { root }
    }

    /// The Redfish protocol version the pod manager advertises.
    pub fn redfish_version(&self) -> Result<String> {
        self.root.required_string("RedfishVersion")
    }

    /// The RSD API version the pod manager advertises.
    pub fn rsd_api_version(&self) -> Result<String> {
        self.root.required_string_at(
            &["Oem", "Intel_RackScale", "ApiVersion"],
            "Oem/Intel_RackScale/ApiVersion",
        )
    }

    /// Pick the versioned interface matching the advertised RSD API
    /// version. Interfaces are backward compatible within their series, so
    /// anything below 2.2 is served by the 2.1 interface.
    pub fn factory(&self) -> Result<RsdService> {
        let api_version = self.rsd_api_version()?;
        let parsed = parse_version(&api_version)?;
        let redfish_version = Some(self.redfish_version()?);
        let root = self.root.clone().with_redfish_version(redfish_version);

        if parsed < (2, 2, 0) {
            Ok(RsdService::V2_1(v2_1::ServiceV2_1::new(root)))
        } else if parsed < (2, 3, 0) {
            Ok(RsdService::V2_2(v2_2::ServiceV2_2::new(root)))
        } else if parsed < (2, 4, 0) {
            Ok(RsdService::V2_3(v2_3::ServiceV2_3::new(root)))
        } else {
            Err(Error::NotSupported(format!(
                "RSD API version {api_version} is not supported"
            )))
        }
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.root.refresh().await
    }
}

/// Parse a dotted decimal version, tolerating a missing patch component.
fn parse_version(version: &str) -> Result<(u64, u64, u64)> {
    let mut parts = version.split('.');
    let mut component = |missing_ok| -> Result<u64> {
        match parts.next() {
            Some(part) => part
                .parse()
                .map_err(|_| Error::NotSupported(format!("malformed RSD API version {version}"))),
            None if missing_ok => Ok(0),
            None => Err(Error::NotSupported(format!(
                "malformed RSD API version {version}"
            ))),
        }
    };
    let major = component(false)?;
    let minor = component(false)?;
    let patch = component(true)?;
    Ok((major, minor, patch))
}
