//! Core resource and collection machinery.
//!
//! A [`Resource`] is one addressable remote entity: a URI, an optional
//! Redfish version tag, and exactly one fetched JSON snapshot. Typed
//! resource wrappers resolve their attributes lazily against that snapshot
//! and rebuild it with [`Resource::refresh`].

use std::sync::Arc;

use serde_json::Value;

use crate::connector::Connector;
use crate::error::{Error, Result};
use crate::fields;

/// Key carrying the next collection page, per the OData conventions.
const NEXT_LINK: &str = "Members@odata.nextLink";

#[derive(Debug, Clone)]
pub struct Resource {
    conn: Arc<Connector>,
    path: String,
    redfish_version: Option<String>,
    json: Value,
}

impl Resource {
    /// Fetch the resource at `path` and keep its body as the current
    /// snapshot. The snapshot only changes on [`refresh`](Self::refresh).
    pub async fn load(
        conn: Arc<Connector>,
        path: impl Into<String>,
        redfish_version: Option<String>,
    ) -> Result<Self> {
        let path = path.into();
        let json = conn.get(&path).await?;
        Ok(Self {
            conn,
            path,
            redfish_version,
            json,
        })
    }

    /// Build a resource around an already-parsed body. Unit tests use this
    /// to pin field-resolution behavior without a live controller.
    #[cfg(test)]
    pub(crate) fn from_json(
        conn: Arc<Connector>,
        path: impl Into<String>,
        redfish_version: Option<String>,
        json: Value,
    ) -> Self {
        Self {
            conn,
            path: path.into(),
            redfish_version,
            json,
        }
    }

    /// Re-fetch the JSON snapshot, replacing the cached copy. Typed
    /// wrappers reset their derived-reference caches in the same call.
    pub async fn refresh(&mut self) -> Result<()> {
        self.json = self.conn.get(&self.path).await?;
        Ok(())
    }

    pub fn json(&self) -> &Value {
        &self.json
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn redfish_version(&self) -> Option<&str> {
        self.redfish_version.as_deref()
    }

    pub(crate) fn with_redfish_version(mut self, redfish_version: Option<String>) -> Self {
        self.redfish_version = redfish_version;
        self
    }

    pub(crate) fn connector(&self) -> &Arc<Connector> {
        &self.conn
    }

    /// A string attribute the schema marks as required. The violation
    /// surfaces on read, not at load time.
    pub fn required_string(&self, attribute: &str) -> Result<String> {
        self.required_string_at(&[attribute], attribute)
    }

    pub fn required_string_at(&self, path: &[&str], attribute: &str) -> Result<String> {
        fields::string_at(&self.json, path).ok_or_else(|| Error::MissingAttribute {
            attribute: attribute.to_string(),
            resource: self.path.clone(),
        })
    }

    /// Resolve a link attribute (`{"@odata.id": uri}`), failing with the
    /// link key's name when the controller does not advertise it.
    pub fn required_link_at(&self, path: &[&str], attribute: &str) -> Result<String> {
        fields::identity_at(&self.json, path).ok_or_else(|| Error::MissingAttribute {
            attribute: attribute.to_string(),
            resource: self.path.clone(),
        })
    }

    /// Locate an action sub-block by its well-known key.
    pub fn action_block(&self, action: &str) -> Result<&Value> {
        fields::value_at(&self.json, &["Actions", action]).ok_or_else(|| Error::MissingAction {
            action: action.to_string(),
            resource: self.path.clone(),
        })
    }

    /// Target URI of an advertised action.
    pub fn action_target(&self, action: &str) -> Result<String> {
        let block = self.action_block(action)?;
        fields::string_at(block, &["target"]).ok_or_else(|| Error::MissingAttribute {
            attribute: format!("{action}/target"),
            resource: self.path.clone(),
        })
    }

    pub fn missing_attribute(&self, attribute: &str) -> Error {
        Error::MissingAttribute {
            attribute: attribute.to_string(),
            resource: self.path.clone(),
        }
    }
}

/// A resource whose body is a membership list.
///
/// Member identities are accumulated across `Members@odata.nextLink` pages
/// at load time, preserving server order.
#[derive(Debug, Clone)]
pub struct Collection {
    resource: Resource,
    members: Vec<String>,
}

impl Collection {
    pub async fn load(
        conn: Arc<Connector>,
        path: impl Into<String>,
        redfish_version: Option<String>,
    ) -> Result<Self> {
        let resource = Resource::load(conn, path, redfish_version).await?;
        let members = Self::collect_members(&resource).await?;
        Ok(Self { resource, members })
    }

    #[cfg(test)]
    pub(crate) fn from_json(
        conn: Arc<Connector>,
        path: impl Into<String>,
        redfish_version: Option<String>,
        json: Value,
    ) -> Self {
        let resource = Resource::from_json(conn, path, redfish_version, json);
        let members = fields::value_at(resource.json(), &["Members"])
            .map(fields::members_identities)
            .unwrap_or_default();
        Self { resource, members }
    }

    async fn collect_members(resource: &Resource) -> Result<Vec<String>> {
        let mut members = fields::value_at(resource.json(), &["Members"])
            .map(fields::members_identities)
            .unwrap_or_default();

        let mut next = fields::string_at(resource.json(), &[NEXT_LINK]);
        while let Some(page_path) = next {
            tracing::debug!("following collection page {}", page_path);
            let page = resource.connector().get(&page_path).await?;
            members.extend(
                fields::value_at(&page, &["Members"])
                    .map(fields::members_identities)
                    .unwrap_or_default(),
            );
            next = fields::string_at(&page, &[NEXT_LINK]);
        }

        Ok(members)
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.resource.refresh().await?;
        self.members = Self::collect_members(&self.resource).await?;
        Ok(())
    }

    /// Ordered member URIs, exactly as the controller listed them.
    pub fn members_identities(&self) -> &[String] {
        &self.members
    }

    pub fn name(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Name"])
    }

    pub fn description(&self) -> Option<String> {
        fields::string_at(self.resource.json(), &["Description"])
    }

    pub fn path(&self) -> &str {
        self.resource.path()
    }

    pub fn redfish_version(&self) -> Option<&str> {
        self.resource.redfish_version()
    }

    pub(crate) fn resource(&self) -> &Resource {
        &self.resource
    }

    pub(crate) fn connector(&self) -> &Arc<Connector> {
        self.resource.connector()
    }
}

/// Derive the new resource's identity from a create-style response.
///
/// The header is truncated to the portion starting at the collection's own
/// path, yielding a server-relative URI. A header that does not contain the
/// collection path keeps its path-and-query portion; a relative header is
/// returned verbatim.
pub fn location_to_path(location: &str, collection_path: &str) -> String {
    if let Some(idx) = location.find(collection_path) {
        return location[idx..].to_string();
    }
    match url::Url::parse(location) {
        Ok(url) => url[url::Position::BeforePath..].to_string(),
        Err(_) => location.to_string(),
    }
}
