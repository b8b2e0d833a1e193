//! HTTP transport for the RSD management controller.
//!
//! A thin wrapper over `reqwest` that owns the base URL and credentials.
//! Everything above this layer deals in server-relative resource paths
//! (`/redfish/v1/...`) and parsed JSON documents.

use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging.
/// Truncates long responses and strips non-printable characters.
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        // Back off to a char boundary so slicing cannot split a
        // multi-byte character.
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..end],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Response of a create-style POST. Callers mostly care about `Location`.
#[derive(Debug)]
pub struct PostResponse {
    pub status: reqwest::StatusCode,
    pub location: Option<String>,
    pub body: Value,
}

/// Connector to a single management controller.
#[derive(Clone)]
pub struct Connector {
    client: Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Credentials stay out of debug output.
        f.debug_struct("Connector")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Connector {
    /// Create a connector for the controller at `base_url` (scheme and
    /// authority only, e.g. `https://mgmt.vendor.com`).
    pub fn new(base_url: &str) -> Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> Result<ConnectorBuilder> {
        Ok(ConnectorBuilder {
            base_url: Url::parse(base_url)?,
            username: None,
            password: None,
            accept_invalid_certs: false,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, url);
        if let Some(ref user) = self.username {
            req = req.basic_auth(user, self.password.as_deref());
        }
        req
    }

    /// GET a resource and parse its JSON body.
    pub async fn get(&self, path: &str) -> Result<Value> {
        tracing::debug!("GET {}", path);
        let url = self.url(path)?;

        let response = self.request(reqwest::Method::GET, url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(Error::Http {
                uri: path.to_string(),
                status,
                body: sanitize_for_log(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| Error::MalformedJson {
            uri: path.to_string(),
            source,
        })
    }

    /// POST to a resource or action target. `body` of `None` sends no payload.
    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<PostResponse> {
        tracing::debug!("POST {}", path);
        let url = self.url(path)?;

        let mut request = self.request(reqwest::Method::POST, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let response_body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                "API error: {} - {}",
                status,
                sanitize_for_log(&response_body)
            );
            return Err(Error::Http {
                uri: path.to_string(),
                status,
                body: sanitize_for_log(&response_body),
            });
        }

        // Action targets commonly answer 204 with an empty body
        let body = if response_body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response_body).unwrap_or(Value::Null)
        };

        Ok(PostResponse {
            status,
            location,
            body,
        })
    }

    /// PATCH a resource with a JSON body.
    pub async fn patch(&self, path: &str, body: &Value) -> Result<()> {
        tracing::debug!("PATCH {}", path);
        let url = self.url(path)?;

        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let response_body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                "API error: {} - {}",
                status,
                sanitize_for_log(&response_body)
            );
            return Err(Error::Http {
                uri: path.to_string(),
                status,
                body: sanitize_for_log(&response_body),
            });
        }

        Ok(())
    }

    /// DELETE a resource.
    pub async fn delete(&self, path: &str) -> Result<()> {
        tracing::debug!("DELETE {}", path);
        let url = self.url(path)?;

        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(Error::Http {
                uri: path.to_string(),
                status,
                body: sanitize_for_log(&body),
            });
        }

        Ok(())
    }
}

/// Builder for [`Connector`], covering credentials and TLS verification.
pub struct ConnectorBuilder {
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
    accept_invalid_certs: bool,
}

impl ConnectorBuilder {
    pub fn basic_auth(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    /// Skip TLS certificate verification. Only for lab controllers with
    /// self-signed certificates.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn build(self) -> Result<Connector> {
        let client = Client::builder()
            .user_agent(concat!("rsd-client/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()?;

        Ok(Connector {
            client,
            base_url: self.base_url,
            username: self.username,
            password: self.password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let out = sanitize_for_log(&body);
        assert!(out.contains("truncated, 500 bytes total"));
    }

    #[test]
    fn test_sanitize_handles_multibyte_char_at_cutoff() {
        // A two-byte character straddling the truncation point must not
        // panic the slice.
        let mut body = "x".repeat(MAX_LOG_BODY_LENGTH - 1);
        body.push('é');
        body.push_str(&"y".repeat(50));
        let out = sanitize_for_log(&body);
        assert!(out.contains("truncated"));
        assert!(out.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH - 1)));
    }

    #[test]
    fn test_sanitize_strips_control_chars() {
        assert_eq!(sanitize_for_log("ab\ncd\t"), "abcd");
    }

    #[test]
    fn test_debug_output_omits_password() {
        let conn = Connector::builder("https://mgmt.example.com")
            .unwrap()
            .basic_auth("admin", "s3cret")
            .build()
            .unwrap();
        let rendered = format!("{conn:?}");
        assert!(rendered.contains("mgmt.example.com"));
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn test_url_join_keeps_absolute_paths() {
        let conn = Connector::new("https://mgmt.example.com:8443").unwrap();
        let url = conn.url("/redfish/v1/Nodes/Node1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://mgmt.example.com:8443/redfish/v1/Nodes/Node1"
        );
    }
}
