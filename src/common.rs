//! Composite value types shared across resource modules.

use serde_json::Value;

use crate::fields;

/// Redfish status block (`State` / `Health` / `HealthRollup`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub state: Option<String>,
    pub health: Option<String>,
    pub health_rollup: Option<String>,
}

impl Status {
    /// Resolve the composite at `key`; an absent key collapses the whole
    /// composite to `None`.
    pub(crate) fn read(body: &Value, key: &str) -> Option<Status> {
        let body = fields::value_at(body, &[key])?;
        Some(Status {
            state: fields::string_at(body, &["State"]),
            health: fields::string_at(body, &["Health"]),
            health_rollup: fields::string_at(body, &["HealthRollup"]),
        })
    }
}

/// Durable-name identifier entry, used by endpoints, drives and volumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub durable_name: Option<String>,
    pub durable_name_format: Option<String>,
}

impl Identifier {
    /// Resolve the identifier list at `key`. Absent array resolves to
    /// `None`, a present one yields one entry per element in order.
    pub(crate) fn read_list(body: &Value, key: &str) -> Option<Vec<Identifier>> {
        let items = fields::value_at(body, &[key])?.as_array()?;
        Some(
            items
                .iter()
                .map(|item| Identifier {
                    durable_name: fields::string_at(item, &["DurableName"]),
                    durable_name_format: fields::string_at(item, &["DurableNameFormat"]),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_collapses_when_absent() {
        let body = json!({"Id": "1"});
        assert_eq!(Status::read(&body, "Status"), None);
    }

    #[test]
    fn test_status_partial() {
        let body = json!({"Status": {"State": "Enabled"}});
        let status = Status::read(&body, "Status").unwrap();
        assert_eq!(status.state.as_deref(), Some("Enabled"));
        assert_eq!(status.health, None);
    }

    #[test]
    fn test_identifier_list_order() {
        let body = json!({
            "Identifiers": [
                {"DurableNameFormat": "NQN", "DurableName": "nqn.2014-08.org:uuid:1"},
                {"DurableNameFormat": "iQN", "DurableName": "iqn.2001-04.com:uuid:2"}
            ]
        });
        let ids = Identifier::read_list(&body, "Identifiers").unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].durable_name_format.as_deref(), Some("NQN"));
        assert_eq!(
            ids[1].durable_name.as_deref(),
            Some("iqn.2001-04.com:uuid:2")
        );
    }

    #[test]
    fn test_identifier_list_absent_is_none() {
        assert_eq!(Identifier::read_list(&json!({}), "Identifiers"), None);
    }
}
