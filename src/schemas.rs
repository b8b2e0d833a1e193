//! Request-body schemas for create-style actions.
//!
//! Compose and create-volume requests are validated client-side before any
//! HTTP call, so a malformed requirement never reaches the controller.
//! Validators compile once on first use.

use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::{json, Value};

use crate::error::{Error, Result};

fn compile(schema: Value) -> Validator {
    jsonschema::validator_for(&schema).expect("embedded request schema is valid")
}

/// Validate `instance`, joining every violation into one diagnostic string.
pub(crate) fn validate(validator: &Validator, instance: &Value) -> Result<()> {
    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|error| format!("{}: {}", error.instance_path, error))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::SchemaValidation {
            detail: errors.join("; "),
        })
    }
}

fn odata_ref() -> Value {
    json!({
        "type": "object",
        "properties": {
            "@odata.id": {"type": "string"}
        }
    })
}

pub(crate) fn processor_request() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        compile(json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "Model": {"type": "string"},
                    "TotalCores": {"type": "number"},
                    "AchievableSpeedMHz": {"type": "number"},
                    "InstructionSet": {
                        "type": "string",
                        "enum": ["x86", "x86-64", "IA-64", "ARM-A32",
                                 "ARM-A64", "MIPS32", "MIPS64", "OEM"]
                    },
                    "Resource": odata_ref(),
                    "Chassis": odata_ref()
                },
                "additionalProperties": false
            }
        }))
    })
}

pub(crate) fn memory_request() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        compile(json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "CapacityMiB": {"type": "number"},
                    "MemoryDeviceType": {
                        "type": "string",
                        "enum": ["DDR", "DDR2", "DDR3", "DDR4", "DDR4_SDRAM",
                                 "DDR4E_SDRAM", "LPDDR4_SDRAM", "DDR3_SDRAM",
                                 "LPDDR3_SDRAM", "DDR2_SDRAM",
                                 "DDR2_SDRAM_FB_DIMM",
                                 "DDR2_SDRAM_FB_DIMM_PROBE", "DDR_SGRAM",
                                 "DDR_SDRAM", "ROM", "SDRAM", "EDO",
                                 "FastPageMode", "PipelinedNibble"]
                    },
                    "SpeedMHz": {"type": "number"},
                    "Manufacturer": {"type": "string"},
                    "DataWidthBits": {"type": "number"},
                    "Resource": odata_ref(),
                    "Chassis": odata_ref()
                },
                "additionalProperties": false
            }
        }))
    })
}

pub(crate) fn remote_drive_request() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        compile(json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "CapacityGiB": {"type": "number"},
                    "iSCSIAddress": {"type": "string"},
                    "Master": {
                        "type": "object",
                        "properties": {
                            "Type": {
                                "type": "string",
                                "enum": ["Snapshot", "Clone"]
                            },
                            "Address": odata_ref()
                        }
                    }
                },
                "additionalProperties": false
            }
        }))
    })
}

pub(crate) fn local_drive_request() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        compile(json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "CapacityGiB": {"type": "number"},
                    "Type": {
                        "type": "string",
                        "enum": ["HDD", "SSD"]
                    },
                    "MinRPM": {"type": "number"},
                    "SerialNumber": {"type": "string"},
                    "Interface": {
                        "type": "string",
                        "enum": ["SAS", "SATA", "NVMe"]
                    },
                    "Resource": odata_ref(),
                    "Chassis": odata_ref(),
                    "FabricSwitch": {"type": "boolean"}
                },
                "additionalProperties": false
            }
        }))
    })
}

pub(crate) fn ethernet_interface_request() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        compile(json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "SpeedMbps": {"type": "number"},
                    "PrimaryVLAN": {"type": "number"},
                    "VLANs": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "VLANId": {"type": "number"},
                                "Tagged": {"type": "boolean"}
                            }
                        }
                    },
                    "Resource": odata_ref(),
                    "Chassis": odata_ref()
                },
                "additionalProperties": false
            }
        }))
    })
}

pub(crate) fn volume_capacity_request() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| compile(json!({"type": "number"})))
}

pub(crate) fn volume_access_capabilities_request() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        compile(json!({
            "type": "array",
            "items": {
                "type": "string",
                "enum": ["Read", "Write", "WriteOnce", "Append", "Streaming"]
            }
        }))
    })
}

pub(crate) fn volume_capacity_sources_request() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        compile(json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "ProvidingPools": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "@odata.id": {"type": "string"}
                            },
                            "additionalProperties": false
                        }
                    }
                },
                "additionalProperties": false
            }
        }))
    })
}

pub(crate) fn volume_replica_infos_request() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        compile(json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "ReplicaType": {"type": "string"},
                    "Replica": odata_ref()
                },
                "additionalProperties": false
            }
        }))
    })
}

pub(crate) fn volume_bootable_request() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| compile(json!({"type": "boolean"})))
}

pub(crate) fn endpoint_authentication_request() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        compile(json!({
            "type": "object",
            "properties": {
                "Username": {"type": "string"},
                "Password": {"type": "string"}
            },
            "additionalProperties": false
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_request_valid() {
        let req = json!([{"TotalCores": 4, "Model": "Multi-Core Intel(R) Xeon(R)"}]);
        assert!(validate(processor_request(), &req).is_ok());
    }

    #[test]
    fn test_processor_request_rejects_unknown_key() {
        let req = json!([{"Cores": 4}]);
        let err = validate(processor_request(), &req).unwrap_err();
        assert!(matches!(err, Error::SchemaValidation { .. }));
    }

    #[test]
    fn test_local_drive_interface_enum() {
        let req = json!([{"Interface": "USB"}]);
        assert!(validate(local_drive_request(), &req).is_err());
        let req = json!([{"Interface": "NVMe", "Type": "SSD"}]);
        assert!(validate(local_drive_request(), &req).is_ok());
    }

    #[test]
    fn test_volume_capacity_must_be_number() {
        assert!(validate(volume_capacity_request(), &json!("big")).is_err());
        assert!(validate(volume_capacity_request(), &json!(1073741824_i64)).is_ok());
    }

    #[test]
    fn test_capacity_sources_shape() {
        let req = json!([{
            "ProvidingPools": [{"@odata.id": "/redfish/v1/StorageServices/1/StoragePools/2"}]
        }]);
        assert!(validate(volume_capacity_sources_request(), &req).is_ok());

        let req = json!([{"ProvidingPools": [{"Pool": "2"}]}]);
        assert!(validate(volume_capacity_sources_request(), &req).is_err());
    }

    #[test]
    fn test_authentication_rejects_extra_keys() {
        let req = json!({"Username": "admin", "Token": "x"});
        assert!(validate(endpoint_authentication_request(), &req).is_err());
    }
}
