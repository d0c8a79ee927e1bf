//! Filterable field tables for each bus protocol

use std::net::Ipv4Addr;

use crate::filter::validator::{FieldKind, FieldSpec, TEXT_MAX_LEN};
use crate::models::packet::{Field, Protocol};

/// Known HDL Buspro packet heads
pub const HDL_HEADS: &[&str] = &["HDLMIRACLE", "SMARTCLOUD"];

/// Accepts a dotted-quad IPv4 address and returns its canonical form
pub fn ipv4_membership(input: &str) -> Option<String> {
    input.parse::<Ipv4Addr>().ok().map(|ip| ip.to_string())
}

const fn byte(field: Field, label: &'static str) -> FieldSpec {
    FieldSpec {
        field,
        label,
        kind: FieldKind::Integer {
            radix: 10,
            min: 0,
            max: 0xff,
            width: 0,
        },
    }
}

const DEVICE_TYPE: FieldSpec = FieldSpec {
    field: Field::SourceDeviceType,
    label: "Device Type",
    kind: FieldKind::Integer {
        radix: 10,
        min: 0,
        max: 0xffff,
        width: 0,
    },
};

const OPERATION_CODE: FieldSpec = FieldSpec {
    field: Field::OperationCode,
    label: "Operation Code (hex)",
    kind: FieldKind::Integer {
        radix: 16,
        min: 0,
        max: 0xffff,
        width: 4,
    },
};

static HDL_BUSPRO: [FieldSpec; 8] = [
    FieldSpec {
        field: Field::IpAddress,
        label: "IP Address",
        kind: FieldKind::Text {
            max_len: 15,
            suggestions: &[],
            membership: Some(ipv4_membership),
        },
    },
    FieldSpec {
        field: Field::Head,
        label: "Head",
        kind: FieldKind::Text {
            max_len: TEXT_MAX_LEN,
            suggestions: HDL_HEADS,
            membership: None,
        },
    },
    byte(Field::SourceSubnetId, "Subnet ID"),
    byte(Field::SourceDeviceId, "Device ID"),
    DEVICE_TYPE,
    OPERATION_CODE,
    byte(Field::TargetSubnetId, "Target Subnet ID"),
    byte(Field::TargetDeviceId, "Target Device ID"),
];

static SMART_BUS: [FieldSpec; 6] = [
    byte(Field::SourceSubnetId, "Source Subnet ID"),
    byte(Field::SourceDeviceId, "Source Device ID"),
    DEVICE_TYPE,
    OPERATION_CODE,
    byte(Field::TargetSubnetId, "Destination Subnet ID"),
    byte(Field::TargetDeviceId, "Destination Device ID"),
];

impl Protocol {
    /// Filterable fields of this protocol, in input order
    pub fn schema(self) -> &'static [FieldSpec] {
        match self {
            Protocol::HdlBuspro => &HDL_BUSPRO,
            Protocol::SmartBus => &SMART_BUS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::validator::ValidationError;
    use crate::models::packet::FieldValue;

    #[test]
    fn test_schemas_have_unique_fields() {
        for protocol in [Protocol::HdlBuspro, Protocol::SmartBus] {
            let schema = protocol.schema();
            for (i, spec) in schema.iter().enumerate() {
                assert!(schema[i + 1..].iter().all(|other| other.field != spec.field));
            }
        }
    }

    #[test]
    fn test_ip_address_membership() {
        let spec = &Protocol::HdlBuspro.schema()[0];
        assert_eq!(spec.field, Field::IpAddress);
        assert_eq!(
            spec.validate(" 10.0.0.7 ").unwrap().value,
            Some(FieldValue::Text("10.0.0.7".to_string()))
        );
        assert_eq!(spec.validate("10.0.0.256"), Err(ValidationError::NotAMember));
    }

    #[test]
    fn test_smartbus_is_all_numeric() {
        assert!(Protocol::SmartBus.schema().iter().all(|spec| !spec.kind.is_text()));
    }
}
