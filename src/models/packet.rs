use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Bus protocol a packet was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// HDL Buspro (UDP gateway, carries an IP address and a head)
    #[value(name = "hdl")]
    HdlBuspro,

    /// SmartBus
    #[value(name = "smartbus")]
    SmartBus,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::HdlBuspro => write!(f, "HDL Buspro"),
            Protocol::SmartBus => write!(f, "SmartBus"),
        }
    }
}

/// A decoded bus packet, as delivered by the bus driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusPacket {
    /// Protocol the packet belongs to
    pub protocol: Protocol,

    /// Address of the sending gateway (HDL Buspro only)
    #[serde(default)]
    pub ip_address: Option<Ipv4Addr>,

    /// Packet head text, e.g. `HDLMIRACLE` (HDL Buspro only)
    #[serde(default)]
    pub head: Option<String>,

    pub source_subnet_id: u8,
    pub source_device_id: u8,
    pub source_device_type: u16,
    pub operation_code: u16,
    pub target_subnet_id: u8,
    pub target_device_id: u8,

    /// Payload bytes
    #[serde(default)]
    pub content: Vec<u8>,
}

/// Filterable packet fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    IpAddress,
    Head,
    SourceSubnetId,
    SourceDeviceId,
    SourceDeviceType,
    OperationCode,
    TargetSubnetId,
    TargetDeviceId,
}

/// A comparable field value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(u32),
    Text(String),
}

impl Field {
    /// Read this field from a packet. `None` when the packet's protocol
    /// does not carry the field.
    pub fn value_of(self, packet: &BusPacket) -> Option<FieldValue> {
        match self {
            Field::IpAddress => packet.ip_address.map(|ip| FieldValue::Text(ip.to_string())),
            Field::Head => packet.head.clone().map(FieldValue::Text),
            Field::SourceSubnetId => Some(FieldValue::Number(packet.source_subnet_id.into())),
            Field::SourceDeviceId => Some(FieldValue::Number(packet.source_device_id.into())),
            Field::SourceDeviceType => Some(FieldValue::Number(packet.source_device_type.into())),
            Field::OperationCode => Some(FieldValue::Number(packet.operation_code.into())),
            Field::TargetSubnetId => Some(FieldValue::Number(packet.target_subnet_id.into())),
            Field::TargetDeviceId => Some(FieldValue::Number(packet.target_device_id.into())),
        }
    }

    /// Wire name of the field
    pub fn name(self) -> &'static str {
        match self {
            Field::IpAddress => "ip_address",
            Field::Head => "head",
            Field::SourceSubnetId => "source_subnet_id",
            Field::SourceDeviceId => "source_device_id",
            Field::SourceDeviceType => "source_device_type",
            Field::OperationCode => "operation_code",
            Field::TargetSubnetId => "target_subnet_id",
            Field::TargetDeviceId => "target_device_id",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One line of packet content: hex pairs and the printable ASCII view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentLine {
    pub hex: String,
    pub ascii: String,
}

/// Bytes shown per content line
pub const CONTENT_LINE_BYTES: usize = 8;

impl BusPacket {
    /// Split the content into display lines of `CONTENT_LINE_BYTES` bytes
    pub fn content_lines(&self) -> Vec<ContentLine> {
        self.content
            .chunks(CONTENT_LINE_BYTES)
            .map(|chunk| ContentLine {
                hex: chunk
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>()
                    .join(" "),
                ascii: chunk
                    .iter()
                    .map(|&b| if (0x20..0x7f).contains(&b) { b as char } else { '.' })
                    .collect(),
            })
            .collect()
    }
}
