//! Table rendering of displayed packets

use serde::Serialize;

use crate::capture::sink::Arrival;
use crate::models::packet::{ContentLine, Protocol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Right,
}

/// A display table column
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Column {
    pub title: &'static str,
    pub width: usize,
    pub align: Align,
}

const fn col(title: &'static str, width: usize, align: Align) -> Column {
    Column { title, width, align }
}

static HDL_COLUMNS: [Column; 11] = [
    col("Timestamp", 12, Align::Left),
    col("IP Address", 15, Align::Left),
    col("Head", 10, Align::Left),
    col("Subnet ID", 4, Align::Right),
    col("Device ID", 4, Align::Right),
    col("Device Type", 6, Align::Right),
    col("Operation Code (hex)", 5, Align::Right),
    col("Target Subnet ID", 4, Align::Right),
    col("Target Device ID", 4, Align::Right),
    col("Content (hex)", 23, Align::Left),
    col("Content (ASCII)", 8, Align::Left),
];

static SMART_BUS_COLUMNS: [Column; 9] = [
    col("Timestamp", 12, Align::Left),
    col("Source Subnet ID", 4, Align::Right),
    col("Source Device ID", 4, Align::Right),
    col("Source Device Type", 6, Align::Right),
    col("Command (hex)", 5, Align::Right),
    col("Destination Subnet ID", 4, Align::Right),
    col("Destination Device ID", 4, Align::Right),
    col("Data (hex)", 23, Align::Left),
    col("Data (ASCII)", 8, Align::Left),
];

pub fn columns(protocol: Protocol) -> &'static [Column] {
    match protocol {
        Protocol::HdlBuspro => &HDL_COLUMNS,
        Protocol::SmartBus => &SMART_BUS_COLUMNS,
    }
}

/// One rendered table line. A packet with long content spans several
/// lines; only the first carries the header cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub seq: u64,
    pub continuation: bool,
    pub cells: Vec<String>,
}

impl DisplayRow {
    /// Cells joined for plain-text export
    pub fn to_text(&self) -> String {
        self.cells.join(" ").trim_end().to_string()
    }
}

fn pad(value: &str, column: &Column) -> String {
    let width = column.width;
    match column.align {
        Align::Left => format!("{:<width$}", value),
        Align::Right => format!("{:>width$}", value),
    }
}

/// Header cells (everything before the content columns)
fn header_cells(arrival: &Arrival) -> Vec<String> {
    let packet = &arrival.packet;
    let mut cells = vec![arrival.timestamp.clone()];
    if packet.protocol == Protocol::HdlBuspro {
        cells.push(packet.ip_address.map(|ip| ip.to_string()).unwrap_or_default());
        cells.push(packet.head.clone().unwrap_or_default());
    }
    cells.extend([
        packet.source_subnet_id.to_string(),
        packet.source_device_id.to_string(),
        packet.source_device_type.to_string(),
        format!("{:04x}", packet.operation_code),
        packet.target_subnet_id.to_string(),
        packet.target_device_id.to_string(),
    ]);
    cells
}

/// Render one arrival as table rows
pub fn render(arrival: &Arrival) -> Vec<DisplayRow> {
    let columns = columns(arrival.packet.protocol);
    let header = header_cells(arrival);
    let (header_columns, content_columns) = columns.split_at(header.len());

    let mut lines = arrival.packet.content_lines();
    if lines.is_empty() {
        lines.push(ContentLine {
            hex: String::new(),
            ascii: String::new(),
        });
    }

    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let mut cells: Vec<String> = if i == 0 {
                header
                    .iter()
                    .zip(header_columns)
                    .map(|(value, column)| pad(value, column))
                    .collect()
            } else {
                header_columns.iter().map(|column| " ".repeat(column.width)).collect()
            };
            cells.push(pad(&line.hex, &content_columns[0]));
            cells.push(pad(&line.ascii, &content_columns[1]));
            DisplayRow {
                seq: arrival.seq,
                continuation: i > 0,
                cells,
            }
        })
        .collect()
}

/// Plain-text export of rows, one line each, newline terminated
pub fn export_text(rows: &[DisplayRow]) -> String {
    let mut text = String::new();
    for row in rows {
        text.push_str(&row.to_text());
        text.push('\n');
    }
    text
}
