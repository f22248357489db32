use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Schema ids stamped on JSON output.
pub const REPLAY_SCHEMA: &str = "https://schemas.3leaps.dev/shardwire/cli/v1/replay-summary.schema.json";
pub const LAYOUT_SCHEMA: &str = "https://schemas.3leaps.dev/shardwire/cli/v1/layout.schema.json";
pub const TABLE_SCHEMA: &str = "https://schemas.3leaps.dev/shardwire/cli/v1/packet-table.schema.json";

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn hex_u8(value: u8) -> String {
    format!("0x{value:02X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_hex_is_padded() {
        assert_eq!(hex_u8(0x0B), "0x0B");
        assert_eq!(hex_u8(0xDD), "0xDD");
    }
}
