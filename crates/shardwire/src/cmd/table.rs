use std::path::Path;

use serde::Serialize;
use shardwire_frame::{PacketLength, PacketTable};

use crate::cmd::{load_config, TableArgs};
use crate::exit::{engine_error, CliResult, SUCCESS};
use crate::output::{hex_u8, new_table, print_json, OutputFormat, TABLE_SCHEMA};

#[derive(Debug, Serialize)]
struct Entry {
    opcode: String,
    /// `fixed`, `variable` or `unknown`.
    rule: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<u16>,
}

#[derive(Debug, Serialize)]
struct TableOutput {
    schema_id: &'static str,
    protocol_version: String,
    entries: Vec<Entry>,
}

pub fn run(args: TableArgs, format: OutputFormat, config: Option<&Path>) -> CliResult<i32> {
    let config = load_config(config, args.version.as_deref())?;
    let version = config
        .version()
        .map_err(|err| engine_error("config", err))?;
    let table = PacketTable::for_version(version);

    let output = TableOutput {
        schema_id: TABLE_SCHEMA,
        protocol_version: version.to_string(),
        entries: entries(&table, args.all),
    };
    print_table(&output, format);
    Ok(SUCCESS)
}

fn entries(table: &PacketTable, all: bool) -> Vec<Entry> {
    table
        .iter()
        .filter(|(_, length)| all || *length != PacketLength::Unknown)
        .map(|(opcode, length)| {
            let (rule, length) = match length {
                PacketLength::Fixed(n) => ("fixed", Some(n)),
                PacketLength::Variable => ("variable", None),
                PacketLength::Unknown => ("unknown", None),
            };
            Entry {
                opcode: hex_u8(opcode),
                rule,
                length,
            }
        })
        .collect()
}

fn print_table(output: &TableOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table => {
            let mut table = new_table(vec!["OPCODE", "RULE", "LENGTH"]);
            for entry in &output.entries {
                table.add_row(vec![
                    entry.opcode.clone(),
                    entry.rule.to_string(),
                    entry.length.map(|n| n.to_string()).unwrap_or_default(),
                ]);
            }
            println!("client {}", output.protocol_version);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("client {}", output.protocol_version);
            for entry in &output.entries {
                match entry.length {
                    Some(n) => println!("  {} {} {}", entry.opcode, entry.rule, n),
                    None => println!("  {} {}", entry.opcode, entry.rule),
                }
            }
        }
    }
}
