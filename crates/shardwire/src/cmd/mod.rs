use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use shardwire_engine::EngineConfig;
use shardwire_frame::ClientVersion;

use crate::exit::{engine_error, frame_error, CliResult};
use crate::output::OutputFormat;

pub mod gump;
pub mod replay;
pub mod table;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Feed a raw server capture through the engine and summarize the result.
    Replay(ReplayArgs),
    /// Decode an uncompressed layout description and list its widgets.
    Gump(GumpArgs),
    /// Print the packet length table for a client version.
    Table(TableArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, config: Option<&Path>) -> CliResult<i32> {
    match command {
        Command::Replay(args) => replay::run(args, format, config),
        Command::Gump(args) => gump::run(args, format, config),
        Command::Table(args) => table::run(args, format, config),
        Command::Version(args) => version::run(args),
    }
}

/// Engine settings from `--config`, or defaults. A `--version` override is
/// applied on top and validated with the rest.
pub fn load_config(path: Option<&Path>, version: Option<&str>) -> CliResult<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_path(path)
            .map_err(|err| engine_error(&format!("load {}", path.display()), err))?,
        None => EngineConfig::default(),
    };
    if let Some(version) = version {
        let parsed: ClientVersion = version
            .parse()
            .map_err(|err| frame_error("--version", err))?;
        config.protocol_version = parsed.to_string();
    }
    config
        .validate()
        .map_err(|err| engine_error("config", err))?;
    Ok(config)
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Raw server-to-client capture.
    pub capture: PathBuf,
    /// Bytes appended per tick.
    #[arg(long, default_value = "4096", value_parser = clap::value_parser!(u32).range(1..))]
    pub chunk: u32,
    /// Client version, e.g. 7.0.90.0. Overrides the config file.
    #[arg(long)]
    pub version: Option<String>,
    /// Exit with a data error when any frame failed to decode.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct GumpArgs {
    /// Layout command text, e.g. `{ page 0 }{ button 10 10 4005 4007 1 0 1 }`.
    pub layout: PathBuf,
    /// Text lines referenced by index, one per line.
    #[arg(long)]
    pub lines: Option<PathBuf>,
    /// Layout id reported with the result.
    #[arg(long, default_value = "0")]
    pub gump_id: u32,
}

#[derive(Args, Debug)]
pub struct TableArgs {
    /// Client version, e.g. 7.0.90.0. Overrides the config file.
    #[arg(long)]
    pub version: Option<String>,
    /// Include opcodes absent from the table.
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
