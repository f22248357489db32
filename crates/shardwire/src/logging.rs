use clap::ValueEnum;
use shardwire_engine::FRAME_TARGET;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

/// Workspace crates that follow `--log-level`. Other targets stay at
/// warnings or quieter.
const CRATE_TARGETS: [&str; 6] = [
    "shardwire",
    "shardwire_engine",
    "shardwire_frame",
    "shardwire_world",
    "shardwire_gump",
    "shardwire_transport",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Per-crate filter. `trace_frames` turns on the engine's per-frame events
/// without raising the rest of the engine.
pub fn log_filter(level: LogLevel, trace_frames: bool) -> Targets {
    let level = level.as_filter();
    let mut filter = Targets::new().with_default(level.min(LevelFilter::WARN));
    for target in CRATE_TARGETS {
        filter = filter.with_target(target, level);
    }
    if trace_frames {
        filter = filter.with_target(FRAME_TARGET, LevelFilter::TRACE);
    }
    filter
}

/// Install the stderr subscriber. Engine diagnostics (resync warnings,
/// decode failures) go here; command output stays on stdout.
pub fn init_logging(format: LogFormat, filter: Targets) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    let _ = match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(layer.json().with_filter(filter))
            .try_init(),
    };
}
