use serde::Serialize;
use shardwire_frame::ClientVersion;
use shardwire_gump::{LayoutDecoder, LayoutTree};
use shardwire_world::{RequestQueue, Serial, World};

use crate::cliloc::ClilocResolver;

/// Which stream a frame arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Bytes read from the server connection.
    Network,
    /// Bytes injected locally by a plugin.
    Plugin,
}

/// Connection-level state that is not part of the world graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub last_ping: Option<u8>,
    pub pings: u64,
}

impl Session {
    pub fn record_ping(&mut self, sequence: u8) {
        self.last_ping = Some(sequence);
        self.pings += 1;
    }
}

/// Everything a decoder may read or change while handling one frame.
pub struct Context<'a> {
    pub world: &'a mut World,
    pub requests: &'a mut RequestQueue,
    pub layouts: &'a mut LayoutDecoder,
    pub outbox: &'a mut Vec<LayoutTree>,
    pub session: &'a mut Session,
    pub resolver: &'a dyn ClilocResolver,
    pub(crate) version: ClientVersion,
    pub(crate) tooltips_enabled: bool,
    pub(crate) opcode: u8,
    pub(crate) source: Source,
}

impl Context<'_> {
    pub fn version(&self) -> ClientVersion {
        self.version
    }

    /// Opcode of the frame being decoded. Nested records report the
    /// enclosing frame's opcode.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn tooltips_enabled(&self) -> bool {
        self.tooltips_enabled
    }

    /// Queue a property request for `serial` when tooltips are enabled.
    pub fn request_properties(&mut self, serial: Serial) -> bool {
        self.tooltips_enabled && self.requests.request(serial)
    }
}
