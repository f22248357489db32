use serde::Serialize;

use crate::layer::Layer;
use crate::serial::Serial;

/// Container graphic for corpses. Corpses keep their equipment and use the
/// direction byte as a layer.
pub const CORPSE_GRAPHIC: u16 = 0x2006;

/// Hue value meaning "no hue".
const HUE_LIMIT: u16 = 0x0BB8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Placeholder created by a forward reference; upgraded in place once
    /// the real object is announced.
    Unknown,
    Item,
    Mobile,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Unknown => "unknown",
            EntityKind::Item => "item",
            EntityKind::Mobile => "mobile",
        }
    }
}

/// One node in the world graph.
///
/// Container and sibling links hold serials, never references. They are
/// maintained by [`crate::World`] and exposed read-only.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    pub serial: Serial,
    pub kind: EntityKind,
    pub graphic: u16,
    pub hue: u16,
    pub x: u16,
    pub y: u16,
    pub z: i8,
    pub direction: u8,
    pub flags: u8,
    pub notoriety: u8,
    pub amount: u16,
    pub name: String,
    pub hits: u16,
    pub hits_max: u16,
    /// Set by the container-open message.
    pub opened: bool,
    /// Multi (house/boat) graphic rather than a plain item.
    pub is_multi: bool,

    pub(crate) layer: Layer,
    pub(crate) container: Option<Serial>,
    pub(crate) mount: Option<Serial>,
    #[serde(skip)]
    pub(crate) first_child: Option<Serial>,
    #[serde(skip)]
    pub(crate) last_child: Option<Serial>,
    #[serde(skip)]
    pub(crate) prev: Option<Serial>,
    #[serde(skip)]
    pub(crate) next: Option<Serial>,
}

impl Entity {
    pub fn new(serial: Serial, kind: EntityKind) -> Self {
        Self {
            serial,
            kind,
            graphic: 0,
            hue: 0,
            x: 0,
            y: 0,
            z: 0,
            direction: 0,
            flags: 0,
            notoriety: 0,
            amount: 0,
            name: String::new(),
            hits: 0,
            hits_max: 0,
            opened: false,
            is_multi: false,
            layer: Layer::INVALID,
            container: None,
            mount: None,
            first_child: None,
            last_child: None,
            prev: None,
            next: None,
        }
    }

    pub fn is_item(&self) -> bool {
        self.kind == EntityKind::Item
    }

    pub fn is_mobile(&self) -> bool {
        self.kind == EntityKind::Mobile
    }

    pub fn is_corpse(&self) -> bool {
        self.graphic == CORPSE_GRAPHIC
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn container(&self) -> Option<Serial> {
        self.container
    }

    /// The mobile's current mount, kept in sync with its `MOUNT` layer child.
    pub fn mount(&self) -> Option<Serial> {
        self.mount
    }

    pub fn first_child(&self) -> Option<Serial> {
        self.first_child
    }

    pub fn next_sibling(&self) -> Option<Serial> {
        self.next
    }

    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    /// Store a wire hue, clamping out-of-range values and keeping the
    /// partial-hue and translucency bits.
    pub fn set_hue(&mut self, raw: u16) {
        self.hue = normalize_hue(raw);
    }
}

fn normalize_hue(raw: u16) -> u16 {
    let base = raw & 0x3FFF;
    if base == 0 {
        return raw & 0x8000;
    }
    let base = if base >= HUE_LIMIT { 1 } else { base };
    base | (raw & 0xC000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hue_is_clamped() {
        let mut e = Entity::new(Serial(0x4000_0001), EntityKind::Item);
        e.set_hue(0x0021);
        assert_eq!(e.hue, 0x0021);
        e.set_hue(0x0FFF);
        assert_eq!(e.hue, 0x0001);
        e.set_hue(0x8021);
        assert_eq!(e.hue, 0x8021);
        e.set_hue(0x4000);
        assert_eq!(e.hue, 0x0000);
    }

    #[test]
    fn fresh_entity_is_detached() {
        let e = Entity::new(Serial(5), EntityKind::Mobile);
        assert!(e.is_mobile());
        assert_eq!(e.container(), None);
        assert_eq!(e.layer(), Layer::INVALID);
        assert!(!e.has_children());
    }
}
