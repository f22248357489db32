use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::entity::{Entity, EntityKind};
use crate::error::{Result, WorldError};
use crate::layer::Layer;
use crate::properties::PropertyCache;
use crate::serial::Serial;

/// Upper bound on container nesting walked by ancestor lookups. Longer
/// chains only arise from corrupt state and are treated as cycles.
const MAX_DEPTH: usize = 1024;

/// Where a reparented entity lands among its new siblings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Placement {
    Front,
    #[default]
    Back,
}

/// Change notifications for consumers that mirror the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorldEvent {
    Removed {
        serial: Serial,
        container: Option<Serial>,
    },
    ContainerChanged {
        container: Serial,
    },
    ContainerOpened {
        serial: Serial,
        graphic: u16,
    },
    PaperdollChanged {
        mobile: Serial,
    },
    NameChanged {
        serial: Serial,
    },
    HitsChanged {
        serial: Serial,
    },
    PropertiesChanged {
        serial: Serial,
    },
    Died {
        serial: Serial,
        alias: Serial,
        corpse: Serial,
    },
}

/// Arena of entities keyed by serial.
///
/// All links are serial-valued. Operations here keep them consistent: a
/// child's `container` names its parent, and the parent's child list
/// contains exactly the entities that name it.
#[derive(Debug, Default)]
pub struct World {
    entities: HashMap<Serial, Entity>,
    player: Option<Serial>,
    properties: PropertyCache,
    events: Vec<WorldEvent>,
    /// Serials that left the arena since the last [`World::take_removed`].
    removed: Vec<Serial>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, serial: Serial) -> bool {
        self.entities.contains_key(&serial)
    }

    pub fn get(&self, serial: Serial) -> Option<&Entity> {
        self.entities.get(&serial)
    }

    pub fn get_mut(&mut self, serial: Serial) -> Option<&mut Entity> {
        self.entities.get_mut(&serial)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn player(&self) -> Option<Serial> {
        self.player
    }

    pub fn set_player(&mut self, serial: Serial) {
        self.player = Some(serial);
    }

    pub fn is_player(&self, serial: Serial) -> bool {
        self.player == Some(serial)
    }

    pub fn properties(&self) -> &PropertyCache {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyCache {
        &mut self.properties
    }

    /// Fetch an entity, creating it if absent.
    ///
    /// An `Unknown` placeholder is upgraded in place so links made by
    /// earlier forward references survive. Asking for `Unknown` never
    /// downgrades an existing entity.
    pub fn get_or_create(&mut self, serial: Serial, kind: EntityKind) -> &mut Entity {
        let mut became_mobile = false;
        match self.entities.entry(serial) {
            Entry::Occupied(entry) => {
                let entity = entry.into_mut();
                if kind != EntityKind::Unknown && entity.kind != kind {
                    if entity.kind != EntityKind::Unknown {
                        tracing::warn!(
                            serial = %serial,
                            from = entity.kind.as_str(),
                            to = kind.as_str(),
                            "entity changed kind"
                        );
                    }
                    entity.kind = kind;
                    became_mobile = kind == EntityKind::Mobile;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Entity::new(serial, kind));
            }
        }
        if became_mobile {
            self.refresh_mount(serial);
        }
        self.entities
            .entry(serial)
            .or_insert_with(|| Entity::new(serial, kind))
    }

    /// Child serials of `serial` in list order.
    pub fn children(&self, serial: Serial) -> Vec<Serial> {
        let mut out = Vec::new();
        let mut cursor = self.entities.get(&serial).and_then(|e| e.first_child);
        while let Some(child) = cursor {
            if out.len() >= self.entities.len() {
                tracing::error!(container = %serial, "child list does not terminate");
                break;
            }
            out.push(child);
            cursor = self.entities.get(&child).and_then(|e| e.next);
        }
        out
    }

    /// Outermost container of `serial`, or `serial` itself when it sits in
    /// the world.
    pub fn root_container(&self, serial: Serial) -> Serial {
        let mut current = serial;
        for _ in 0..MAX_DEPTH {
            match self.entities.get(&current).and_then(|e| e.container) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    /// Move `serial` under `container`, creating the container as a
    /// placeholder if it does not exist yet.
    ///
    /// Reparenting to the current container is a move within the list, so
    /// applying the same call twice leaves the graph unchanged.
    pub fn reparent(
        &mut self,
        serial: Serial,
        container: Serial,
        placement: Placement,
    ) -> Result<()> {
        if !self.entities.contains_key(&serial) {
            return Err(WorldError::NotFound(serial));
        }
        if serial == container || self.is_ancestor(serial, container) {
            return Err(WorldError::SelfContainment { serial, container });
        }
        self.detach(serial);
        self.get_or_create(container, EntityKind::Unknown);
        self.link(container, serial, placement);
        Ok(())
    }

    /// Unlink `serial` from its container. Returns whether it had one.
    pub fn detach(&mut self, serial: Serial) -> bool {
        let (parent, prev, next) = match self.entities.get(&serial) {
            Some(e) => match e.container {
                Some(parent) => (parent, e.prev, e.next),
                None => return false,
            },
            None => return false,
        };

        match prev {
            Some(prev) => {
                if let Some(p) = self.entities.get_mut(&prev) {
                    p.next = next;
                }
            }
            None => {
                if let Some(p) = self.entities.get_mut(&parent) {
                    p.first_child = next;
                }
            }
        }
        match next {
            Some(next) => {
                if let Some(n) = self.entities.get_mut(&next) {
                    n.prev = prev;
                }
            }
            None => {
                if let Some(p) = self.entities.get_mut(&parent) {
                    p.last_child = prev;
                }
            }
        }
        if let Some(p) = self.entities.get_mut(&parent) {
            if p.mount == Some(serial) {
                p.mount = None;
            }
        }
        if let Some(e) = self.entities.get_mut(&serial) {
            e.container = None;
            e.prev = None;
            e.next = None;
        }
        true
    }

    /// Remove `serial` and everything it transitively contains.
    ///
    /// Returns the number of entities removed. With `notify`, a
    /// [`WorldEvent::Removed`] is queued for each one.
    pub fn remove(&mut self, serial: Serial, notify: bool) -> usize {
        if !self.entities.contains_key(&serial) {
            return 0;
        }
        let mut removed = 0;
        for serial in self.subtree(serial) {
            let container = self.entities.get(&serial).and_then(|e| e.container);
            self.detach(serial);
            self.properties.forget(serial);
            if self.entities.remove(&serial).is_none() {
                continue;
            }
            removed += 1;
            self.removed.push(serial);
            if self.player == Some(serial) {
                self.player = None;
            }
            if notify {
                self.events.push(WorldEvent::Removed { serial, container });
            }
        }
        removed
    }

    /// `serial` and everything under it, children before their container.
    fn subtree(&self, serial: Serial) -> Vec<Serial> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![(serial, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                order.push(current);
                continue;
            }
            if !seen.insert(current) {
                continue;
            }
            stack.push((current, true));
            for child in self.children(current).into_iter().rev() {
                stack.push((child, false));
            }
        }
        order
    }

    /// Remove the children of `serial`. With `keep_equipped`, children that
    /// occupy a layer stay.
    pub fn clear_children(&mut self, serial: Serial, keep_equipped: bool) -> usize {
        let mut removed = 0;
        for child in self.children(serial) {
            let equipped = self
                .entities
                .get(&child)
                .is_some_and(|e| e.layer.is_equipped());
            if keep_equipped && equipped {
                continue;
            }
            removed += self.remove(child, true);
        }
        removed
    }

    /// Change an entity's layer, keeping the container's mount in sync.
    pub fn set_layer(&mut self, serial: Serial, layer: Layer) {
        let parent = match self.entities.get_mut(&serial) {
            Some(e) => {
                e.layer = layer;
                e.container
            }
            None => return,
        };
        if let Some(parent) = parent {
            self.sync_mount(parent, serial, layer);
        }
    }

    /// Place `item` on `holder` in `layer`.
    pub fn equip(&mut self, item: Serial, holder: Serial, layer: Layer) -> Result<()> {
        self.reparent(item, holder, Placement::Back)?;
        self.set_layer(item, layer);
        Ok(())
    }

    /// Re-key a dead mobile to its corpse alias so its equipment survives
    /// until the corpse is announced. Returns the alias.
    pub fn alias_as_corpse(&mut self, serial: Serial) -> Option<Serial> {
        let alias = serial.corpse_alias();
        if alias == serial || !self.entities.contains_key(&serial) {
            return None;
        }
        if self.entities.contains_key(&alias) {
            self.remove(alias, false);
        }
        let parent = self.entities.get(&serial).and_then(|e| e.container);
        if parent.is_some() {
            self.detach(serial);
        }
        let mut entity = self.entities.remove(&serial)?;
        entity.serial = alias;

        let mut cursor = entity.first_child;
        while let Some(child) = cursor {
            match self.entities.get_mut(&child) {
                Some(c) => {
                    c.container = Some(alias);
                    cursor = c.next;
                }
                None => break,
            }
        }
        self.entities.insert(alias, entity);
        if let Some(parent) = parent {
            self.link(parent, alias, Placement::Back);
        }
        if self.player == Some(serial) {
            self.player = None;
        }
        self.properties.forget(serial);
        self.removed.push(serial);
        Some(alias)
    }

    /// Queue an event for [`World::take_events`].
    pub fn notify(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Serials removed or re-keyed since the last call, whether or not
    /// events were queued for them.
    pub fn take_removed(&mut self) -> Vec<Serial> {
        std::mem::take(&mut self.removed)
    }

    /// Drop every entity, cached property and pending event.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.properties.clear();
        self.events.clear();
        self.removed.clear();
        self.player = None;
    }

    fn is_ancestor(&self, ancestor: Serial, serial: Serial) -> bool {
        let mut current = serial;
        for _ in 0..MAX_DEPTH {
            match self.entities.get(&current).and_then(|e| e.container) {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => current = parent,
                None => return false,
            }
        }
        tracing::warn!(serial = %serial, "container chain exceeds {MAX_DEPTH} levels");
        true
    }

    fn link(&mut self, parent: Serial, child: Serial, placement: Placement) {
        let (first, last) = match self.entities.get(&parent) {
            Some(p) => (p.first_child, p.last_child),
            None => return,
        };
        match placement {
            Placement::Back => {
                if let Some(c) = self.entities.get_mut(&child) {
                    c.container = Some(parent);
                    c.prev = last;
                    c.next = None;
                }
                if let Some(last) = last {
                    if let Some(l) = self.entities.get_mut(&last) {
                        l.next = Some(child);
                    }
                }
                if let Some(p) = self.entities.get_mut(&parent) {
                    p.last_child = Some(child);
                    if p.first_child.is_none() {
                        p.first_child = Some(child);
                    }
                }
            }
            Placement::Front => {
                if let Some(c) = self.entities.get_mut(&child) {
                    c.container = Some(parent);
                    c.prev = None;
                    c.next = first;
                }
                if let Some(first) = first {
                    if let Some(f) = self.entities.get_mut(&first) {
                        f.prev = Some(child);
                    }
                }
                if let Some(p) = self.entities.get_mut(&parent) {
                    p.first_child = Some(child);
                    if p.last_child.is_none() {
                        p.last_child = Some(child);
                    }
                }
            }
        }
        let layer = self
            .entities
            .get(&child)
            .map_or(Layer::INVALID, |c| c.layer);
        self.sync_mount(parent, child, layer);
    }

    fn sync_mount(&mut self, parent: Serial, child: Serial, layer: Layer) {
        if let Some(p) = self.entities.get_mut(&parent) {
            if layer == Layer::MOUNT && p.kind == EntityKind::Mobile {
                p.mount = Some(child);
            } else if p.mount == Some(child) {
                p.mount = None;
            }
        }
    }

    fn refresh_mount(&mut self, serial: Serial) {
        let mount = self.children(serial).into_iter().find(|child| {
            self.entities
                .get(child)
                .is_some_and(|c| c.layer == Layer::MOUNT)
        });
        if let Some(e) = self.entities.get_mut(&serial) {
            e.mount = mount;
        }
    }
}
