use std::collections::{HashMap, HashSet};

use blake3::Hash;

use crate::error::{PadError, Result};
use crate::geometry::Rect;

pub type ZoneId = String;

/// User facing payload stored for each zone.
pub type ZoneContent = String;

#[derive(Debug, Clone)]
pub struct ZoneState {
    pub rect: Rect,
    pub content: ZoneContent,
    /// Content already laid out line by line (no wrapping at render time).
    pub is_pre_rendered: bool,
    hash: Option<Hash>,
    pub is_dirty: bool,
}

impl ZoneState {
    fn new(rect: Rect) -> Self {
        Self {
            rect,
            content: ZoneContent::new(),
            is_pre_rendered: false,
            hash: None,
            is_dirty: true,
        }
    }

    fn update_content(&mut self, content: ZoneContent, pre_rendered: bool) {
        let new_hash = blake3::hash(content.as_bytes());
        let changed = self.hash.map(|h| h != new_hash).unwrap_or(true)
            || self.is_pre_rendered != pre_rendered;
        if changed {
            self.content = content;
            self.is_pre_rendered = pre_rendered;
            self.hash = Some(new_hash);
            self.is_dirty = true;
        }
    }
}

/// Registry mapping layout zones to their last known states.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    entries: HashMap<ZoneId, ZoneState>,
    dirty: HashSet<ZoneId>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile zone rectangles with a freshly solved layout.
    pub fn sync_layout(&mut self, solved_rects: &HashMap<ZoneId, Rect>) {
        use std::collections::hash_map::Entry;

        for (id, rect) in solved_rects {
            match self.entries.entry(id.clone()) {
                Entry::Occupied(mut entry) => {
                    let state = entry.get_mut();
                    if state.rect != *rect {
                        state.rect = *rect;
                        state.is_dirty = true;
                        self.dirty.insert(id.clone());
                    }
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(ZoneState::new(*rect));
                    self.dirty.insert(id.clone());
                }
            }
        }

        self.entries.retain(|id, _| solved_rects.contains_key(id));
        self.dirty.retain(|id| solved_rects.contains_key(id));
    }

    pub fn apply_content(
        &mut self,
        zone_id: &str,
        content: ZoneContent,
        pre_rendered: bool,
    ) -> Result<()> {
        let entry = self
            .entries
            .get_mut(zone_id)
            .ok_or_else(|| PadError::ZoneNotFound(zone_id.to_string()))?;
        entry.update_content(content, pre_rendered);
        if entry.is_dirty {
            self.dirty.insert(zone_id.to_string());
        }
        Ok(())
    }

    /// Drain dirty zones in a stable (top-to-bottom, left-to-right) order.
    pub fn take_dirty(&mut self) -> Vec<(ZoneId, ZoneState)> {
        let mut drained: Vec<_> = self
            .dirty
            .drain()
            .filter_map(|id| {
                self.entries.get_mut(&id).map(|state| {
                    state.is_dirty = false;
                    (id, state.clone())
                })
            })
            .collect();
        drained.sort_by_key(|(_, state)| (state.rect.y, state.rect.x));
        drained
    }

    /// Mark every zone dirty so the next render repaints the whole screen.
    pub fn invalidate_all(&mut self) {
        for (id, state) in self.entries.iter_mut() {
            state.is_dirty = true;
            self.dirty.insert(id.clone());
        }
    }

    pub fn rect_of(&self, zone_id: &str) -> Option<Rect> {
        self.entries.get(zone_id).map(|state| state.rect)
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn rect() -> Rect {
        Rect::new(0, 0, 10, 5)
    }

    #[test]
    fn sync_layout_flags_new_zones_as_dirty() {
        let mut registry = ZoneRegistry::new();
        let mut solved = HashMap::new();
        solved.insert("zone".to_string(), rect());

        registry.sync_layout(&solved);
        let dirty = registry.take_dirty();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].0, "zone");
    }

    #[test]
    fn apply_content_detects_changes() {
        let mut registry = ZoneRegistry::new();
        let mut solved = HashMap::new();
        solved.insert("zone".to_string(), rect());
        registry.sync_layout(&solved);
        registry.take_dirty();

        registry
            .apply_content("zone", "hello".to_string(), false)
            .unwrap();
        assert_eq!(registry.take_dirty().len(), 1);

        registry
            .apply_content("zone", "hello".to_string(), false)
            .unwrap();
        assert!(registry.take_dirty().is_empty());
    }

    #[test]
    fn removed_zones_are_forgotten() {
        let mut registry = ZoneRegistry::new();
        let mut solved = HashMap::new();
        solved.insert("a".to_string(), rect());
        solved.insert("b".to_string(), Rect::new(0, 5, 10, 5));
        registry.sync_layout(&solved);

        solved.remove("b");
        registry.sync_layout(&solved);

        assert!(registry.rect_of("b").is_none());
        let dirty = registry.take_dirty();
        assert_eq!(dirty.len(), 1);
        assert!(matches!(
            registry.apply_content("b", String::new(), false),
            Err(PadError::ZoneNotFound(_))
        ));
    }

    #[test]
    fn dirty_zones_drain_in_screen_order() {
        let mut registry = ZoneRegistry::new();
        let mut solved = HashMap::new();
        solved.insert("bottom".to_string(), Rect::new(0, 9, 10, 1));
        solved.insert("top".to_string(), Rect::new(0, 0, 10, 1));
        registry.sync_layout(&solved);

        let ids: Vec<_> = registry.take_dirty().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["top".to_string(), "bottom".to_string()]);
    }
}
