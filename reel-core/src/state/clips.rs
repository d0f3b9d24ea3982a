//! The clip table: a local cache of the deck's clip list.
//!
//! Rebuilt wholesale from a `clip_count` event and filled in by the
//! `clip_info` events that follow. Entries stay placeholders until
//! their info arrives; fewer `clip_info` events than announced simply
//! leaves unresolved entries behind.

use crate::timecode::Timecode;

/// One clip entry. All fields unresolved until a `clip_info` fills it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipSlot {
    pub name: Option<String>,
    /// Starting timecode of the clip on the tape.
    pub starting: Option<Timecode>,
    pub duration: Option<Timecode>,
}

impl ClipSlot {
    pub fn is_resolved(&self) -> bool {
        self.name.is_some()
    }

    /// Human-readable list label, placeholder form for unresolved slots.
    pub fn label(&self, index: usize) -> String {
        match (&self.name, &self.duration) {
            (Some(name), Some(duration)) => format!("[{duration}] {name}"),
            _ => format!("[--:--:--:--] - Clip {index}"),
        }
    }
}

/// The clip list plus the locally selected index.
#[derive(Debug, Default)]
pub struct ClipTable {
    slots: Vec<ClipSlot>,
    selected: Option<usize>,
}

impl ClipTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ClipSlot> {
        self.slots.get(index)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_slot(&self) -> Option<&ClipSlot> {
        self.selected.and_then(|i| self.slots.get(i))
    }

    /// Index of the newest (highest-index) clip.
    pub fn newest(&self) -> Option<usize> {
        self.slots.len().checked_sub(1)
    }

    /// Replace the table with exactly `count` placeholders. A previous
    /// selection survives iff it is still within range.
    pub fn rebuild(&mut self, count: usize) {
        self.slots = vec![ClipSlot::default(); count];
        self.selected = self.selected.filter(|&i| i < count);
    }

    /// Populate or overwrite the slot for a 1-based wire id, extending
    /// the table with placeholders if the info outran the count.
    /// Returns the local index, or `None` for the invalid id 0.
    pub fn fill(
        &mut self,
        id: usize,
        name: String,
        starting: Option<Timecode>,
        duration: Option<Timecode>,
    ) -> Option<usize> {
        let index = id.checked_sub(1)?;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, ClipSlot::default);
        }
        self.slots[index] = ClipSlot {
            name: Some(name),
            starting,
            duration,
        };
        Some(index)
    }

    /// Select by index; out-of-range leaves the selection unchanged.
    pub fn select(&mut self, index: usize) -> Option<&ClipSlot> {
        if index < self.slots.len() {
            self.selected = Some(index);
            self.slots.get(index)
        } else {
            None
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timecode::{FrameRate, Timecode};

    fn tc(frames: u64) -> Timecode {
        Timecode::from_frames(frames, FrameRate::Fps30, false)
    }

    #[test]
    fn rebuild_creates_placeholders() {
        let mut table = ClipTable::new();
        table.rebuild(3);
        assert_eq!(table.len(), 3);
        assert!(table.get(0).is_some_and(|s| !s.is_resolved()));
        assert_eq!(table.get(2).unwrap().label(2), "[--:--:--:--] - Clip 2");
    }

    #[test]
    fn fill_populates_only_its_slot() {
        let mut table = ClipTable::new();
        table.rebuild(3);
        let index = table
            .fill(2, "take 1".into(), Some(tc(0)), Some(tc(1800)))
            .unwrap();
        assert_eq!(index, 1);
        assert!(!table.get(0).unwrap().is_resolved());
        assert!(table.get(1).unwrap().is_resolved());
        assert!(!table.get(2).unwrap().is_resolved());
        assert_eq!(table.get(1).unwrap().label(1), "[00:01:00:00] take 1");
    }

    #[test]
    fn fill_extends_past_announced_count() {
        // clip_info racing ahead of clip_count.
        let mut table = ClipTable::new();
        table.rebuild(1);
        let index = table.fill(4, "late".into(), None, None).unwrap();
        assert_eq!(index, 3);
        assert_eq!(table.len(), 4);
        assert!(!table.get(1).unwrap().is_resolved());
    }

    #[test]
    fn fill_rejects_wire_id_zero() {
        let mut table = ClipTable::new();
        table.rebuild(1);
        assert!(table.fill(0, "bogus".into(), None, None).is_none());
    }

    #[test]
    fn rebuild_preserves_selection_in_range() {
        let mut table = ClipTable::new();
        table.rebuild(3);
        table.select(2);
        table.rebuild(5);
        assert_eq!(table.selected(), Some(2));
    }

    #[test]
    fn rebuild_drops_selection_out_of_range() {
        let mut table = ClipTable::new();
        table.rebuild(3);
        table.select(2);
        table.rebuild(2);
        assert_eq!(table.selected(), None);
    }

    #[test]
    fn select_out_of_range_is_ignored() {
        let mut table = ClipTable::new();
        table.rebuild(2);
        table.select(1);
        assert!(table.select(7).is_none());
        assert_eq!(table.selected(), Some(1));
    }

    #[test]
    fn newest_is_highest_index() {
        let mut table = ClipTable::new();
        assert_eq!(table.newest(), None);
        table.rebuild(4);
        assert_eq!(table.newest(), Some(3));
    }
}
