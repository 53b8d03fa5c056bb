//! BoxCollection - ordered boxes plus the active selection.
//!
//! Out-of-range selects and removes are silent no-ops. The collection is
//! replaced wholesale on load; there is no merge.

use log::debug;

use super::oriented_box::OrientedBox;

#[derive(Debug, Clone, Default)]
pub struct BoxCollection {
    boxes: Vec<OrientedBox>,
    selected: Option<usize>,
}

impl BoxCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_boxes(boxes: Vec<OrientedBox>) -> Self {
        let mut c = Self::new();
        c.replace_all(boxes);
        c
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrientedBox> {
        self.boxes.iter()
    }

    pub fn as_slice(&self) -> &[OrientedBox] {
        &self.boxes
    }

    pub fn get(&self, index: usize) -> Option<&OrientedBox> {
        self.boxes.get(index)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&OrientedBox> {
        self.selected.and_then(|i| self.boxes.get(i))
    }

    pub fn selected_mut(&mut self) -> Option<&mut OrientedBox> {
        self.selected.and_then(|i| self.boxes.get_mut(i))
    }

    /// Select `index`. Returns false (and changes nothing) when out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.boxes.len() {
            debug!("[select] index {} out of range ({} boxes)", index, self.boxes.len());
            return false;
        }
        self.selected = Some(index);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Select the following box, wrapping around.
    pub fn select_next(&mut self) -> Option<usize> {
        if self.boxes.is_empty() {
            return None;
        }
        let next = self.selected.map_or(0, |i| (i + 1) % self.boxes.len());
        self.selected = Some(next);
        self.selected
    }

    /// Select the preceding box, wrapping around.
    pub fn select_prev(&mut self) -> Option<usize> {
        if self.boxes.is_empty() {
            return None;
        }
        let n = self.boxes.len();
        let prev = self.selected.map_or(n - 1, |i| (i + n - 1) % n);
        self.selected = Some(prev);
        self.selected
    }

    /// Remove the box at `index`.
    ///
    /// Removing the selected box moves the selection to `min(index, len-1)`
    /// (the box that slid into its slot), or clears it when nothing is
    /// left. A selection after `index` shifts down to keep the same box.
    pub fn remove(&mut self, index: usize) -> Option<OrientedBox> {
        if index >= self.boxes.len() {
            return None;
        }
        let removed = self.boxes.remove(index);
        self.selected = match self.selected {
            _ if self.boxes.is_empty() => None,
            Some(s) if s == index => Some(index.min(self.boxes.len() - 1)),
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        debug!("[remove] removed {} at {}, selection now {:?}", removed.obj_id, index, self.selected);
        Some(removed)
    }

    pub fn remove_selected(&mut self) -> Option<OrientedBox> {
        let index = self.selected?;
        self.remove(index)
    }

    /// Append a box, returns its index. Selection is unchanged.
    pub fn add(&mut self, b: OrientedBox) -> usize {
        self.boxes.push(b);
        self.boxes.len() - 1
    }

    /// Replace everything. Selects the first box if there is one.
    pub fn replace_all(&mut self, boxes: Vec<OrientedBox>) {
        self.boxes = boxes;
        self.selected = if self.boxes.is_empty() { None } else { Some(0) };
    }

    /// Index of the box with this id.
    pub fn position(&self, obj_id: &str) -> Option<usize> {
        self.boxes.iter().position(|b| b.obj_id == obj_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn three() -> BoxCollection {
        BoxCollection::from_boxes(
            (0..3)
                .map(|i| OrientedBox::axis_aligned(i.to_string(), DVec3::new(i as f64, 0.0, 0.0), DVec3::ONE))
                .collect(),
        )
    }

    #[test]
    fn test_remove_first_selected() {
        let mut c = three();
        assert!(c.select(0));
        let removed = c.remove(0).expect("in range");
        assert_eq!(removed.obj_id, "0");
        assert_eq!(c.len(), 2);
        assert_eq!(c.selected_index(), Some(0));
        assert_eq!(c.get(0).map(|b| b.obj_id.as_str()), Some("1"));
    }

    #[test]
    fn test_remove_last_selected_clamps() {
        let mut c = three();
        c.select(2);
        c.remove(2);
        assert_eq!(c.selected_index(), Some(1));
    }

    #[test]
    fn test_remove_before_selection_shifts() {
        let mut c = three();
        c.select(2);
        c.remove(0);
        assert_eq!(c.selected().map(|b| b.obj_id.as_str()), Some("2"));
        assert_eq!(c.selected_index(), Some(1));
    }

    #[test]
    fn test_remove_until_empty() {
        let mut c = three();
        c.select(0);
        while c.remove_selected().is_some() {}
        assert!(c.is_empty());
        assert_eq!(c.selected_index(), None);
    }

    #[test]
    fn test_out_of_range_noops() {
        let mut c = three();
        c.select(1);
        assert!(!c.select(3));
        assert_eq!(c.selected_index(), Some(1));
        assert!(c.remove(7).is_none());
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_prev_next_wrap() {
        let mut c = three();
        c.clear_selection();
        assert_eq!(c.select_next(), Some(0));
        assert_eq!(c.select_prev(), Some(2));
        assert_eq!(c.select_next(), Some(0));
        assert_eq!(BoxCollection::new().select_next(), None);
    }

    #[test]
    fn test_replace_all_resets_selection() {
        let mut c = three();
        c.select(2);
        c.replace_all(Vec::new());
        assert_eq!(c.selected_index(), None);
        c.replace_all(vec![OrientedBox::axis_aligned("x", DVec3::ZERO, DVec3::ONE)]);
        assert_eq!(c.selected_index(), Some(0));
        assert_eq!(c.position("x"), Some(0));
    }
}
