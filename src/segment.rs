use rayon::prelude::*;

/// Per-point membership of one class instance, aligned with the frame's pixel grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMask(Vec<bool>);

impl SegmentMask {
    pub fn new(mask: Vec<bool>) -> SegmentMask {
        SegmentMask(mask)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of selected points.
    pub fn count(&self) -> usize {
        self.0.par_iter().filter(|m| **m).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Gathers the selected elements of a pixel-aligned array, keeping pixel order.
    pub fn select<T: Copy>(&self, values: &[T]) -> Vec<T> {
        debug_assert_eq!(values.len(), self.0.len());
        values
            .iter()
            .zip(&self.0)
            .filter_map(|(v, m)| m.then_some(*v))
            .collect()
    }
}

/// Marks pixels labelled with `class_id` (0-based) that also carry a depth reading.
/// Labels are 1-based with 0 as background.
pub fn extract_mask(label: &[u8], class_id: usize, depth_valid: &[bool]) -> SegmentMask {
    debug_assert_eq!(label.len(), depth_valid.len());
    let mask = label
        .par_iter()
        .zip(depth_valid.par_iter())
        .map(|(l, valid)| *valid && (*l as usize).checked_sub(1) == Some(class_id))
        .collect();
    SegmentMask(mask)
}
