use crate::{error::FrameError, point3d::Point3d, segment::SegmentMask};
use nalgebra as na;
use rayon::prelude::*;

/// Mean position of the selected points, or `None` when nothing is selected.
pub fn segment_centroid(xyz: &[Point3d], mask: &SegmentMask) -> Option<na::Vector3<f64>> {
    let (sum, count) = xyz
        .par_iter()
        .zip(mask.as_slice().par_iter())
        .filter(|(_, m)| **m)
        .map(|(pt, _)| (pt.to_na_vec_f64(), 1usize))
        .reduce(
            || (na::Vector3::zeros(), 0),
            |(sum_a, n_a), (sum_b, n_b)| (sum_a + sum_b, n_a + n_b),
        );
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Drops selected points farther than `threshold` from the segment centroid.
///
/// One centroid, one pass. An empty mask has no centroid and is reported as
/// [`FrameError::DegenerateCentroid`]; callers are expected to check first.
pub fn refine(
    xyz: &[Point3d],
    mask: &SegmentMask,
    threshold: f32,
) -> Result<SegmentMask, FrameError> {
    let centroid = segment_centroid(xyz, mask).ok_or(FrameError::DegenerateCentroid)?;
    let threshold = threshold as f64;
    let refined = xyz
        .par_iter()
        .zip(mask.as_slice().par_iter())
        .map(|(pt, m)| *m && (pt.to_na_vec_f64() - centroid).norm() <= threshold)
        .collect();
    Ok(SegmentMask::new(refined))
}
