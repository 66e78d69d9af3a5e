use crate::{colors::ColorSpace, frame::Frame, frame::Intrinsics, point3d::Point3d};
use rayon::prelude::*;

/// Dense per-pixel cloud. All three arrays share the row-major pixel index `r * width + c`.
#[derive(Debug, Clone)]
pub struct PointCloud {
    pub xyz: Vec<Point3d>,
    pub rgb: Vec<[f32; 3]>,
    pub depth_valid: Vec<bool>,
}

impl PointCloud {
    pub fn from_frame(frame: &Frame, color_space: ColorSpace) -> PointCloud {
        let xyz = project(
            &frame.depth,
            frame.width,
            &frame.intrinsics,
            frame.depth_scaling_factor,
        );
        let rgb = frame
            .image
            .par_chunks_exact(3)
            .map(|px| {
                color_space.convert([
                    px[0] as f32 / 255.0,
                    px[1] as f32 / 255.0,
                    px[2] as f32 / 255.0,
                ])
            })
            .collect();
        let depth_valid = frame.depth.par_iter().map(|d| *d != 0).collect();
        PointCloud {
            xyz,
            rgb,
            depth_valid,
        }
    }

    pub fn len(&self) -> usize {
        self.xyz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xyz.is_empty()
    }
}

/// Back-projects a row-major depth map through a pinhole camera.
///
/// Zero-depth pixels still produce a point at the camera origin; callers track
/// validity separately.
pub fn project(depth: &[u16], width: usize, intrinsics: &Intrinsics, scale: f32) -> Vec<Point3d> {
    if width == 0 {
        return Vec::new();
    }
    depth
        .par_iter()
        .enumerate()
        .map(|(i, d)| {
            let row = (i / width) as f32;
            let col = (i % width) as f32;
            let z = *d as f32 / scale;
            Point3d {
                x: (col - intrinsics.cx) * z / intrinsics.fx,
                y: (row - intrinsics.cy) * z / intrinsics.fy,
                z,
            }
        })
        .collect()
}
