//! Decoded RGB-D frames and the serialized record they come from.

use crate::error::FrameError;
use serde::{Deserialize, Serialize};

/// Pinhole camera parameters in pixels.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

/// One frame as it is stored on disk: raw byte buffers plus their declared shapes.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FrameRecord {
    pub image: Vec<u8>,
    pub image_shape: Vec<i64>,
    /// Little-endian u16 samples.
    pub depth: Vec<u8>,
    pub depth_shape: Vec<i64>,
    pub label: Vec<u8>,
    pub label_shape: Vec<i64>,
    pub quaternions: Vec<[f32; 4]>,
    pub translations: Vec<[f32; 3]>,
    pub class_one_hot: Vec<i64>,
    pub seq_id: i64,
    pub frame_id: i64,
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    pub factor_depth: f32,
}

/// A validated frame. Every per-pixel buffer is row-major over the same
/// `height x width` grid, and every per-class buffer has one entry per class.
#[derive(Debug, Clone)]
pub struct Frame {
    pub height: usize,
    pub width: usize,
    /// Interleaved rgb, alpha already dropped.
    pub image: Vec<u8>,
    pub depth: Vec<u16>,
    /// 1-based class ids, 0 is background.
    pub label: Vec<u8>,
    pub intrinsics: Intrinsics,
    pub depth_scaling_factor: f32,
    pub class_one_hot: Vec<u8>,
    pub quaternions: Vec<[f32; 4]>,
    pub translations: Vec<[f32; 3]>,
    pub seq_id: i64,
    pub frame_id: i64,
}

fn dims(field: &'static str, shape: &[i64], rank: usize) -> Result<Vec<usize>, FrameError> {
    let bad = || FrameError::BadShape {
        field,
        shape: shape.to_vec(),
        rank,
    };
    if shape.len() != rank {
        return Err(bad());
    }
    shape
        .iter()
        .map(|d| usize::try_from(*d).map_err(|_| bad()))
        .collect()
}

fn check_len(
    field: &'static str,
    shape: &[i64],
    expected: usize,
    actual: usize,
) -> Result<(), FrameError> {
    if expected != actual {
        return Err(FrameError::ShapeMismatch {
            field,
            shape: shape.to_vec(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_classes(field: &'static str, expected: usize, actual: usize) -> Result<(), FrameError> {
    if expected != actual {
        return Err(FrameError::ClassCountMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

impl Frame {
    /// Parses one record payload.
    pub fn decode(payload: &[u8], num_classes: usize) -> Result<Frame, FrameError> {
        let record: FrameRecord = serde_json::from_slice(payload)?;
        Frame::from_record(record, num_classes)
    }

    pub fn from_record(record: FrameRecord, num_classes: usize) -> Result<Frame, FrameError> {
        let image_dims = dims("image", &record.image_shape, 3)?;
        let (height, width, channels) = (image_dims[0], image_dims[1], image_dims[2]);
        if channels != 3 && channels != 4 {
            return Err(FrameError::UnsupportedChannels(record.image_shape[2]));
        }
        // shapes are untrusted, buffer sizes must not wrap
        let too_large = || FrameError::BadShape {
            field: "image",
            shape: record.image_shape.clone(),
            rank: 3,
        };
        let pixels = height.checked_mul(width).ok_or_else(too_large)?;
        let image_len = pixels.checked_mul(channels).ok_or_else(too_large)?;
        let depth_len = pixels.checked_mul(2).ok_or_else(too_large)?;
        check_len("image", &record.image_shape, image_len, record.image.len())?;

        for (field, shape) in [
            ("depth", &record.depth_shape),
            ("label", &record.label_shape),
        ] {
            if dims(field, shape, 2)? != [height, width] {
                return Err(FrameError::GridMismatch {
                    field,
                    shape: shape.clone(),
                    height,
                    width,
                });
            }
        }
        check_len("depth", &record.depth_shape, depth_len, record.depth.len())?;
        check_len("label", &record.label_shape, pixels, record.label.len())?;

        check_classes("class_one_hot", num_classes, record.class_one_hot.len())?;
        check_classes("quaternions", num_classes, record.quaternions.len())?;
        check_classes("translations", num_classes, record.translations.len())?;

        let intrinsics = Intrinsics {
            fx: record.fx,
            fy: record.fy,
            cx: record.cx,
            cy: record.cy,
        };
        if !(intrinsics.fx.is_normal() && intrinsics.fy.is_normal()) {
            return Err(FrameError::InvalidIntrinsics(format!(
                "focal lengths fx={} fy={}",
                intrinsics.fx, intrinsics.fy
            )));
        }
        if !(record.factor_depth.is_finite() && record.factor_depth > 0.0) {
            return Err(FrameError::InvalidIntrinsics(format!(
                "depth scaling factor {}",
                record.factor_depth
            )));
        }

        let image = if channels == 4 {
            record
                .image
                .chunks_exact(4)
                .flat_map(|px| px[..3].iter().copied())
                .collect()
        } else {
            record.image
        };
        let depth = record
            .depth
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect();

        Ok(Frame {
            height,
            width,
            image,
            depth,
            label: record.label,
            intrinsics,
            depth_scaling_factor: record.factor_depth,
            class_one_hot: record.class_one_hot.iter().map(|v| (*v == 1) as u8).collect(),
            quaternions: record.quaternions,
            translations: record.translations,
            seq_id: record.seq_id,
            frame_id: record.frame_id,
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.height * self.width
    }

    pub fn has_class(&self, class_id: usize) -> bool {
        self.class_one_hot.get(class_id) == Some(&1)
    }
}

impl From<&Frame> for FrameRecord {
    fn from(frame: &Frame) -> Self {
        FrameRecord {
            image: frame.image.clone(),
            image_shape: vec![frame.height as i64, frame.width as i64, 3],
            depth: frame.depth.iter().flat_map(|d| d.to_le_bytes()).collect(),
            depth_shape: vec![frame.height as i64, frame.width as i64],
            label: frame.label.clone(),
            label_shape: vec![frame.height as i64, frame.width as i64],
            quaternions: frame.quaternions.clone(),
            translations: frame.translations.clone(),
            class_one_hot: frame.class_one_hot.iter().map(|v| *v as i64).collect(),
            seq_id: frame.seq_id,
            frame_id: frame.frame_id,
            fx: frame.intrinsics.fx,
            fy: frame.intrinsics.fy,
            cx: frame.intrinsics.cx,
            cy: frame.intrinsics.cy,
            factor_depth: frame.depth_scaling_factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(h: usize, w: usize, channels: usize) -> FrameRecord {
        FrameRecord {
            image: (0..h * w * channels).map(|i| i as u8).collect(),
            image_shape: vec![h as i64, w as i64, channels as i64],
            depth: (0..h * w).flat_map(|i| (1000 + i as u16).to_le_bytes()).collect(),
            depth_shape: vec![h as i64, w as i64],
            label: vec![1; h * w],
            label_shape: vec![h as i64, w as i64],
            quaternions: vec![[1.0, 0.0, 0.0, 0.0]],
            translations: vec![[0.1, 0.2, 0.3]],
            class_one_hot: vec![1],
            seq_id: 4,
            frame_id: 17,
            fx: 500.0,
            fy: 500.0,
            cx: 1.0,
            cy: 1.0,
            factor_depth: 1000.0,
        }
    }

    #[test]
    fn decodes_depth_little_endian() {
        let frame = Frame::from_record(record(2, 3, 3), 1).unwrap();
        assert_eq!(frame.depth, vec![1000, 1001, 1002, 1003, 1004, 1005]);
        assert_eq!(frame.pixel_count(), 6);
        assert!(frame.has_class(0));
        assert!(!frame.has_class(1));
    }

    #[test]
    fn drops_alpha_channel() {
        let frame = Frame::from_record(record(1, 2, 4), 1).unwrap();
        assert_eq!(frame.image, vec![0, 1, 2, 4, 5, 6]);
    }

    #[test]
    fn rejects_two_channel_image() {
        let err = Frame::from_record(record(2, 2, 2), 1).unwrap_err();
        assert!(matches!(err, FrameError::UnsupportedChannels(2)));
    }

    #[test]
    fn rejects_short_depth_buffer() {
        let mut rec = record(2, 2, 3);
        rec.depth.pop();
        let err = Frame::from_record(rec, 1).unwrap_err();
        assert!(matches!(err, FrameError::ShapeMismatch { field: "depth", .. }));
    }

    #[test]
    fn rejects_shape_whose_size_overflows() {
        let huge = 1i64 << 32;
        let mut rec = record(2, 2, 3);
        rec.image = Vec::new();
        rec.image_shape = vec![huge, huge, 3];
        rec.depth = Vec::new();
        rec.depth_shape = vec![huge, huge];
        rec.label = Vec::new();
        rec.label_shape = vec![huge, huge];
        let err = Frame::from_record(rec, 1).unwrap_err();
        assert!(matches!(err, FrameError::BadShape { field: "image", .. }));
    }

    #[test]
    fn rejects_negative_dimension() {
        let mut rec = record(2, 2, 3);
        rec.depth_shape = vec![-2, 2];
        let err = Frame::from_record(rec, 1).unwrap_err();
        assert!(matches!(err, FrameError::BadShape { field: "depth", .. }));
    }

    #[test]
    fn rejects_label_on_different_grid() {
        let mut rec = record(2, 2, 3);
        rec.label_shape = vec![4, 1];
        let err = Frame::from_record(rec, 1).unwrap_err();
        assert!(matches!(err, FrameError::GridMismatch { field: "label", .. }));
    }

    #[test]
    fn rejects_wrong_class_count() {
        let err = Frame::from_record(record(2, 2, 3), 3).unwrap_err();
        assert!(matches!(err, FrameError::ClassCountMismatch { .. }));
    }

    #[test]
    fn rejects_zero_depth_factor() {
        let mut rec = record(2, 2, 3);
        rec.factor_depth = 0.0;
        assert!(matches!(
            Frame::from_record(rec, 1),
            Err(FrameError::InvalidIntrinsics(_))
        ));
    }

    #[test]
    fn garbage_payload_is_decode_error() {
        let err = Frame::decode(b"not json", 1).unwrap_err();
        assert!(matches!(err, FrameError::Decode(_)));
    }

    #[test]
    fn record_conversion_is_lossless() {
        let frame = Frame::from_record(record(3, 2, 3), 1).unwrap();
        let payload = serde_json::to_vec(&FrameRecord::from(&frame)).unwrap();
        let again = Frame::decode(&payload, 1).unwrap();
        assert_eq!(again.depth, frame.depth);
        assert_eq!(again.image, frame.image);
        assert_eq!(again.frame_id, 17);
    }
}
