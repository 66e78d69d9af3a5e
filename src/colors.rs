use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Representation gathered into each sample's color attribute.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    #[default]
    Rgb,
    Hsv,
    Yuv,
    Yiq,
}

// BT.601
const RGB_TO_YUV: [f32; 9] = [
    0.299, 0.587, 0.114, //
    -0.147_141_19, -0.288_869_16, 0.436_010_35, //
    0.614_975_38, -0.514_965_12, -0.100_010_26,
];

const RGB_TO_YIQ: [f32; 9] = [
    0.299, 0.587, 0.114, //
    0.595_900_59, -0.274_556_67, -0.321_343_92, //
    0.211_536_61, -0.522_736_17, 0.311_199_55,
];

impl ColorSpace {
    /// Converts a normalized rgb triple into this color space.
    pub fn convert(self, rgb: [f32; 3]) -> [f32; 3] {
        match self {
            ColorSpace::Rgb => rgb,
            ColorSpace::Hsv => rgb_to_hsv(rgb),
            ColorSpace::Yuv => apply(&RGB_TO_YUV, rgb),
            ColorSpace::Yiq => apply(&RGB_TO_YIQ, rgb),
        }
    }
}

fn apply(matrix: &[f32; 9], rgb: [f32; 3]) -> [f32; 3] {
    let m = na::Matrix3::from_row_slice(matrix);
    let out = m * na::Vector3::new(rgb[0], rgb[1], rgb[2]);
    [out.x, out.y, out.z]
}

/// Hue, saturation and value, all in [0, 1].
pub fn rgb_to_hsv([r, g, b]: [f32; 3]) -> [f32; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let s = if max > 0.0 { delta / max } else { 0.0 };
    if delta <= 0.0 {
        return [0.0, s, max];
    }
    let sector = if max == r {
        (g - b) / delta
    } else if max == g {
        2.0 + (b - r) / delta
    } else {
        4.0 + (r - g) / delta
    };
    let mut h = sector / 6.0;
    if h < 0.0 {
        h += 1.0;
    }
    [h, s, max]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn rgb_passes_through() {
        assert_eq!(ColorSpace::Rgb.convert([0.1, 0.2, 0.3]), [0.1, 0.2, 0.3]);
    }

    #[test]
    fn hsv_primaries() {
        assert!(close(rgb_to_hsv([1.0, 0.0, 0.0]), [0.0, 1.0, 1.0]));
        assert!(close(rgb_to_hsv([0.0, 1.0, 0.0]), [1.0 / 3.0, 1.0, 1.0]));
        assert!(close(rgb_to_hsv([0.0, 0.0, 1.0]), [2.0 / 3.0, 1.0, 1.0]));
        assert!(close(rgb_to_hsv([1.0, 0.0, 1.0]), [5.0 / 6.0, 1.0, 1.0]));
    }

    #[test]
    fn hsv_gray_has_no_hue() {
        assert!(close(rgb_to_hsv([0.5, 0.5, 0.5]), [0.0, 0.0, 0.5]));
        assert!(close(rgb_to_hsv([0.0, 0.0, 0.0]), [0.0, 0.0, 0.0]));
    }

    #[test]
    fn white_is_pure_luma() {
        assert!(close(ColorSpace::Yuv.convert([1.0, 1.0, 1.0]), [1.0, 0.0, 0.0]));
        assert!(close(ColorSpace::Yiq.convert([1.0, 1.0, 1.0]), [1.0, 0.0, 0.0]));
    }
}
