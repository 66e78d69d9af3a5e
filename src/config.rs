use crate::colors::ColorSpace;
use crate::error::{Result, SamplerError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    // class params
    pub target_class: usize,
    pub num_classes: usize,

    // sampling params
    pub num_points_per_sample: usize,
    pub minimum_points_in_segment: Option<usize>,
    pub threshold_distance_per_class: Vec<f32>,
    pub color_space: ColorSpace,

    // run params
    pub sources: Vec<String>,
    pub output: PathBuf,
    pub seed: Option<u64>,
    pub max_num_threads: u8,
    pub batch_size: usize,
}

impl Config {
    pub fn default_values() -> Config {
        Config {
            target_class: 0,
            num_classes: 1,

            num_points_per_sample: 1024,
            minimum_points_in_segment: None,
            threshold_distance_per_class: vec![0.2],
            color_space: ColorSpace::Rgb,

            sources: Vec::new(),
            output: PathBuf::from("samples.records"),
            seed: None,
            max_num_threads: 0,
            batch_size: 16,
        }
    }

    /// Smallest refined segment that is turned into a sample. Falls back to K.
    pub fn min_points(&self) -> usize {
        self.minimum_points_in_segment
            .unwrap_or(self.num_points_per_sample)
    }

    pub fn target_threshold(&self) -> f32 {
        self.threshold_distance_per_class[self.target_class]
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(SamplerError::Config(msg));
        if self.num_classes == 0 {
            return fail("num_classes must be at least 1".into());
        }
        if self.target_class >= self.num_classes {
            return fail(format!(
                "target_class {} is out of range for {} classes",
                self.target_class, self.num_classes
            ));
        }
        if self.num_points_per_sample == 0 {
            return fail("num_points_per_sample must be at least 1".into());
        }
        if self.threshold_distance_per_class.len() != self.num_classes {
            return fail(format!(
                "expected {} per-class thresholds, got {}",
                self.num_classes,
                self.threshold_distance_per_class.len()
            ));
        }
        if let Some(bad) = self
            .threshold_distance_per_class
            .iter()
            .find(|t| !t.is_finite() || **t < 0.0)
        {
            return fail(format!("threshold {} is not a finite distance", bad));
        }
        // the sampler never sees fewer points than it has to pick
        if self.min_points() < self.num_points_per_sample {
            return fail(format!(
                "minimum_points_in_segment {} is below num_points_per_sample {}",
                self.min_points(),
                self.num_points_per_sample
            ));
        }
        if self.sources.is_empty() {
            return fail("no input sources given".into());
        }
        if self.batch_size == 0 {
            return fail("batch_size must be at least 1".into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_values()
    }
}
