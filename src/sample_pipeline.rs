use crate::{
    config,
    error::{FrameError, SamplerError},
    farthest_point::farthest_point_sample,
    frame::Frame,
    outlier,
    projection::PointCloud,
    record::Sample,
    segment,
};
use rand::Rng;
use std::fmt;
use tracing::{debug, error, info, warn};

/// What became of one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted(Sample),
    TargetAbsent,
    EmptySegment,
    InsufficientPoints(usize),
}

/// Counters for a run, or for one source within it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_read: usize,
    pub target_absent: usize,
    pub malformed_frames: usize,
    pub errored_frames: usize,
    pub empty_segments: usize,
    pub insufficient_points: usize,
    pub samples_accepted: usize,
    pub samples_emitted: usize,
}

impl RunSummary {
    pub fn record(&mut self, seq_id: Option<i64>, outcome: &Result<Outcome, FrameError>) {
        self.frames_read += 1;
        match outcome {
            Ok(Outcome::Accepted(_)) => self.samples_accepted += 1,
            Ok(Outcome::TargetAbsent) => self.target_absent += 1,
            Ok(Outcome::EmptySegment) => self.empty_segments += 1,
            Ok(Outcome::InsufficientPoints(_)) => self.insufficient_points += 1,
            Err(FrameError::DegenerateCentroid) => {
                error!("frame aborted, seq {:?}: segment centroid of an empty mask", seq_id);
                self.errored_frames += 1;
            }
            Err(e) => {
                warn!("skipping malformed frame: {}", e);
                self.malformed_frames += 1;
            }
        }
    }

    pub fn merge(&mut self, other: &RunSummary) {
        self.frames_read += other.frames_read;
        self.target_absent += other.target_absent;
        self.malformed_frames += other.malformed_frames;
        self.errored_frames += other.errored_frames;
        self.empty_segments += other.empty_segments;
        self.insufficient_points += other.insufficient_points;
        self.samples_accepted += other.samples_accepted;
        self.samples_emitted += other.samples_emitted;
    }

    pub fn log(&self) {
        info!("{}", self);
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames read {}, target absent {}, malformed {}, errored {}, \
             empty segments {}, too few points {}, samples emitted {}",
            self.frames_read,
            self.target_absent,
            self.malformed_frames,
            self.errored_frames,
            self.empty_segments,
            self.insufficient_points,
            self.samples_emitted
        )
    }
}

/// Turns frames into samples of the configured target class.
pub struct SamplePipeline {
    config: config::Config,
}

impl SamplePipeline {
    /// Refuses configurations that `Config::validate` rejects, so a built
    /// pipeline always has a threshold for its target class and a floor of at
    /// least K points.
    pub fn new(config: config::Config) -> Result<SamplePipeline, SamplerError> {
        config.validate()?;
        Ok(SamplePipeline { config })
    }

    pub fn config(&self) -> &config::Config {
        &self.config
    }

    pub fn process_payload<R: Rng>(
        &self,
        payload: &[u8],
        rng: &mut R,
    ) -> (Option<i64>, Result<Outcome, FrameError>) {
        match Frame::decode(payload, self.config.num_classes) {
            Ok(frame) => (Some(frame.seq_id), self.process_frame(&frame, rng)),
            Err(e) => (None, Err(e)),
        }
    }

    pub fn process_frame<R: Rng>(
        &self,
        frame: &Frame,
        rng: &mut R,
    ) -> Result<Outcome, FrameError> {
        let class_id = self.config.target_class;
        let k = self.config.num_points_per_sample;

        // reject frames without the target class
        if !frame.has_class(class_id) {
            return Ok(Outcome::TargetAbsent);
        }

        // project
        let cloud = PointCloud::from_frame(frame, self.config.color_space);

        // segment
        let mask = segment::extract_mask(&frame.label, class_id, &cloud.depth_valid);
        if mask.count() == 0 {
            return Ok(Outcome::EmptySegment);
        }

        // distance filter
        let mask = outlier::refine(&cloud.xyz, &mask, self.config.target_threshold())?;
        let segment_size = mask.count();
        if segment_size == 0 {
            return Ok(Outcome::EmptySegment);
        }
        if segment_size < self.config.min_points() {
            debug!(
                "seq {} frame {} class {}: {} points after filtering, need {}",
                frame.seq_id,
                frame.frame_id,
                class_id,
                segment_size,
                self.config.min_points()
            );
            return Ok(Outcome::InsufficientPoints(segment_size));
        }

        // sample
        debug!(
            "seq {} frame {} class {} segment_size {}",
            frame.seq_id, frame.frame_id, class_id, segment_size
        );
        let points = mask.select(&cloud.xyz);
        let colors = mask.select(&cloud.rgb);
        let picked = farthest_point_sample(&points, k, rng);

        Ok(Outcome::Accepted(Sample {
            class_id: class_id as i64,
            seq_id: frame.seq_id,
            frame_id: frame.frame_id,
            quaternion: frame.quaternions[class_id],
            translation: frame.translations[class_id],
            num_valid_points_in_segment: segment_size as i64,
            xyz: picked.iter().flat_map(|i| points[*i].to_array()).collect(),
            rgb: picked.iter().flat_map(|i| colors[*i]).collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Intrinsics;
    use rand::{rngs::StdRng, SeedableRng};

    const W: usize = 50;
    const H: usize = 50;

    /// A frame whose first `segment` pixels carry label 1 at spread-out depths.
    fn frame_with_segment(segment: usize) -> Frame {
        let pixels = H * W;
        Frame {
            height: H,
            width: W,
            image: (0..pixels * 3).map(|i| (i % 251) as u8).collect(),
            depth: (0..pixels).map(|i| 1000 + (i % 7) as u16).collect(),
            label: (0..pixels).map(|i| (i < segment) as u8).collect(),
            intrinsics: Intrinsics {
                fx: 500.0,
                fy: 500.0,
                cx: 25.0,
                cy: 25.0,
            },
            depth_scaling_factor: 1000.0,
            class_one_hot: vec![1],
            quaternions: vec![[0.5, 0.5, 0.5, 0.5]],
            translations: vec![[0.1, 0.2, 1.0]],
            seq_id: 48,
            frame_id: 7,
        }
    }

    fn pipeline(k: usize, min: Option<usize>) -> SamplePipeline {
        SamplePipeline::new(config::Config {
            num_points_per_sample: k,
            minimum_points_in_segment: min,
            threshold_distance_per_class: vec![10.0],
            sources: vec!["unused".into()],
            ..config::Config::default_values()
        })
        .unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(5)
    }

    #[test]
    fn accepted_sample_carries_metadata() {
        let outcome = pipeline(1024, None)
            .process_frame(&frame_with_segment(2000), &mut rng())
            .unwrap();
        let Outcome::Accepted(sample) = outcome else {
            panic!("expected a sample");
        };
        assert_eq!(sample.num_points(), 1024);
        assert_eq!(sample.rgb.len(), 1024 * 3);
        assert_eq!(sample.num_valid_points_in_segment, 2000);
        assert_eq!(sample.class_id, 0);
        assert_eq!((sample.seq_id, sample.frame_id), (48, 7));
        assert_eq!(sample.quaternion, [0.5, 0.5, 0.5, 0.5]);
        assert_eq!(sample.translation, [0.1, 0.2, 1.0]);
        assert!(sample.rgb.iter().all(|c| (0.0..=1.0).contains(c)));
    }

    #[test]
    fn absent_target_is_skipped() {
        let mut frame = frame_with_segment(2000);
        frame.class_one_hot = vec![0];
        let outcome = pipeline(16, None).process_frame(&frame, &mut rng()).unwrap();
        assert_eq!(outcome, Outcome::TargetAbsent);
    }

    #[test]
    fn unlabelled_frame_is_empty() {
        let outcome = pipeline(16, None)
            .process_frame(&frame_with_segment(0), &mut rng())
            .unwrap();
        assert_eq!(outcome, Outcome::EmptySegment);
    }

    #[test]
    fn invalid_depth_is_excluded() {
        let mut frame = frame_with_segment(20);
        for d in frame.depth.iter_mut().take(5) {
            *d = 0;
        }
        let outcome = pipeline(8, None).process_frame(&frame, &mut rng()).unwrap();
        let Outcome::Accepted(sample) = outcome else {
            panic!("expected a sample");
        };
        assert_eq!(sample.num_valid_points_in_segment, 15);
    }

    #[test]
    fn floor_is_inclusive() {
        let p = pipeline(16, Some(100));
        assert_eq!(
            p.process_frame(&frame_with_segment(99), &mut rng()).unwrap(),
            Outcome::InsufficientPoints(99)
        );
        assert!(matches!(
            p.process_frame(&frame_with_segment(100), &mut rng()).unwrap(),
            Outcome::Accepted(_)
        ));
    }

    #[test]
    fn tight_threshold_empties_segment() {
        let mut p = pipeline(4, None);
        p.config.threshold_distance_per_class = vec![0.0];
        // the segment spans more than one pixel, so nothing sits on the centroid
        let outcome = p.process_frame(&frame_with_segment(40), &mut rng()).unwrap();
        assert_eq!(outcome, Outcome::EmptySegment);
    }

    #[test]
    fn inconsistent_config_is_refused() {
        let missing_threshold = config::Config {
            num_classes: 3,
            threshold_distance_per_class: vec![1.0],
            sources: vec!["unused".into()],
            ..config::Config::default_values()
        };
        assert!(matches!(
            SamplePipeline::new(missing_threshold),
            Err(SamplerError::Config(_))
        ));

        let floor_below_k = config::Config {
            num_points_per_sample: 64,
            minimum_points_in_segment: Some(10),
            sources: vec!["unused".into()],
            ..config::Config::default_values()
        };
        assert!(matches!(
            SamplePipeline::new(floor_below_k),
            Err(SamplerError::Config(_))
        ));
    }

    #[test]
    fn same_seed_same_sample() {
        let p = pipeline(64, None);
        let frame = frame_with_segment(500);
        let a = p.process_frame(&frame, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = p.process_frame(&frame, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn summary_counts_each_outcome() {
        let mut summary = RunSummary::default();
        summary.record(Some(1), &Ok(Outcome::TargetAbsent));
        summary.record(Some(1), &Ok(Outcome::EmptySegment));
        summary.record(Some(1), &Ok(Outcome::InsufficientPoints(3)));
        summary.record(Some(1), &Err(FrameError::DegenerateCentroid));
        summary.record(None, &Err(FrameError::UnsupportedChannels(1)));
        assert_eq!(summary.frames_read, 5);
        assert_eq!(summary.target_absent, 1);
        assert_eq!(summary.empty_segments, 1);
        assert_eq!(summary.insufficient_points, 1);
        assert_eq!(summary.errored_frames, 1);
        assert_eq!(summary.malformed_frames, 1);

        let mut total = RunSummary::default();
        total.merge(&summary);
        total.merge(&summary);
        assert_eq!(total.frames_read, 10);
    }
}
