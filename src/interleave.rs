//! Per-source sample streams and the random scheduler that merges them.

use crate::{
    error::Result,
    record::Sample,
    sample_pipeline::{Outcome, RunSummary, SamplePipeline},
    source::FrameSource,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::VecDeque;
use tracing::{debug, debug_span};

/// Pulls frames from one source in batches, samples them in parallel and
/// hands out accepted samples one at a time.
pub struct SampleStream<'a> {
    index: usize,
    source: FrameSource,
    pipeline: &'a SamplePipeline,
    seeds: StdRng,
    pending: VecDeque<Sample>,
    summary: RunSummary,
    exhausted: bool,
}

impl<'a> SampleStream<'a> {
    pub fn new(index: usize, source: FrameSource, pipeline: &'a SamplePipeline, seed: u64) -> Self {
        Self {
            index,
            source,
            pipeline,
            seeds: StdRng::seed_from_u64(seed),
            pending: VecDeque::new(),
            summary: RunSummary::default(),
            exhausted: false,
        }
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    fn fill(&mut self) -> Result<()> {
        let batch_size = self.pipeline.config().batch_size;
        // seeds are drawn in read order so results do not depend on scheduling
        let mut batch = Vec::with_capacity(batch_size);
        let mut read_error = None;
        while batch.len() < batch_size {
            match self.source.next() {
                Some(Ok(payload)) => batch.push((payload, self.seeds.gen::<u64>())),
                Some(Err(e)) => {
                    // frames read before the failure still count
                    read_error = Some(e);
                    break;
                }
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }
        if !batch.is_empty() {
            self.process(&batch);
        }
        match read_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn process(&mut self, batch: &[(Vec<u8>, u64)]) {
        let _span = debug_span!("batch", source = self.index, frames = batch.len()).entered();
        let pipeline = self.pipeline;
        let outcomes: Vec<_> = batch
            .par_iter()
            .map(|(payload, seed)| {
                pipeline.process_payload(payload, &mut StdRng::seed_from_u64(*seed))
            })
            .collect();

        for (seq_id, outcome) in outcomes {
            self.summary.record(seq_id, &outcome);
            if let Ok(Outcome::Accepted(sample)) = outcome {
                self.pending.push_back(sample);
            }
        }
        debug!(
            "source {}: batch of {} frames, {} samples pending",
            self.index,
            batch.len(),
            self.pending.len()
        );
    }

    /// Next accepted sample, `None` once the source is drained.
    pub fn next_sample(&mut self) -> Result<Option<Sample>> {
        while self.pending.is_empty() && !self.exhausted {
            self.fill()?;
        }
        Ok(self.pending.pop_front())
    }
}

/// Picks a live stream uniformly at random for every emitted sample.
pub struct Interleave<'a> {
    streams: Vec<SampleStream<'a>>,
    live: Vec<usize>,
    rng: StdRng,
}

impl<'a> Interleave<'a> {
    pub fn new(streams: Vec<SampleStream<'a>>, seed: u64) -> Self {
        let live = (0..streams.len()).collect();
        Self {
            streams,
            live,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn summary(&self) -> RunSummary {
        let mut total = RunSummary::default();
        for stream in &self.streams {
            total.merge(stream.summary());
        }
        total
    }
}

impl Iterator for Interleave<'_> {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.live.is_empty() {
            let slot = self.rng.gen_range(0..self.live.len());
            let stream = &mut self.streams[self.live[slot]];
            match stream.next_sample() {
                Ok(Some(sample)) => return Some(Ok(sample)),
                Ok(None) => {
                    debug!("source {} exhausted", stream.index);
                    self.live.swap_remove(slot);
                }
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
