use crate::{
    config::Config,
    error::{Result, SamplerError},
    interleave::{Interleave, SampleStream},
    record::{FramedRecordWriter, RecordWriter},
    sample_pipeline::{RunSummary, SamplePipeline},
    source::{open_sources, FrameSource},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{error, info};

fn aborted(summary: &RunSummary, e: SamplerError) -> SamplerError {
    error!("run aborted: {}", e);
    summary.log();
    e
}

/// Samples every configured source into the configured output file.
pub fn run(config: Config) -> Result<RunSummary> {
    let opened = config.validate().and_then(|()| {
        let sources = open_sources(&config.sources)?;
        let writer = FramedRecordWriter::create(&config.output)?;
        Ok((sources, writer))
    });
    let (sources, mut writer) = opened.map_err(|e| aborted(&RunSummary::default(), e))?;
    info!("writing samples to {}", config.output.display());
    run_with(config, sources, &mut writer)
}

/// Same as [`run`] with caller-supplied sources and sink.
pub fn run_with<W: RecordWriter + Send>(
    config: Config,
    sources: Vec<FrameSource>,
    writer: &mut W,
) -> Result<RunSummary> {
    let pipeline = SamplePipeline::new(config).map_err(|e| aborted(&RunSummary::default(), e))?;
    let config = pipeline.config();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_num_threads as usize)
        .build()
        .map_err(|e| aborted(&RunSummary::default(), e.into()))?;

    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(
        "target class {}, {} points per sample, floor {}, threshold {} m, seed {}",
        config.target_class,
        config.num_points_per_sample,
        config.min_points(),
        config.target_threshold(),
        seed
    );

    let mut seeds = StdRng::seed_from_u64(seed);
    let streams: Vec<SampleStream> = sources
        .into_iter()
        .enumerate()
        .map(|(i, source)| SampleStream::new(i, source, &pipeline, seeds.gen()))
        .collect();
    let mut merged = Interleave::new(streams, seeds.gen());

    let mut written = 0;
    let result = pool.install(|| -> Result<()> {
        for sample in merged.by_ref() {
            writer.write_record(&sample?.to_payload()?)?;
            written += 1;
        }
        writer.finish()
    });

    let mut summary = merged.summary();
    summary.samples_emitted = written;
    if let Err(e) = result {
        return Err(aborted(&summary, e));
    }
    summary.log();
    Ok(summary)
}
