use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rgbd_fps_sampler::{
    config::Config,
    io::{json_to_config, write_config_json},
    logger,
    record::{RecordReader, Sample},
    runner,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct FpsSamplerCli {
    /// more log output (-v debug, -vv trace); RUST_LOG overrides it
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sample every frame of the given sources into one record file
    Run {
        /// json config, defaults are used for missing fields
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        target_class: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        output: Option<PathBuf>,

        /// glob patterns, one per source; replace the configured sources
        sources: Vec<String>,
    },
    /// Write a config with default values
    InitConfig { path: PathBuf },
    /// Summarize a sample record file
    Inspect { path: PathBuf },
}

fn run(
    config: Option<PathBuf>,
    target_class: Option<usize>,
    seed: Option<u64>,
    output: Option<PathBuf>,
    sources: Vec<String>,
) -> anyhow::Result<()> {
    let mut config = match config {
        Some(path) => json_to_config(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default_values(),
    };
    if let Some(target_class) = target_class {
        config.target_class = target_class;
    }
    if seed.is_some() {
        config.seed = seed;
    }
    if let Some(output) = output {
        config.output = output;
    }
    if !sources.is_empty() {
        config.sources = sources;
    }

    let summary = runner::run(config).context("sampling run failed")?;
    if summary.samples_emitted == 0 {
        info!("no frame produced a sample");
    }
    Ok(())
}

fn inspect(path: PathBuf) -> anyhow::Result<()> {
    let mut per_seq: BTreeMap<i64, usize> = BTreeMap::new();
    let mut sizes = Vec::new();
    let mut num_points = None;
    for payload in RecordReader::open(&path)? {
        let sample = Sample::from_payload(&payload?)?;
        match num_points {
            None => num_points = Some(sample.num_points()),
            Some(k) if k != sample.num_points() => bail!(
                "seq {} frame {} has {} points, earlier samples have {}",
                sample.seq_id,
                sample.frame_id,
                sample.num_points(),
                k
            ),
            Some(_) => {}
        }
        *per_seq.entry(sample.seq_id).or_default() += 1;
        sizes.push(sample.num_valid_points_in_segment);
    }

    println!("{}: {} samples", path.display(), sizes.len());
    if let Some(k) = num_points {
        println!("points per sample: {}", k);
    }
    if !sizes.is_empty() {
        let mean = sizes.iter().sum::<i64>() as f64 / sizes.len() as f64;
        println!(
            "segment size: min {} mean {:.1} max {}",
            sizes.iter().min().unwrap_or(&0),
            mean,
            sizes.iter().max().unwrap_or(&0)
        );
    }
    for (seq, count) in per_seq {
        println!("  seq {:>4}: {}", seq, count);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = FpsSamplerCli::parse();
    logger::init(cli.verbose)?;
    match cli.command {
        Command::Run {
            config,
            target_class,
            seed,
            output,
            sources,
        } => run(config, target_class, seed, output, sources),
        Command::InitConfig { path } => {
            write_config_json(&path, &Config::default_values())?;
            info!("wrote default config to {}", path.display());
            Ok(())
        }
        Command::Inspect { path } => inspect(path),
    }
}
