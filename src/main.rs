//! # bitonic-gen CLI
//!
//! Generates the bitonic sort routine plans for the selected vector ISAs and
//! writes one listing per (ISA, type) unit plus one per ISA.

use anyhow::{bail, Context, Result};
use bitonic_gen::constants::{
    DEFAULT_BREAK_INLINE, DEFAULT_OUTPUT_DIR, DEFAULT_UNROLL_BITONIC_SORTERS, LISTING_EXTENSION,
};
use bitonic_gen::{Driver, GeneratorConfig, ListingSink, VectorIsa};
use clap::Parser;
use log::info;
use std::path::PathBuf;

/// Generator for SIMD bitonic sort networks
#[derive(Parser)]
#[command(name = "bitonic-gen")]
#[command(about = "Generates bitonic sort/merge networks for SIMD vector ISAs")]
#[command(version)]
struct Cli {
    /// Vector ISAs to generate for (AVX2, AVX512, NEON)
    #[arg(long = "vector-isa", num_args = 1.., value_name = "ISA")]
    vector_isa: Vec<VectorIsa>,

    /// Generate for every known ISA (the default when no ISA is given)
    #[arg(long, conflicts_with = "vector_isa")]
    all: bool,

    /// Routines whose width is a multiple of this are not force-inlined
    #[arg(long, default_value_t = DEFAULT_BREAK_INLINE)]
    break_inline: usize,

    /// Width below which routines are unrolled into their callers
    #[arg(long, default_value_t = DEFAULT_UNROLL_BITONIC_SORTERS)]
    unroll: usize,

    /// Largest compounded width (defaults to the ISA ceiling)
    #[arg(long)]
    max_vectors: Option<usize>,

    /// Per-ISA merger ceiling, e.g. AVX2=4
    #[arg(long = "merge-ceiling", value_name = "ISA=N", value_parser = parse_merge_ceiling)]
    merge_ceiling: Vec<(VectorIsa, usize)>,

    /// Directory the listings are written to
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Worker threads used for planning (defaults to the CPU count)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Execute every generated plan in the simulator before writing
    #[arg(long)]
    verify: bool,

    /// Plan and report without writing files
    #[arg(long)]
    dry_run: bool,
}

fn parse_merge_ceiling(s: &str) -> Result<(VectorIsa, usize), String> {
    let (isa, width) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ISA=N, got '{}'", s))?;
    let isa = isa.parse::<VectorIsa>().map_err(|e| e.to_string())?;
    let width = width
        .parse::<usize>()
        .map_err(|e| format!("invalid merger width '{}': {}", width, e))?;
    Ok((isa, width))
}

impl Cli {
    fn config(&self) -> GeneratorConfig {
        let mut config = if self.all || self.vector_isa.is_empty() {
            GeneratorConfig::default()
        } else {
            GeneratorConfig::for_isas(&self.vector_isa)
        };
        config = config
            .with_break_inline(self.break_inline)
            .with_unroll_bitonic_sorters(self.unroll);
        if let Some(max) = self.max_vectors {
            config = config.with_max_bitonic_sort_vectors(max);
        }
        for &(isa, width) in &self.merge_ceiling {
            config = config.with_largest_merge_variant(isa, width);
        }
        if let Some(jobs) = self.jobs {
            config = config.with_jobs(jobs);
        }
        config
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let driver = Driver::new(cli.config()).context("Invalid configuration")?;

    let plans = driver.plan_all().context("Failed to plan routines")?;
    if cli.verify {
        let reports = driver.verify_all(&plans).context("Plan verification failed")?;
        info!("Verified {} units", reports.len());
    }
    if cli.dry_run {
        for plan in &plans {
            println!("{}: {} routines", plan.unit_name(), plan.routines.len());
        }
        return Ok(());
    }

    let summary = driver
        .write_plans_with(&plans, &cli.output_dir, LISTING_EXTENSION, ListingSink::new)
        .with_context(|| format!("Failed to generate into {}", cli.output_dir.display()))?;

    info!("Wrote {} files to {}", summary.written.len(), cli.output_dir.display());
    if !summary.is_success() {
        for (unit, err) in &summary.failures {
            eprintln!("{}: {}", unit, err);
        }
        bail!("{} units failed to emit", summary.failures.len());
    }
    Ok(())
}
