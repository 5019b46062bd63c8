//! Compares the four parallel execution strategies over the image transform
//! pipeline: sequential baseline first, then a worker-count sweep per
//! strategy, then a comparison table and a JSON report for downstream
//! renderers.

use std::env;
use std::error::Error;
use std::fs::File;
use std::io;
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use argh::FromArgs;
use new_zealand::nz;
use par_sweep::{
    BenchmarkRun, OutputSink, Strategy, Sweep, SweepConfig, WorkerCommand, measure, units_from,
};
use pixel_pipeline::PixelProcessor;
use serde::Serialize;
use walkdir::WalkDir;

mod report;

/// Benchmark the image transform pipeline across parallel execution
/// strategies.
#[derive(FromArgs)]
struct Args {
    /// directory containing the input images
    #[argh(option)]
    images: PathBuf,

    /// directory receiving transformed images and the report
    #[argh(option, default = "PathBuf::from(\"output\")")]
    output: PathBuf,

    /// number of retained sequential baseline trials
    #[argh(option, default = "3")]
    trials: usize,

    /// worker count to include in the sweep; repeatable (default: 1 2 4 8)
    #[argh(option, short = 'w')]
    worker_count: Vec<usize>,
}

/// Everything a reporting collaborator needs: the workload size, the shared
/// sequential baseline and one benchmark run per strategy.
#[derive(Debug, Serialize)]
struct AnalysisReport {
    image_count: usize,
    baseline: Duration,
    runs: Vec<BenchmarkRun>,
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let items = discover_images(&args.images);
    if items.is_empty() {
        return Err(format!("no images found under '{}'", args.images.display()).into());
    }

    let units = units_from(items);
    println!("Benchmarking {} images from {}", units.len(), args.images.display());

    let trials = NonZero::new(args.trials).ok_or("at least one baseline trial is required")?;
    let worker_counts = worker_counts(&args.worker_count)?;
    let processor = PixelProcessor;
    let output_base = args.output.display().to_string();

    // One sequential baseline, shared by every strategy, so all speedups
    // are comparable in absolute terms.
    let baseline = measure(
        &units,
        &processor,
        &OutputSink::new(format!("{output_base}/sequential")),
        trials,
    )?;
    println!(
        "Sequential baseline time: {:.4} seconds (median of {} trials)",
        baseline.duration().as_secs_f64(),
        baseline.samples().len()
    );

    let worker = WorkerCommand::new(sibling_binary("pixel_worker")?);

    let mut runs = Vec::with_capacity(Strategy::all().len());

    for &strategy in Strategy::all() {
        println!("\n=== {strategy} ===");

        let config = SweepConfig::new(strategy)
            .with_worker_counts(worker_counts.clone())
            .with_baseline_trials(trials)
            .with_sink_base(output_base.as_str())
            .with_worker(worker.clone());

        let run = Sweep::new(config)
            .with_sequential_baseline(baseline.duration())
            .execute(&units, &processor)?;

        for row in run.rows() {
            println!(
                "{strategy} ({} workers): {:.4}s, Speedup: {:.2}, Efficiency: {:.2}",
                row.worker_count(),
                row.duration().as_secs_f64(),
                row.speedup(),
                row.efficiency()
            );
        }
        for failed in run.failed() {
            println!(
                "{strategy} ({} workers): FAILED - {}",
                failed.worker_count(),
                failed.cause()
            );
        }

        runs.push(run);
    }

    report::print_comparison(baseline.duration(), &runs);

    let report = AnalysisReport {
        image_count: units.len(),
        baseline: baseline.duration(),
        runs,
    };
    let report_path = args.output.join("performance_results.json");
    serde_json::to_writer_pretty(File::create(&report_path)?, &report)?;
    println!("\nResults saved to {}", report_path.display());

    Ok(())
}

/// Collects the image files under the root, in a stable order.
fn discover_images(root: &Path) -> Vec<String> {
    let mut items: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|extension| extension.to_str())
                .is_some_and(|extension| {
                    matches!(
                        extension.to_ascii_lowercase().as_str(),
                        "png" | "jpg" | "jpeg"
                    )
                })
        })
        .map(|entry| entry.path().display().to_string())
        .collect();

    items.sort();
    items
}

fn worker_counts(requested: &[usize]) -> Result<Vec<NonZero<usize>>, Box<dyn Error>> {
    if requested.is_empty() {
        return Ok(vec![nz!(1), nz!(2), nz!(4), nz!(8)]);
    }

    requested
        .iter()
        .map(|&count| NonZero::new(count).ok_or_else(|| "worker counts must be positive".into()))
        .collect()
}

/// Locates a binary installed next to this one - the worker binaries are
/// built into the same target directory.
fn sibling_binary(name: &str) -> io::Result<PathBuf> {
    let mut path = env::current_exe()?;
    path.set_file_name(format!("{name}{}", env::consts::EXE_SUFFIX));
    Ok(path)
}
