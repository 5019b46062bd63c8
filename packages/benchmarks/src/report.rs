//! Console rendering of the strategy comparison.

use std::time::Duration;

use par_sweep::BenchmarkRun;

/// Prints the detailed comparison table across every strategy's sweep.
pub(crate) fn print_comparison(baseline: Duration, runs: &[BenchmarkRun]) {
    println!("\n{}", "=".repeat(72));
    println!("Detailed Performance Comparison");
    println!("{}", "=".repeat(72));
    println!(
        "Sequential baseline: {:.4}s",
        baseline.as_secs_f64()
    );
    println!(
        "{:<22} {:<8} {:>10} {:>9} {:>11}",
        "Strategy", "Workers", "Time (s)", "Speedup", "Efficiency"
    );
    println!("{}", "-".repeat(72));

    for run in runs {
        for row in run.rows() {
            println!(
                "{:<22} {:<8} {:>10.4} {:>9.2} {:>11.2}",
                run.strategy().to_string(),
                row.worker_count(),
                row.duration().as_secs_f64(),
                row.speedup(),
                row.efficiency()
            );
        }

        for failed in run.failed() {
            println!(
                "{:<22} {:<8} {:>10} {:>9} {:>11}",
                run.strategy().to_string(),
                failed.worker_count(),
                "failed",
                "-",
                "-"
            );
        }
    }
}
