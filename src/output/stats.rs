//! Statistics reporting.

use console::style;

use crate::download::RunStats;

/// Print the end-of-run summary.
pub fn print_run_stats(stats: &RunStats) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Summary:").bold());
    println!("  Fetched: {}", style(stats.fetched).green());
    println!("  Skipped: {} (already present)", style(stats.skipped).yellow());
    if stats.failed > 0 {
        println!("  Failed:  {}", style(stats.failed).red());
        for (id, reason) in &stats.failures {
            println!("    {} {}", style(id).dim(), reason);
        }
    }
    println!("  Total:   {}", stats.total());
    println!("{}", style("═".repeat(50)).dim());
}
