//! Terminal dashboard, redrawn between trades when `print_on` is set.

use basis_execution::VenueHandle;
use std::sync::Arc;

/// Clear the terminal and print per-venue positions and run P&L.
pub fn print_results(venues: &[Arc<VenueHandle>], pl: f64) {
    // Clear screen, cursor home.
    print!("\x1b[2J\x1b[H");
    println!("  {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("        Positions:");
    println!("--------------------------");
    for venue in venues {
        println!("{:<13} {:>10.2}", venue.to_string(), venue.position());
    }
    println!("--------------------------");
    println!("\nRun P&L: ${pl:.2}");
}
