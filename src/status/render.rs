/*!
 * Status Rendering
 * Text panel for the live status view
 */

use crate::core::limits::STATUS_BAR_CELLS;
use crate::core::types::Megabytes;
use crate::memory::MemoryPressure;
use crate::monitoring::Event;
use crate::process::SystemSnapshot;
use std::fmt::Write;

const RULE: &str = "+------------------------------------------------------+";
const RESET: &str = "\u{1B}[0m";

/// ANSI colour for a pressure level
fn pressure_colour(pressure: MemoryPressure) -> &'static str {
    match pressure {
        MemoryPressure::Low => "\u{1B}[32m",
        MemoryPressure::Medium => "\u{1B}[33m",
        MemoryPressure::High | MemoryPressure::Critical => "\u{1B}[31m",
    }
}

/// `[#####               ] 25%` with one cell per 5%
pub fn usage_bar(used: Megabytes, total: Megabytes) -> String {
    let percent = if total == 0 {
        0
    } else {
        (used.min(total) * 100 / total) as usize
    };
    let filled = percent * STATUS_BAR_CELLS / 100;

    format!(
        "[{}{}] {}%",
        "#".repeat(filled),
        " ".repeat(STATUS_BAR_CELLS - filled),
        percent
    )
}

/// Render the full panel
pub fn render(snapshot: &SystemSnapshot, events: &[Event]) -> String {
    let mut out = String::new();
    let memory = &snapshot.memory;

    // Writing to a String cannot fail
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "| MEMORY ADMISSION SIMULATOR                           |");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(
        out,
        "| RAM Total: {} MB | RAM Available: {} MB",
        memory.total_mb, memory.available_mb
    );
    let _ = writeln!(
        out,
        "| RAM Used: {} MB  | {}{}{RESET}",
        memory.used_mb,
        pressure_colour(memory.memory_pressure()),
        usage_bar(memory.used_mb, memory.total_mb)
    );
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "| RUNNING PROCESSES ({})", snapshot.running.len());
    let _ = writeln!(out, "{RULE}");
    if snapshot.running.is_empty() {
        let _ = writeln!(out, "|   (none)");
    }
    for p in &snapshot.running {
        let _ = writeln!(out, "|   - {} (PID: {})", p.name, p.pid);
        let _ = writeln!(
            out,
            "|     Memory: {} MB | Duration: {}s | Remaining: {}s",
            p.memory_mb, p.duration_secs, p.remaining_secs
        );
    }
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "| WAITING QUEUE ({})", snapshot.waiting.len());
    let _ = writeln!(out, "{RULE}");
    if snapshot.waiting.is_empty() {
        let _ = writeln!(out, "|   (none)");
    }
    for p in &snapshot.waiting {
        let _ = writeln!(
            out,
            "|   - {} (PID: {}) -> Memory required: {} MB",
            p.name, p.pid, p.memory_mb
        );
    }
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "| RECENT EVENTS                                        |");
    let _ = writeln!(out, "{RULE}");
    if events.is_empty() {
        let _ = writeln!(out, "|   (none)");
    }
    for event in events {
        let _ = writeln!(out, "| [{}] {}", event.unix_secs(), event);
    }
    let _ = writeln!(out, "{RULE}");

    out
}
