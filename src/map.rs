/// Health map and summary rendering

use crate::health::UnitHealth;
use crate::rescue::RescueOutcome;
use std::io::{self, Write};

/// ANSI color codes for the health map
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const BRIGHT_RED: &str = "\x1b[91m";
}

const RULE_WIDTH: usize = 85;

/// Glyph drawn for a unit
pub fn glyph(health: UnitHealth) -> char {
    match health {
        UnitHealth::StableOk => '\u{25A0}',   // ■ - Black square
        UnitHealth::Unstable => '?',
        UnitHealth::StableBad => '\u{2591}',  // ░ - Light shade
    }
}

fn color(health: UnitHealth) -> &'static str {
    match health {
        UnitHealth::StableOk => colors::BRIGHT_WHITE,
        UnitHealth::Unstable => colors::BRIGHT_YELLOW,
        UnitHealth::StableBad => colors::BRIGHT_RED,
    }
}

/// One row of glyphs for `head`, one glyph per track
///
/// `disk_map` is in track-major order with `heads` entries per track.
pub fn head_row(disk_map: &[UnitHealth], heads: usize, head: usize, use_color: bool) -> String {
    let mut row = String::new();
    for &health in disk_map.iter().skip(head).step_by(heads.max(1)) {
        if use_color {
            row.push_str(color(health));
            row.push(glyph(health));
            row.push_str(colors::RESET);
        } else {
            row.push(glyph(health));
        }
    }
    row
}

/// Draw the final dashboard for a finished rescue
pub fn draw_dashboard<W: Write>(out: &mut W, outcome: &RescueOutcome, use_color: bool) -> io::Result<()> {
    let report = &outcome.report;
    let heads = outcome.geometry.heads as usize;

    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "Archiving Summary ({})", report.display_timestamp)?;
    writeln!(
        out,
        "SN: {} | Label: {} | Salvaged: {}/{} Tracks",
        report.metadata.serial,
        report.metadata.label,
        outcome.summary.salvaged_count(),
        outcome.summary.total_units()
    )?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;

    for head in 0..heads {
        writeln!(out, "Head {}: {}", head, head_row(&report.disk_map, heads, head, use_color))?;
    }
    writeln!(
        out,
        "Legend: {} Stable  {} Unstable ({})  {} Unreadable ({})",
        glyph(UnitHealth::StableOk),
        glyph(UnitHealth::Unstable),
        outcome.summary.unstable.len(),
        glyph(UnitHealth::StableBad),
        outcome.summary.stable_bad.len()
    )?;
    writeln!(out, "Final Health: {}%", outcome.summary.health_score())?;

    writeln!(out)?;
    writeln!(out, "Compressed Archive: {}", outcome.archive.file_name())?;
    writeln!(out, "Location: {}", outcome.archive.directory().display())?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    Ok(())
}

/// Print the dashboard to standard output
pub fn print_dashboard(outcome: &RescueOutcome, use_color: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    draw_dashboard(&mut out, outcome, use_color)
}
