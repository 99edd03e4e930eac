//! Terminal rendering.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use std::path::Path;

use swissknife_core::backend::ToolStatus;
use swissknife_core::inspect::{CleanupReport, FileInfo};
use swissknife_core::pdf::{MergeResult, SplitResult};
use swissknife_core::{BatchResult, ConversionOutcome, Failure, LogEntry, LogOutcome, SummaryResult};

pub fn success(message: impl std::fmt::Display) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn warning(message: impl std::fmt::Display) {
    eprintln!("{} {}", "Warning:".yellow().bold(), message);
}

pub fn failure(failure: &Failure) {
    eprintln!(
        "{} {} {}",
        "✗".red().bold(),
        format!("[{}]", failure.kind).red(),
        failure.message
    );
}

pub fn conversion(source: &Path, outcome: &ConversionOutcome) {
    match outcome {
        ConversionOutcome::Success {
            output_path,
            bytes_written,
            duration_ms,
        } => success(format!(
            "{} → {} ({}, {} ms)",
            source.display(),
            output_path.display(),
            human_bytes(*bytes_written),
            duration_ms
        )),
        ConversionOutcome::Failure { kind, message } => {
            failure(&Failure::new(*kind, message.clone()))
        }
    }
}

pub fn batch(result: &BatchResult) {
    for item in result.items.iter().filter(|i| !i.outcome.is_success()) {
        if let ConversionOutcome::Failure { kind, message } = &item.outcome {
            eprintln!(
                "  {} {} {} {}",
                "✗".red(),
                item.source.display(),
                format!("[{}]", kind).red(),
                message
            );
        }
    }

    let counts = format!(
        "{} attempted, {} succeeded, {} failed",
        result.attempted, result.succeeded, result.failed
    );
    if result.failed == 0 && !result.cancelled {
        success(counts);
    } else {
        println!("{} {}", "!".yellow().bold(), counts);
    }
    if result.cancelled {
        println!("{} batch cancelled before every file was attempted", "!".yellow().bold());
    }
    println!("  batch id: {}", result.batch_id.to_string().dimmed());
}

pub fn merge(result: &MergeResult) {
    success(format!(
        "merged into {} ({} pages, {})",
        result.output_path.display(),
        result.page_count,
        human_bytes(result.bytes_written)
    ));
}

pub fn split(result: &SplitResult) {
    success(format!("{} parts written", result.parts.len()));
    for part in &result.parts {
        println!("  {}", part.display());
    }
}

pub fn summary(result: &SummaryResult) {
    println!("{}", result.summary.trim());
    println!();
    success(format!(
        "{} summary written to {} ({}, {} ms)",
        result.length,
        result.summary_path.display(),
        result.model,
        result.duration_ms
    ));
}

pub fn info(info: &FileInfo) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Property", "Value"]);

    table.add_row(vec!["Path".to_string(), info.path.display().to_string()]);
    table.add_row(vec!["Size".to_string(), human_bytes(info.size_bytes)]);
    if let Some(modified) = info.modified {
        table.add_row(vec![
            "Modified".to_string(),
            modified.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ]);
    }
    table.add_row(vec!["SHA-256".to_string(), info.sha256.clone()]);
    table.add_row(vec![
        "Format".to_string(),
        info.format
            .map(str::to_string)
            .or_else(|| info.extension.clone())
            .unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec![
        "Category".to_string(),
        info.category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    ]);
    if info.may_be_encrypted {
        table.add_row(vec!["Encryption".to_string(), "may be encrypted".to_string()]);
    }
    if let Some(pages) = info.page_count {
        table.add_row(vec!["Pages".to_string(), pages.to_string()]);
    }
    if let Some(media) = &info.media {
        table.add_row(vec![
            "Duration".to_string(),
            format!("{:.1} s", media.duration_secs),
        ]);
        if let (Some(w), Some(h)) = (media.video_width, media.video_height) {
            let codec = media.video_codec.as_deref().unwrap_or("?");
            table.add_row(vec!["Video".to_string(), format!("{} {}x{}", codec, w, h)]);
        }
        if let Some(codec) = &media.audio_codec {
            let rate = media
                .audio_sample_rate
                .map(|r| format!(" {} Hz", r))
                .unwrap_or_default();
            table.add_row(vec!["Audio".to_string(), format!("{}{}", codec, rate)]);
        }
    }
    table.add_row(vec![
        "Converts to".to_string(),
        if info.targets.is_empty() {
            "-".to_string()
        } else {
            info.targets.join(", ")
        },
    ]);

    println!("{table}");
}

pub fn logs(entries: &[LogEntry]) {
    if entries.is_empty() {
        println!("No matching log entries.");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Time", "Operation", "Input", "Output", "Result", "ms"]);

    for entry in entries {
        let result = match &entry.outcome {
            LogOutcome::Success => "ok".to_string(),
            LogOutcome::Failure { kind, message } => {
                format!("{}: {}", kind, truncate(message, 60))
            }
        };
        table.add_row(vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.operation.to_string(),
            entry.input.display().to_string(),
            entry
                .output
                .as_ref()
                .map_or_else(|| "-".to_string(), |p| p.display().to_string()),
            result,
            entry.duration_ms.to_string(),
        ]);
    }

    println!("{table}");
}

pub fn cleanup(report: &CleanupReport) {
    success(format!(
        "removed {} staging directories, reclaimed {}",
        report.removed.len(),
        human_bytes(report.bytes_reclaimed)
    ));
    for path in &report.failed {
        eprintln!("  {} could not remove {}", "!".yellow(), path.display());
    }
}

pub fn tools(version: &str, tools: &[ToolStatus]) {
    println!("swissknife {}", version);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Tool", "Path", "Status"]);
    for tool in tools {
        let status = if tool.available {
            tool.version.clone().unwrap_or_else(|| "available".to_string())
        } else {
            "missing".to_string()
        };
        table.add_row(vec![tool.name.clone(), tool.path.display().to_string(), status]);
    }
    println!("{table}");
}

pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
