//! Plain-text rendering for the `trinket` CLI.

use std::fmt::Write;
use trinket_model::{LoadedLayouts, SlotLayoutDefinition};
use trinket_storage::{FileReport, FileStatus, LoadOutcome};
use trinket_types::CapabilityRecord;

pub fn render_record(record: &CapabilityRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "version {}, {} group(s), {} item(s)",
        record.version,
        record.groups.len(),
        record.item_count()
    );
    for (key, slots) in &record.groups {
        let _ = writeln!(out, "{key}:");
        for (index, stack) in slots.iter().enumerate() {
            let _ = writeln!(out, "  [{index}] {stack}");
        }
    }
    out
}

pub fn render_reports(reports: &[FileReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let name = report
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| report.path.display().to_string());
        let status = match &report.status {
            FileStatus::Missing => "missing".to_string(),
            FileStatus::Valid {
                digest,
                groups,
                items,
            } => format!("ok       {} ({groups} groups, {items} items)", short(digest)),
            FileStatus::Corrupt { digest, reason } => {
                format!("CORRUPT  {} ({reason})", short(digest))
            }
        };
        let _ = writeln!(out, "{name:<48} {status}");
    }
    out
}

pub fn render_load(outcome: &LoadOutcome) -> String {
    match &outcome.record {
        Some(record) => format!(
            "loaded from {:?}: {} group(s), {} item(s)\n",
            outcome.source,
            record.groups.len(),
            record.item_count()
        ),
        None => "no usable record; owner starts empty\n".to_string(),
    }
}

pub fn render_layouts(loaded: &LoadedLayouts) -> String {
    let mut out = String::new();
    for definition in &loaded.definitions {
        let _ = writeln!(out, "{}", describe(definition));
    }
    for (path, error) in &loaded.failures {
        let _ = writeln!(out, "SKIPPED {}: {}", path.display(), error);
    }
    out
}

fn describe(definition: &SlotLayoutDefinition) -> String {
    let mut line = format!("{} ({} slot(s))", definition.key, definition.slot_count());
    for (label, keys) in [
        ("requires", &definition.requires),
        ("conflicts", &definition.conflicts),
        ("tags", &definition.tags),
        ("linked", &definition.linked_with),
    ] {
        if !keys.is_empty() {
            let _ = write!(line, " {label}=[{}]", keys.join(", "));
        }
    }
    line
}

fn short(digest: &trinket_types::Digest) -> String {
    digest.to_hex()[..12].to_string()
}
