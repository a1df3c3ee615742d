use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::catalog::{self, Section};
use crate::collector::{AuditResult, ProbeOutcome};

/// Rendered in place of any field without data.
pub const PLACEHOLDER: &str = "-";

const RULE: &str = "========================================";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub(super) fn render(result: &AuditResult, exported_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    push_line(&mut out, RULE);
    push_line(&mut out, "HOST AUDIT REPORT");
    push_line(&mut out, &format!("Host: {}", result.host_id()));
    push_line(
        &mut out,
        &format!("Collected: {}", result.collected_at().format(TIME_FORMAT)),
    );
    push_line(
        &mut out,
        &format!("Exported: {}", exported_at.format(TIME_FORMAT)),
    );
    push_line(&mut out, RULE);

    for section in Section::ALL {
        let rows: Vec<_> = catalog::in_section(section)
            .filter_map(|spec| result.get(spec.key).map(|o| (spec.label, o)))
            .collect();
        if rows.is_empty() {
            continue;
        }
        out.push('\n');
        push_line(&mut out, &format!("[ {} ]", section.title()));
        for (label, outcome) in rows {
            push_field(&mut out, label, outcome);
        }
    }

    let extras: Vec<_> = result
        .outcomes()
        .filter(|(name, _)| catalog::lookup(name).is_none())
        .collect();
    if !extras.is_empty() {
        out.push('\n');
        push_line(&mut out, "[ OTHER ]");
        for (name, outcome) in extras {
            push_field(&mut out, name, outcome);
        }
    }

    out.push('\n');
    push_line(&mut out, RULE);
    push_line(
        &mut out,
        &format!("Generated by host-audit {}", env!("CARGO_PKG_VERSION")),
    );
    out
}

fn push_field(out: &mut String, label: &str, outcome: &ProbeOutcome) {
    match outcome.display_value() {
        Some(value) if value.contains('\n') => {
            let _ = writeln!(out, "{}:", label);
            for line in value.lines() {
                let _ = writeln!(out, "  {}", line.trim_end());
            }
        }
        Some(value) if value.is_empty() => {
            let _ = writeln!(out, "{}:", label);
        }
        Some(value) => {
            let _ = writeln!(out, "{}: {}", label, value.trim());
        }
        None => {
            let _ = writeln!(out, "{}: {}", label, PLACEHOLDER);
        }
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}
