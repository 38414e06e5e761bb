//! The report accumulator (spec.md §3, §5): an append-only sink that
//! sub-checkers push [`Finding`]s into, and which produces a deterministically
//! ordered [`Report`] once the pipeline finishes.
//!
//! Grounded on the teacher's builder-then-freeze pattern (an open,
//! mutable accumulator that produces an immutable result), generalized from
//! "build an `Epub`" to "build a `Report`". The severity-override and
//! suppression logic is new: there is no analogue in the teacher because
//! reading an ebook never needed a policy layer over diagnostics.

use crate::catalog::{CatalogEntry, CheckId, Severity};
use crate::location::Location;
use serde::Serialize;
use std::fmt::Write as _;

/// One conformance finding: a check id, the severity it was actually
/// emitted at (after any override), where it was found, and a rendered
/// message.
#[derive(Clone, Debug, Serialize)]
pub struct Finding {
    pub id: CheckId,
    pub severity: Severity,
    pub location: Location,
    pub message: String,
}

/// Renders a catalog message template by replacing `{0}`, `{1}`, ... with
/// the given arguments, in order. Unknown indices are left as-is rather
/// than panicking — a checker bug should not crash the pipeline over a
/// cosmetic message.
fn render(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '{' {
            if let Some(end) = template[i..].find('}') {
                let digits = &template[i + 1..i + end];
                if let Ok(index) = digits.parse::<usize>() {
                    if let Some(arg) = args.get(index) {
                        out.push_str(arg);
                    }
                    for _ in 0..end {
                        chars.next();
                    }
                    continue;
                }
            }
        }
        let _ = write!(out, "{c}");
    }

    out
}

/// The accumulator passed to every sub-checker. Not `Clone`: there is
/// exactly one report per validation run, built up by reference as the
/// orchestrator drives each stage (spec.md §4.M).
#[derive(Debug, Default)]
pub struct Report {
    findings: Vec<Finding>,
    overrides: Vec<(CheckId, Severity)>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a severity override (from [`Options::feature_overrides`]).
    /// Per spec.md §7, an override may only make a check *stricter*; a
    /// request to loosen a check's severity below its catalog default is
    /// itself rejected rather than silently honored.
    pub(crate) fn set_override(&mut self, id: CheckId, severity: Severity) {
        let default = id.default_severity();
        if severity <= default {
            self.overrides.push((id, severity));
        }
    }

    fn resolve_severity(&self, entry: &CatalogEntry) -> Severity {
        self.overrides
            .iter()
            .find(|(id, _)| *id == entry.id)
            .map(|(_, severity)| *severity)
            .unwrap_or(entry.default_severity)
    }

    /// Emits a finding at `location`, formatting the catalog message
    /// template with `args`. A check that is disabled or `wontfix` in the
    /// catalog is silently dropped; a check whose resolved severity is
    /// [`Severity::Suppressed`] is recorded but excluded from the
    /// fatal/error/warning counters used for pass/fail decisions.
    pub fn emit(&mut self, id: CheckId, location: Location, args: &[&str]) {
        let entry = id.entry();
        if !entry.enabled {
            return;
        }

        let severity = self.resolve_severity(entry);
        let message = render(entry.message, args);

        self.findings.push(Finding {
            id,
            severity,
            location,
            message,
        });
    }

    /// Shortcut for checks with no formatting arguments.
    pub fn emit_plain(&mut self, id: CheckId, location: Location) {
        self.emit(id, location, &[]);
    }

    pub fn has_fatal(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Fatal)
    }

    pub(crate) fn len(&self) -> usize {
        self.findings.len()
    }

    /// Sorts findings per spec.md §5 (path, then position, then insertion
    /// order) and computes per-severity counters. `sort_by` is used
    /// rather than `sort_unstable_by` specifically to preserve insertion
    /// order among findings that tie on `(path, position)`.
    pub fn finish(mut self) -> FinishedReport {
        self.findings
            .sort_by(|a, b| a.location.cmp(&b.location));

        let mut counts = SeverityCounts::default();
        for finding in &self.findings {
            match finding.severity {
                Severity::Fatal => counts.fatal += 1,
                Severity::Error => counts.error += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Usage => counts.usage += 1,
                Severity::Info => counts.info += 1,
                Severity::Suppressed => counts.suppressed += 1,
            }
        }

        FinishedReport {
            findings: self.findings,
            counts,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Serialize)]
pub struct SeverityCounts {
    pub fatal: u32,
    pub error: u32,
    pub warning: u32,
    pub usage: u32,
    pub info: u32,
    pub suppressed: u32,
}

impl SeverityCounts {
    /// Whether the EPUB under test conforms: no fatal or error-severity
    /// findings (spec.md §3 "A report with zero FATAL/ERROR findings and
    /// any number of WARNING/USAGE/INFO findings represents a conforming
    /// EPUB").
    pub fn is_conforming(&self) -> bool {
        self.fatal == 0 && self.error == 0
    }
}

/// The immutable result of a validation run: findings ordered per
/// spec.md §5, plus the severity counters used to decide conformance.
#[derive(Debug, Serialize)]
pub struct FinishedReport {
    pub findings: Vec<Finding>,
    pub counts: SeverityCounts,
}

impl FinishedReport {
    pub fn is_conforming(&self) -> bool {
        self.counts.is_conforming()
    }
}
