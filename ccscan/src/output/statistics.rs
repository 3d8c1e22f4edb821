// SPDX-License-Identifier: GPL-3.0-or-later

//! Counters of a scan run.
//!
//! The drivers and the command processor update their fields as lines and
//! entries flow through. At the end of the run the counters are logged and
//! written into the report.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Statistics collected while scanning one input.
#[derive(Debug, Default)]
pub struct ScanStatistics {
    /// Compilation database entries or build output lines read.
    pub lines_read: AtomicUsize,

    /// Lines where a known compiler was detected.
    pub commands_recognized: AtomicUsize,

    /// Lines where no detector matched.
    pub lines_without_detector: AtomicUsize,

    /// Compilation database entries skipped as malformed.
    pub malformed_entries: AtomicUsize,

    /// Commands skipped because their source is outside of the project.
    pub outside_of_project: AtomicUsize,

    /// Settings entries extracted from the recognized commands.
    pub settings_entries: AtomicUsize,
}

impl ScanStatistics {
    /// Creates a new instance wrapped in an `Arc` for sharing.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn increment(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a copy of the current values.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            commands_recognized: self.commands_recognized.load(Ordering::Relaxed),
            lines_without_detector: self.lines_without_detector.load(Ordering::Relaxed),
            malformed_entries: self.malformed_entries.load(Ordering::Relaxed),
            outside_of_project: self.outside_of_project.load(Ordering::Relaxed),
            settings_entries: self.settings_entries.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Display for ScanStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();

        writeln!(f, "Scan statistics:")?;
        writeln!(f, "  lines read: {}", snapshot.lines_read)?;
        writeln!(f, "  commands recognized: {}", snapshot.commands_recognized)?;
        writeln!(f, "  lines without detector: {}", snapshot.lines_without_detector)?;
        writeln!(f, "  malformed entries: {}", snapshot.malformed_entries)?;
        writeln!(f, "  outside of project: {}", snapshot.outside_of_project)?;
        write!(f, "  settings entries: {}", snapshot.settings_entries)
    }
}

/// Plain copy of the counters, as it goes into the report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    pub lines_read: usize,
    pub commands_recognized: usize,
    pub lines_without_detector: usize,
    pub malformed_entries: usize,
    pub outside_of_project: usize,
    pub settings_entries: usize,
}
