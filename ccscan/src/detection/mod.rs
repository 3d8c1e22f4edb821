// SPDX-License-Identifier: GPL-3.0-or-later

//! Tool detection: which compiler, if any, a command line invokes.
//!
//! The [`DetectorRegistry`] is built once from the [`DetectionOptions`] and
//! is read-only afterwards. The orchestrator functions scan it for a line,
//! and the [`CachingDetection`] adds the last-detector fast path on top.

mod detector;
mod orchestrator;
mod registry;

pub use detector::{DetectionMethod, Detector, MatchResult, PathStyle};
pub use orchestrator::{
    CachingDetection, CanonicalPaths, DetectionResult, DetectorId, ShortNameExpander,
    determine_detector,
};
pub use registry::{DetectorRegistry, ToolSpec};

use thiserror::Error;

/// The version suffix accepted after a tool name by default: `gcc-4.6`, `clang-9`.
pub const DEFAULT_VERSION_SUFFIX: &str = r"-?\d+(\.\d+)*";

/// Options which decide what the detectors are able to recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionOptions {
    /// Regex of the version suffix; `None` turns off versioned names.
    pub version_suffix: Option<String>,
    /// Also recognize tool paths with backslash separators.
    pub windows_paths: bool,
    /// Try to expand Windows short (8.3) file names of the tool.
    pub short_file_names: bool,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            version_suffix: None,
            windows_paths: cfg!(windows),
            short_file_names: true,
        }
    }
}

/// Errors building the detector registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid pattern for tool '{tool}': {source}")]
    InvalidPattern {
        tool: String,
        #[source]
        source: regex_lite::Error,
    },
}
