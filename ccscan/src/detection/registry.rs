// SPDX-License-Identifier: GPL-3.0-or-later

//! The known tools and their detectors.
//!
//! Tools are registered as data: a name pattern, the compiler family and
//! the language. Adding a tool does not need new code.

use super::detector::{DetectionMethod, Detector, MatchResult, PathStyle};
use super::orchestrator::DetectorId;
use super::{DetectionOptions, RegistryError};
use crate::commandline::{ToolCommandlineParser, ToolFamily};
use crate::settings::Language;
use std::sync::Arc;

/// Describes one tool to detect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    /// Regex of the file name, without directory and extension.
    pub name: String,
    pub family: ToolFamily,
    /// `None` derives the language from the source file.
    pub language: Option<Language>,
    /// Regex of the file name extension, if the tool may have one.
    pub extension: Option<String>,
    /// Also register a detector for backslash separated paths.
    pub windows_paths: bool,
}

/// Cross compilers are prefixed with the target triple: `arm-none-eabi-gcc`.
const CROSS: &str = r#"[^\s"/\\]+-"#;

#[rustfmt::skip]
static BUILTIN_TOOLS: &[(&str, &str, ToolFamily, Option<Language>)] = &[
    // GCC
    ("", "gcc", ToolFamily::Gcc, None),
    (CROSS, "gcc", ToolFamily::Gcc, None),
    ("", r"g\+\+", ToolFamily::Gcc, Some(Language::Cxx)),
    (CROSS, r"g\+\+", ToolFamily::Gcc, Some(Language::Cxx)),
    ("", r"c\+\+", ToolFamily::Gcc, Some(Language::Cxx)),
    (CROSS, r"c\+\+", ToolFamily::Gcc, Some(Language::Cxx)),
    // Clang
    ("", "clang", ToolFamily::Clang, None),
    (CROSS, "clang", ToolFamily::Clang, None),
    ("", r"clang\+\+", ToolFamily::Clang, Some(Language::Cxx)),
    (CROSS, r"clang\+\+", ToolFamily::Clang, Some(Language::Cxx)),
    // Generic
    ("", "cc", ToolFamily::Cc, None),
    (CROSS, "cc", ToolFamily::Cc, None),
    // MSVC
    ("", "cl", ToolFamily::Msvc, None),
    ("", "clang-cl", ToolFamily::Msvc, None),
    // Intel
    ("", "icc", ToolFamily::Intel, None),
    ("", "icpc", ToolFamily::Intel, Some(Language::Cxx)),
    ("", "icx", ToolFamily::Intel, None),
    ("", "icpx", ToolFamily::Intel, Some(Language::Cxx)),
    ("", "icl", ToolFamily::IntelMsvc, None),
    // CUDA
    ("", "nvcc", ToolFamily::Nvcc, Some(Language::Cuda)),
];

/// The tools every registry knows.
pub fn builtin_tools() -> Vec<ToolSpec> {
    BUILTIN_TOOLS
        .iter()
        .map(|(prefix, name, family, language)| ToolSpec {
            name: format!("{prefix}{name}"),
            family: *family,
            language: *language,
            extension: Some("exe".to_string()),
            windows_paths: true,
        })
        .collect()
}

/// Every detector, for both path styles, in registration order.
#[derive(Debug)]
pub struct DetectorRegistry {
    posix: Vec<Detector>,
    windows: Vec<Detector>,
    options: DetectionOptions,
}

impl DetectorRegistry {
    /// Builds the registry of the built-in tools, preceded by the given ones.
    ///
    /// The Windows detectors are only built when the options enable them.
    pub fn new(options: DetectionOptions, tools: &[ToolSpec]) -> Result<Self, RegistryError> {
        let mut posix = Vec::new();
        let mut windows = Vec::new();

        for tool in tools.iter().cloned().chain(builtin_tools()) {
            let parser = Arc::new(ToolCommandlineParser::new(tool.family, tool.language));
            let build = |style| {
                Detector::new(
                    &tool.name,
                    tool.extension.as_deref(),
                    options.version_suffix.as_deref(),
                    style,
                    Arc::clone(&parser),
                )
                .map_err(|source| RegistryError::InvalidPattern {
                    tool: tool.name.clone(),
                    source,
                })
            };
            posix.push(build(PathStyle::Posix)?);
            if options.windows_paths && tool.windows_paths {
                windows.push(build(PathStyle::Windows)?);
            }
        }
        log::debug!(
            "Detector registry built: {} POSIX, {} Windows detectors",
            posix.len(),
            windows.len()
        );

        Ok(Self { posix, windows, options })
    }

    /// The registry of the built-in tools only.
    pub fn builtin(options: DetectionOptions) -> Result<Self, RegistryError> {
        Self::new(options, &[])
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    pub fn detectors(&self, style: PathStyle) -> &[Detector] {
        match style {
            PathStyle::Posix => &self.posix,
            PathStyle::Windows => &self.windows,
        }
    }

    pub fn get(&self, id: DetectorId) -> Option<&Detector> {
        self.detectors(id.style).get(id.index)
    }

    /// Scans the detectors of one path style.
    ///
    /// Each method is tried on every detector before the next method is
    /// tried, so a plain name match always wins over a versioned one.
    pub fn scan(
        &self,
        line: &str,
        style: PathStyle,
    ) -> Option<(DetectorId, DetectionMethod, MatchResult)> {
        let detectors = self.detectors(style);
        DetectionMethod::ALL.into_iter().find_map(|method| {
            detectors.iter().enumerate().find_map(|(index, detector)| {
                detector
                    .matches(line, method)
                    .map(|found| (DetectorId { style, index }, method, found))
            })
        })
    }
}
