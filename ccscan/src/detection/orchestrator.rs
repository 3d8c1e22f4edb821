// SPDX-License-Identifier: GPL-3.0-or-later

//! Decides which detector recognizes a command line.
//!
//! The POSIX detectors are tried first, then the Windows ones. When neither
//! matches, the tool token might be a Windows short (8.3) file name which
//! hides the real tool name; it is expanded and both registries are tried
//! again against the rewritten line.

use super::detector::{DetectionMethod, Detector, PathStyle};
use super::registry::DetectorRegistry;
use crate::matchers::skip_to_whitespace;
use std::collections::HashMap;

/// Identifies a detector within its registry.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct DetectorId {
    pub(super) style: PathStyle,
    pub(super) index: usize,
}

/// A successful detection.
#[derive(Debug, Clone)]
pub struct DetectionResult<'a> {
    pub detector: &'a Detector,
    pub id: DetectorId,
    pub method: DetectionMethod,
    /// The tool token, quotes stripped.
    pub command: String,
    /// The rest of the line, the arguments of the tool.
    pub arguments: String,
}

/// Expands a Windows short file name to its long form.
pub trait ShortNameExpander {
    /// Returns `None` when the name can not be expanded or does not change.
    fn expand(&self, token: &str) -> Option<String>;
}

/// Expands short names by asking the file system for the canonical path.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalPaths;

impl ShortNameExpander for CanonicalPaths {
    fn expand(&self, token: &str) -> Option<String> {
        let canonical = std::fs::canonicalize(token).ok()?;
        let canonical = canonical.to_string_lossy();
        // verbatim prefix on Windows
        let long = canonical.strip_prefix(r"\\?\").unwrap_or(&canonical);
        (long != token).then(|| long.to_string())
    }
}

/// Finds the detector of a line, without any caching.
pub fn determine_detector<'a>(
    registry: &'a DetectorRegistry,
    line: &str,
    expander: &dyn ShortNameExpander,
) -> Option<DetectionResult<'a>> {
    scan_all(registry, line, |token| expander.expand(token))
}

fn scan_all<'a>(
    registry: &'a DetectorRegistry,
    line: &str,
    mut expand: impl FnMut(&str) -> Option<String>,
) -> Option<DetectionResult<'a>> {
    let options = registry.options();
    if let Some(result) = scan(registry, line, PathStyle::Posix) {
        return Some(result);
    }
    if !options.windows_paths {
        return None;
    }
    if let Some(result) = scan(registry, line, PathStyle::Windows) {
        return Some(result);
    }
    if !options.short_file_names {
        return None;
    }
    let (token, rest) = split_tool_token(line);
    if !token.contains('~') {
        return None;
    }
    let long = expand(token)?;
    log::debug!("Expanded short file name {} to {}", token, long);
    let rewritten = if long.contains(char::is_whitespace) {
        format!("\"{long}\"{rest}")
    } else {
        format!("{long}{rest}")
    };
    scan(registry, &rewritten, PathStyle::Windows)
        .or_else(|| scan(registry, &rewritten, PathStyle::Posix))
}

fn scan<'a>(
    registry: &'a DetectorRegistry,
    line: &str,
    style: PathStyle,
) -> Option<DetectionResult<'a>> {
    let (id, method, found) = registry.scan(line, style)?;
    let detector = registry.get(id)?;
    Some(DetectionResult {
        detector,
        id,
        method,
        command: found.command,
        arguments: found.arguments,
    })
}

/// Splits the first token off the line, a quoted token loses its quotes.
fn split_tool_token(line: &str) -> (&str, &str) {
    if let Some(quoted) = line.strip_prefix('"') {
        if let Some(end) = quoted.find('"') {
            return (&quoted[..end], &quoted[end + 1..]);
        }
    }
    let end = skip_to_whitespace(line);
    (&line[..end], &line[end..])
}

/// Detection with the last known working detector tried first.
///
/// A build is usually dominated by one compiler, so the detector which
/// recognized the previous line is tried directly before the full scan.
/// It is forgotten as soon as it fails to match. Expanded short file names
/// are remembered, so the file system is asked once per token.
///
/// Not meant to be shared between threads, each worker needs its own.
pub struct CachingDetection<'a> {
    registry: &'a DetectorRegistry,
    expander: Box<dyn ShortNameExpander + 'a>,
    last: Option<(DetectorId, DetectionMethod)>,
    short_names: HashMap<String, Option<String>>,
}

impl<'a> CachingDetection<'a> {
    pub fn new(registry: &'a DetectorRegistry) -> Self {
        Self::with_expander(registry, Box::new(CanonicalPaths))
    }

    pub fn with_expander(
        registry: &'a DetectorRegistry,
        expander: Box<dyn ShortNameExpander + 'a>,
    ) -> Self {
        Self {
            registry,
            expander,
            last: None,
            short_names: HashMap::new(),
        }
    }

    pub fn detect(&mut self, line: &str) -> Option<DetectionResult<'a>> {
        if let Some(result) = self.try_last(line) {
            return Some(result);
        }

        let registry: &'a DetectorRegistry = self.registry;
        let expander = &self.expander;
        let short_names = &mut self.short_names;
        let result = scan_all(registry, line, |token| {
            short_names
                .entry(token.to_string())
                .or_insert_with(|| expander.expand(token))
                .clone()
        });
        self.last = result.as_ref().map(|found| (found.id, found.method));
        result
    }

    fn try_last(&mut self, line: &str) -> Option<DetectionResult<'a>> {
        let (id, method) = self.last?;
        let detector = self.registry.get(id)?;
        match detector.matches(line, method) {
            Some(found) => Some(DetectionResult {
                detector,
                id,
                method,
                command: found.command,
                arguments: found.arguments,
            }),
            None => {
                log::trace!("Last detector '{}' does not match, scanning all", detector.name());
                self.last = None;
                None
            }
        }
    }

    /// The detector tried first on the next line, if any.
    pub fn last_detector(&self) -> Option<&'a Detector> {
        self.last.and_then(|(id, _)| self.registry.get(id))
    }
}
