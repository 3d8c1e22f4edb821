// SPDX-License-Identifier: GPL-3.0-or-later

//! The drivers which feed command lines into the engine.
//!
//! Two sources are supported: a JSON compilation database and the captured
//! output of a build. Both produce [`Invocation`]s, which the
//! [`CommandProcessor`] runs through detection and argument parsing, and
//! deposits the outcome into a settings sink.

pub mod build_output;
pub mod database;
mod json;

use crate::arguments::{normalize, resolve_path};
use crate::detection::CachingDetection;
use crate::matchers::looks_like_a_source_file;
use crate::output::statistics::ScanStatistics;
use crate::output::{BuiltinDetectionRequest, Resource, Scope, SettingsSink};
use crate::response_file::ContentProvider;
use crate::settings::{BuiltinDetection, Language};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use thiserror::Error;

/// One command line to examine, with its context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The working directory of the command.
    pub directory: PathBuf,
    /// The command line as it was recorded.
    pub line: String,
    /// The source file, when the input names it.
    pub file: Option<PathBuf>,
}

/// Errors which end reading an input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid compilation database: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("Failed to read build output: {0}")]
    Read(#[from] io::Error),
}

/// Problems of a single compilation database entry. The entry is skipped.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("Entry is not a JSON object")]
    NotAnObject,
    #[error("Entry has no file field")]
    MissingFile,
    #[error("Entry has no directory field")]
    MissingDirectory,
    #[error("Entry has neither command nor arguments field")]
    MissingCommand,
    #[error("Entry has an empty command")]
    EmptyCommand,
    #[error("Entry has a field of wrong type: {0}")]
    InvalidField(#[from] serde_json::Error),
}

/// What happened to an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A compiler was detected and its arguments parsed.
    Recognized,
    /// No detector matched the command line.
    NoDetector,
    /// The source file is outside of the project, nothing was recorded.
    OutsideOfProject,
}

/// Runs detection and argument parsing on invocations.
///
/// Owns the detection cache, so it is meant for one input at a time.
pub struct CommandProcessor<'a> {
    detection: CachingDetection<'a>,
    content: &'a dyn ContentProvider,
    scope: Scope,
    project_root: Option<PathBuf>,
    statistics: Arc<ScanStatistics>,
}

impl<'a> CommandProcessor<'a> {
    pub fn new(
        detection: CachingDetection<'a>,
        content: &'a dyn ContentProvider,
        scope: Scope,
        project_root: Option<PathBuf>,
        statistics: Arc<ScanStatistics>,
    ) -> Self {
        Self {
            detection,
            content,
            scope,
            // `Path::starts_with` compares components, `..` must be gone
            project_root: project_root.map(|root| normalize(&root)),
            statistics,
        }
    }

    pub fn statistics(&self) -> &Arc<ScanStatistics> {
        &self.statistics
    }

    /// Examines one invocation and records what was found into the sink.
    pub fn process(&mut self, invocation: &Invocation, sink: &mut dyn SettingsSink) -> Outcome {
        let Some(found) = self.detection.detect(&invocation.line) else {
            log::debug!("No compiler detected: {}", invocation.line);
            ScanStatistics::increment(&self.statistics.lines_without_detector);
            return Outcome::NoDetector;
        };
        ScanStatistics::increment(&self.statistics.commands_recognized);
        log::debug!(
            "Detected '{}' ({}) as {:?}",
            found.command,
            found.method,
            found.detector.parser().family()
        );

        let source = invocation
            .file
            .clone()
            .or_else(|| find_source_file(&found.arguments))
            .map(|file| resolve_path(&invocation.directory, &file.to_string_lossy()))
            .map(|file| normalize(Path::new(&file)));
        if let (Some(root), Some(file)) = (&self.project_root, &source) {
            if !file.starts_with(root) {
                log::debug!("Source {} is outside of the project, skipped", file.display());
                ScanStatistics::increment(&self.statistics.outside_of_project);
                return Outcome::OutsideOfProject;
            }
        }

        let parser = found.detector.parser();
        let result = parser.parse(&invocation.directory, &found.arguments, self.content);
        let (entries, builtin_arguments) = result.into_parts();
        let language = parser
            .language()
            .or_else(|| source.as_deref().and_then(Language::from_file_name));

        self.statistics.settings_entries.fetch_add(entries.len(), Ordering::Relaxed);
        sink.add_settings(Resource::for_source(self.scope, source.as_deref()), language, entries);

        let detection = parser.builtin_detection().resolve(&builtin_arguments);
        if detection != BuiltinDetection::None {
            sink.add_builtin_detection(BuiltinDetectionRequest {
                command: found.command,
                language,
                detection,
                arguments: builtin_arguments,
            });
        }
        Outcome::Recognized
    }
}

/// The first argument which is not an option and names a source file.
///
/// Backslashes are path separators on Windows, not escapes, those lines are
/// split on whitespace only.
fn find_source_file(arguments: &str) -> Option<PathBuf> {
    let words = Some(arguments)
        .filter(|arguments| !arguments.contains('\\'))
        .and_then(|arguments| shell_words::split(arguments).ok())
        .unwrap_or_else(|| arguments.split_whitespace().map(str::to_string).collect());
    words
        .into_iter()
        .find(|word| looks_like_a_source_file(word))
        .map(PathBuf::from)
}
