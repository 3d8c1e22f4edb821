// SPDX-License-Identifier: GPL-3.0-or-later

//! Where the extracted settings go.
//!
//! The drivers deposit settings into a [`SettingsSink`]. The
//! [`SettingsStore`] is the sink used by the binary: it keeps the settings per
//! resource, the built-in detection requests and the diagnostics, and turns
//! them into a [`Report`] at the end of the run.

pub mod statistics;

use crate::settings::{BuiltinDetection, Language, SettingsEntry};
use serde::{Deserialize, Serialize};
use statistics::StatisticsSnapshot;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Which resource the settings of a source file are recorded against.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    File,
    Folder,
    Project,
}

/// The owner of a set of settings.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    File(PathBuf),
    Folder(PathBuf),
    Project,
}

impl Resource {
    /// The resource of a source file within the given scope.
    ///
    /// Commands without a known source file always go to the project.
    pub fn for_source(scope: Scope, source: Option<&Path>) -> Self {
        match (scope, source) {
            (Scope::File, Some(file)) => Resource::File(file.to_path_buf()),
            (Scope::Folder, Some(file)) => match file.parent() {
                Some(folder) => Resource::Folder(folder.to_path_buf()),
                None => Resource::Project,
            },
            _ => Resource::Project,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::File(path) => write!(f, "file {}", path.display()),
            Resource::Folder(path) => write!(f, "folder {}", path.display()),
            Resource::Project => write!(f, "project"),
        }
    }
}

/// A request to query the compiler for its built-in settings.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct BuiltinDetectionRequest {
    /// The compiler, as it was written on the command line.
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    pub detection: BuiltinDetection,
    /// The arguments which influence the built-in settings, verbatim.
    pub arguments: Vec<String>,
}

/// Something worth telling the user about a single line or entry.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Where it happened: `entry 3`, `line 12`.
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// Receives the outcome of the scan.
pub trait SettingsSink {
    /// Records the settings of one command against a resource.
    fn add_settings(&mut self, resource: Resource, language: Option<Language>, entries: Vec<SettingsEntry>);

    fn add_builtin_detection(&mut self, request: BuiltinDetectionRequest);

    fn add_diagnostic(&mut self, diagnostic: Diagnostic);
}

/// The settings recorded for one resource.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ResourceSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    pub entries: Vec<SettingsEntry>,
}

/// Keeps everything in memory until the report is written.
///
/// A file resource keeps the settings of the last command compiling it.
/// Folder and project resources collect the settings of every command,
/// each entry recorded once, in first seen order.
#[derive(Debug, Default)]
pub struct SettingsStore {
    resources: BTreeMap<Resource, ResourceSettings>,
    requests: Vec<BuiltinDetectionRequest>,
    seen_requests: HashSet<BuiltinDetectionRequest>,
    diagnostics: Vec<Diagnostic>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self, resource: &Resource) -> Option<&ResourceSettings> {
        self.resources.get(resource)
    }

    pub fn builtin_detection_requests(&self) -> &[BuiltinDetectionRequest] {
        &self.requests
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_report(self, statistics: StatisticsSnapshot) -> Report {
        Report {
            resources: self
                .resources
                .into_iter()
                .map(|(resource, settings)| ResourceReport { resource, settings })
                .collect(),
            builtin_detection: self.requests,
            diagnostics: self.diagnostics,
            statistics,
        }
    }
}

impl SettingsSink for SettingsStore {
    fn add_settings(&mut self, resource: Resource, language: Option<Language>, entries: Vec<SettingsEntry>) {
        log::debug!("Recording {} settings for {}", entries.len(), resource);
        match resource {
            Resource::File(_) => {
                self.resources.insert(resource, ResourceSettings { language, entries });
            }
            Resource::Folder(_) | Resource::Project => {
                let current = self.resources.entry(resource).or_default();
                current.language = current.language.or(language);
                for entry in entries {
                    if !current.entries.contains(&entry) {
                        current.entries.push(entry);
                    }
                }
            }
        }
    }

    fn add_builtin_detection(&mut self, request: BuiltinDetectionRequest) {
        if self.seen_requests.insert(request.clone()) {
            self.requests.push(request);
        }
    }

    fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        log::info!("{}: {}", diagnostic.location, diagnostic.message);
        self.diagnostics.push(diagnostic);
    }
}

/// The settings of one resource, as written in the report.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ResourceReport {
    pub resource: Resource,
    #[serde(flatten)]
    pub settings: ResourceSettings,
}

/// The outcome of a scan run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub resources: Vec<ResourceReport>,
    pub builtin_detection: Vec<BuiltinDetectionRequest>,
    pub diagnostics: Vec<Diagnostic>,
    pub statistics: StatisticsSnapshot,
}

impl Report {
    /// Writes the report as pretty printed JSON.
    pub fn write(&self, writer: impl io::Write) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(writer, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingKind;

    fn include(path: &str) -> SettingsEntry {
        SettingsEntry::path(SettingKind::IncludePath, path)
    }

    #[test]
    fn test_resource_for_scope() {
        let source = Path::new("/p/src/a.c");

        assert_eq!(
            Resource::for_source(Scope::File, Some(source)),
            Resource::File(PathBuf::from("/p/src/a.c"))
        );
        assert_eq!(
            Resource::for_source(Scope::Folder, Some(source)),
            Resource::Folder(PathBuf::from("/p/src"))
        );
        assert_eq!(Resource::for_source(Scope::Project, Some(source)), Resource::Project);
        assert_eq!(Resource::for_source(Scope::File, None), Resource::Project);
    }

    #[test]
    fn test_file_resource_keeps_last_command() {
        let mut sut = SettingsStore::new();
        let file = Resource::File(PathBuf::from("/p/a.c"));

        sut.add_settings(file.clone(), Some(Language::C), vec![include("/old")]);
        sut.add_settings(file.clone(), Some(Language::C), vec![include("/new")]);

        assert_eq!(sut.settings(&file).unwrap().entries, vec![include("/new")]);
    }

    #[test]
    fn test_folder_resource_merges_commands() {
        let mut sut = SettingsStore::new();
        let folder = Resource::Folder(PathBuf::from("/p"));

        sut.add_settings(folder.clone(), None, vec![include("/a"), include("/b")]);
        sut.add_settings(folder.clone(), Some(Language::Cxx), vec![include("/b"), include("/c")]);

        let settings = sut.settings(&folder).unwrap();
        assert_eq!(settings.entries, vec![include("/a"), include("/b"), include("/c")]);
        assert_eq!(settings.language, Some(Language::Cxx));
    }

    #[test]
    fn test_builtin_detection_requests_are_unique() {
        let mut sut = SettingsStore::new();
        let request = |command: &str| BuiltinDetectionRequest {
            command: command.to_string(),
            language: Some(Language::C),
            detection: BuiltinDetection::Gcc,
            arguments: vec!["-std=c11".to_string()],
        };

        sut.add_builtin_detection(request("gcc"));
        sut.add_builtin_detection(request("clang"));
        sut.add_builtin_detection(request("gcc"));

        assert_eq!(sut.builtin_detection_requests(), [request("gcc"), request("clang")]);
    }

    #[test]
    fn test_report_json() {
        let mut sut = SettingsStore::new();
        sut.add_settings(
            Resource::File(PathBuf::from("/p/a.c")),
            Some(Language::C),
            vec![SettingsEntry::macro_define("NDEBUG", None), include("/p/inc")],
        );
        sut.add_diagnostic(Diagnostic::new("entry 2", "No compiler detected"));

        let mut buffer = Vec::new();
        sut.into_report(StatisticsSnapshot::default()).write(&mut buffer).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        let resource = &json["resources"][0];
        assert_eq!(resource["resource"]["file"], "/p/a.c");
        assert_eq!(resource["language"], "c");
        assert_eq!(resource["entries"][0]["kind"], "macro-define");
        assert_eq!(resource["entries"][0]["name"], "NDEBUG");
        assert!(resource["entries"][0].get("value").is_none());
        assert_eq!(resource["entries"][1]["kind"], "include-path");
        assert_eq!(json["diagnostics"][0]["location"], "entry 2");
        assert_eq!(json["statistics"]["lines_read"], 0);
    }
}
