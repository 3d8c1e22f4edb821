// SPDX-License-Identifier: GPL-3.0-or-later

//! This module defines the configuration of the application.
//!
//! The configuration is either loaded from a file or used with default
//! values, which are defined in the code. It decides what the detectors
//! recognize and how the extracted settings are recorded.
//!
//! The configuration file syntax is based on the YAML format.
//! The default configuration file name is `ccscan.yml`.
//!
//! The configuration file location is searched in the following order:
//! 1. The current working directory
//! 2. The local configuration directory of the user
//! 3. The configuration directory of the user
//! 4. The local configuration directory of the application
//! 5. The configuration directory of the application
//!
//! ```yaml
//! schema: 1.0
//!
//! detection:
//!   version_suffix:
//!     enabled: true
//!     pattern: "-?\\d+(\\.\\d+)*"
//!   windows_paths: auto
//!   short_file_names: true
//!   tools:
//!     - name: "my-gcc"
//!       dialect: gcc
//!       language: c
//!       extension: exe
//!       windows_paths: true
//!
//! output:
//!   scope: folder
//!   project_root: /opt/project
//! ```

// Re-Export the types and the loader module content.
pub use loader::{ConfigError, Loader};
pub use types::*;
pub use validation::Validator;

mod types {
    use crate::commandline::ToolFamily;
    use crate::detection::{DEFAULT_VERSION_SUFFIX, DetectionOptions, ToolSpec};
    use crate::output::Scope;
    use crate::settings::Language;
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::path::PathBuf;

    /// Represents the application configuration.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    pub struct Main {
        #[serde(deserialize_with = "validate_schema_version")]
        pub schema: String,
        #[serde(default)]
        pub detection: Detection,
        #[serde(default)]
        pub output: Output,
    }

    impl Default for Main {
        fn default() -> Self {
            Self {
                schema: String::from(SUPPORTED_SCHEMA_VERSION),
                detection: Detection::default(),
                output: Output::default(),
            }
        }
    }

    impl fmt::Display for Main {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            writeln!(f, "Configuration:")?;
            match serde_yml::to_string(self) {
                Ok(yaml_string) => {
                    for line in yaml_string.lines() {
                        writeln!(f, "{}", line)?;
                    }
                    Ok(())
                }
                Err(_) => Err(fmt::Error),
            }
        }
    }

    /// What the detectors recognize.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    pub struct Detection {
        #[serde(default)]
        pub version_suffix: VersionSuffix,
        #[serde(default)]
        pub windows_paths: WindowsPaths,
        #[serde(default = "default_enabled")]
        pub short_file_names: bool,
        /// Extra tools, tried before the built-in ones.
        #[serde(default)]
        pub tools: Vec<Tool>,
    }

    impl Default for Detection {
        fn default() -> Self {
            Self {
                version_suffix: VersionSuffix::default(),
                windows_paths: WindowsPaths::default(),
                short_file_names: true,
                tools: vec![],
            }
        }
    }

    impl Detection {
        pub fn options(&self) -> DetectionOptions {
            DetectionOptions {
                version_suffix: self
                    .version_suffix
                    .enabled
                    .then(|| self.version_suffix.pattern.clone()),
                windows_paths: self.windows_paths.enabled(),
                short_file_names: self.short_file_names,
            }
        }

        pub fn tool_specs(&self) -> Vec<ToolSpec> {
            self.tools.iter().map(Tool::to_spec).collect()
        }
    }

    /// Versioned tool names, like `gcc-11` or `clang-14.0`.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    pub struct VersionSuffix {
        #[serde(default)]
        pub enabled: bool,
        #[serde(default = "default_version_pattern")]
        pub pattern: String,
    }

    impl Default for VersionSuffix {
        fn default() -> Self {
            Self { enabled: false, pattern: default_version_pattern() }
        }
    }

    /// When to recognize tool paths with backslash separators.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(rename_all = "lowercase")]
    pub enum WindowsPaths {
        /// Only when running on Windows.
        #[default]
        Auto,
        Always,
        Never,
    }

    impl WindowsPaths {
        pub fn enabled(self) -> bool {
            match self {
                WindowsPaths::Auto => cfg!(windows),
                WindowsPaths::Always => true,
                WindowsPaths::Never => false,
            }
        }
    }

    /// A tool to detect, next to the built-in ones.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    pub struct Tool {
        /// Regex of the executable name.
        pub name: String,
        pub dialect: ToolFamily,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub language: Option<Language>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub extension: Option<String>,
        #[serde(default = "default_enabled")]
        pub windows_paths: bool,
    }

    impl Tool {
        pub fn to_spec(&self) -> ToolSpec {
            ToolSpec {
                name: self.name.clone(),
                family: self.dialect,
                language: self.language,
                extension: self.extension.clone(),
                windows_paths: self.windows_paths,
            }
        }
    }

    /// How the extracted settings are recorded.
    #[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
    pub struct Output {
        #[serde(default)]
        pub scope: Scope,
        /// Sources outside of this directory are ignored.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub project_root: Option<PathBuf>,
    }

    pub(super) const SUPPORTED_SCHEMA_VERSION: &str = "1.0";

    fn default_enabled() -> bool {
        true
    }

    fn default_version_pattern() -> String {
        String::from(DEFAULT_VERSION_SUFFIX)
    }

    // Custom deserialization function to validate the schema version
    fn validate_schema_version<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let schema: String = Deserialize::deserialize(deserializer)?;
        if schema != SUPPORTED_SCHEMA_VERSION {
            use serde::de::Error;
            Err(Error::custom(format!(
                "Unsupported schema version: {schema}. Expected: {SUPPORTED_SCHEMA_VERSION}"
            )))
        } else {
            Ok(schema)
        }
    }
}

pub mod validation {

    use super::types::*;
    use regex_lite::Regex;
    use std::collections::HashSet;
    use thiserror::Error;

    /// Trait for validating configuration objects
    pub trait Validator<T> {
        type Error: std::error::Error;

        fn validate(config: &T) -> Result<(), Self::Error>;
    }

    /// Validation errors for configuration
    #[derive(Debug, Error)]
    pub enum ValidationError {
        #[error("Empty string value for field '{field}'")]
        EmptyString { field: String },
        #[error("Invalid pattern for field '{field}': {source}")]
        InvalidPattern {
            field: String,
            #[source]
            source: regex_lite::Error,
        },
        #[error("Duplicate {field} entry at: {idx}")]
        DuplicateEntry { field: &'static str, idx: usize },
        #[error("Multiple validation errors: {errors:?}")]
        Multiple { errors: Vec<ValidationError> },
    }

    /// Combinator for collecting and handling validation errors
    #[derive(Default)]
    struct ValidationCollector {
        errors: Vec<ValidationError>,
    }

    impl ValidationCollector {
        fn new() -> Self {
            Self { errors: Vec::new() }
        }

        fn add(&mut self, error: ValidationError) {
            self.errors.push(error);
        }

        fn add_result(&mut self, result: Result<(), ValidationError>) {
            if let Err(error) = result {
                match error {
                    ValidationError::Multiple { errors } => {
                        self.errors.extend(errors);
                    }
                    single_error => self.errors.push(single_error),
                }
            }
        }

        fn finish(self) -> Result<(), ValidationError> {
            let mut errors = self.errors;
            match errors.len() {
                0 => Ok(()),
                1 => Err(errors.remove(0)),
                _ => Err(ValidationError::Multiple { errors }),
            }
        }
    }

    fn check_pattern(field: String, pattern: &str) -> Result<(), ValidationError> {
        Regex::new(pattern)
            .map(|_| ())
            .map_err(|source| ValidationError::InvalidPattern { field, source })
    }

    impl Validator<Main> for Main {
        type Error = ValidationError;

        fn validate(config: &Main) -> Result<(), Self::Error> {
            Detection::validate(&config.detection)
        }
    }

    impl Validator<Detection> for Detection {
        type Error = ValidationError;

        fn validate(config: &Detection) -> Result<(), Self::Error> {
            let mut collector = ValidationCollector::new();

            if config.version_suffix.enabled {
                collector.add_result(check_pattern(
                    String::from("detection.version_suffix.pattern"),
                    &config.version_suffix.pattern,
                ));
            }

            for (idx, tool) in config.tools.iter().enumerate() {
                if tool.name.is_empty() {
                    collector.add(ValidationError::EmptyString {
                        field: format!("detection.tools[{idx}].name"),
                    });
                } else {
                    collector.add_result(check_pattern(format!("detection.tools[{idx}].name"), &tool.name));
                }
                if let Some(extension) = &tool.extension {
                    collector.add_result(check_pattern(
                        format!("detection.tools[{idx}].extension"),
                        extension,
                    ));
                }
            }

            let mut seen_names = HashSet::new();
            for (idx, tool) in config.tools.iter().enumerate() {
                if !seen_names.insert(&tool.name) {
                    collector.add(ValidationError::DuplicateEntry { field: "detection.tools", idx });
                }
            }

            collector.finish()
        }
    }

}

pub mod loader {
    use super::{Main, Validator};
    use directories::{BaseDirs, ProjectDirs};
    use log::{debug, info};
    use std::fs::OpenOptions;
    use std::path::{Path, PathBuf};
    use thiserror::Error;

    const CONFIG_FILE_NAME: &str = "ccscan.yml";

    pub struct Loader {}

    impl Loader {
        /// Loads the configuration from the specified file or the default locations.
        ///
        /// If the configuration file is specified, it will be used. Otherwise, the default locations
        /// will be searched for the configuration file. If the configuration file is not found, the
        /// default configuration will be returned.
        pub fn load(current_directory: &Path, filename: &Option<String>) -> Result<Main, ConfigError> {
            if let Some(path) = filename {
                return Self::from_file(Path::new(path));
            }
            for location in Self::file_locations(current_directory) {
                debug!("Checking configuration file: {}", location.display());
                if location.exists() {
                    return Self::from_file(location.as_path());
                }
            }
            debug!("Configuration file not found. Using the default configuration.");
            Ok(Main::default())
        }

        /// The default locations where the configuration file can be found.
        fn file_locations(current_directory: &Path) -> Vec<PathBuf> {
            let mut locations = vec![current_directory.to_path_buf()];
            if let Some(base_dirs) = BaseDirs::new() {
                locations.push(base_dirs.config_local_dir().to_path_buf());
                locations.push(base_dirs.config_dir().to_path_buf());
            }
            if let Some(proj_dirs) = ProjectDirs::from("com.github", "ccscan", "ccscan") {
                locations.push(proj_dirs.config_local_dir().to_path_buf());
                locations.push(proj_dirs.config_dir().to_path_buf());
            }
            // filter out duplicate elements from the list
            locations.dedup();
            locations.iter().map(|p| p.join(CONFIG_FILE_NAME)).collect()
        }

        /// Loads the configuration from the specified file.
        pub fn from_file(path: &Path) -> Result<Main, ConfigError> {
            info!("Loading configuration file: {}", path.display());

            let reader = OpenOptions::new()
                .read(true)
                .open(path)
                .map_err(|source| ConfigError::FileAccess { path: path.to_path_buf(), source })?;

            let content: Main = Self::from_reader(reader)
                .map_err(|source| ConfigError::ParseError { path: path.to_path_buf(), source })?;

            Main::validate(&content)
                .map_err(|source| ConfigError::ValidationError { path: path.to_path_buf(), source })?;

            Ok(content)
        }

        /// Define the deserialization format of the config file.
        pub(super) fn from_reader<R, T>(rdr: R) -> serde_yml::Result<T>
        where
            R: std::io::Read,
            T: serde::de::DeserializeOwned,
        {
            serde_yml::from_reader(rdr)
        }
    }

    /// Represents all possible configuration-related errors.
    #[derive(Debug, Error)]
    pub enum ConfigError {
        /// Error when opening or reading a configuration file.
        #[error("Failed to access configuration file '{path}': {source}")]
        FileAccess {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        /// Error when parsing the configuration file format.
        #[error("Failed to parse configuration from file '{path}': {source}")]
        ParseError {
            path: PathBuf,
            #[source]
            source: serde_yml::Error,
        },
        /// Error when configuration validation fails.
        #[error("Configuration validation failed for file '{path}': {source}")]
        ValidationError {
            path: PathBuf,
            #[source]
            source: super::validation::ValidationError,
        },
    }

}
