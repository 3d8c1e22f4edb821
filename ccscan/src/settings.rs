// SPDX-License-Identifier: GPL-3.0-or-later

//! Value types produced by the command line parsing.
//!
//! A parse of one compiler invocation yields an ordered list of [`SettingsEntry`]
//! values (include paths, macro definitions and so on) and an ordered list of raw
//! arguments which influence what the compiler defines on its own. Both are
//! collected into a [`ParseResult`], which is owned by exactly one parse call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The kind of a language setting discovered on a command line.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingKind {
    IncludePath,
    SystemIncludePath,
    MacroDefine,
    MacroUndefine,
    MacroFile,
    IncludeFile,
}

/// A single language setting.
///
/// The `value` is only meaningful for macro definitions. A bare `-DNAME` has
/// no value at all, while `-DNAME=` has an empty one.
///
/// Entries taken from a command line are `read_only`, the build owns them.
/// `built_in` is reserved for what the compiler defines on its own, which is
/// queried elsewhere, so it is never set here.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct SettingsEntry {
    pub kind: SettingKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub read_only: bool,
    pub built_in: bool,
}

impl SettingsEntry {
    pub fn macro_define(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            kind: SettingKind::MacroDefine,
            name: name.into(),
            value,
            read_only: true,
            built_in: false,
        }
    }

    pub fn macro_undefine(name: impl Into<String>) -> Self {
        Self {
            kind: SettingKind::MacroUndefine,
            name: name.into(),
            value: None,
            read_only: true,
            built_in: false,
        }
    }

    /// Creates a path-like entry (include path, include file, macro file).
    pub fn path(kind: SettingKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            value: None,
            read_only: true,
            built_in: false,
        }
    }
}

impl fmt::Display for SettingsEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.value) {
            (SettingKind::MacroDefine, Some(value)) => write!(f, "#define {} {}", self.name, value),
            (SettingKind::MacroDefine, None) => write!(f, "#define {}", self.name),
            (SettingKind::MacroUndefine, _) => write!(f, "#undef {}", self.name),
            (kind, _) => write!(f, "{:?} {}", kind, self.name),
        }
    }
}

/// The source language a tool compiles.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    #[serde(rename = "c++")]
    Cxx,
    Cuda,
    Assembly,
}

impl Language {
    /// Derives the language from the extension of a source file name.
    pub fn from_file_name(file: &Path) -> Option<Self> {
        let extension = file.extension()?.to_str()?;
        match extension {
            "c" | "i" => Some(Language::C),
            "cc" | "cpp" | "cxx" | "c++" | "cp" | "C" | "CC" | "CPP" | "ii" => Some(Language::Cxx),
            "cu" => Some(Language::Cuda),
            "s" | "S" | "sx" | "asm" => Some(Language::Assembly),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::C => "C",
            Language::Cxx => "C++",
            Language::Cuda => "CUDA",
            Language::Assembly => "Assembly",
        };
        write!(f, "{}", name)
    }
}

/// How the compiler built-in macros and include paths of a tool can be queried.
///
/// The query itself happens elsewhere, this classification only travels with
/// the collected arguments.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinDetection {
    None,
    Gcc,
    /// GCC-style, but only when the tool was driven with dash-prefixed options.
    GccIfDashPrefixed,
    Msvc,
    Intel,
    Nvcc,
}

impl BuiltinDetection {
    /// Resolves the classification against the arguments of one invocation.
    pub fn resolve(self, arguments: &[String]) -> BuiltinDetection {
        match self {
            BuiltinDetection::GccIfDashPrefixed => {
                if arguments.iter().all(|argument| argument.starts_with('-')) {
                    BuiltinDetection::Gcc
                } else {
                    BuiltinDetection::None
                }
            }
            other => other,
        }
    }
}

/// Accumulates the outcome of parsing one command line.
///
/// Created fresh for every parse and handed back to the caller at the end.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    entries: Vec<SettingsEntry>,
    builtin_detection_args: Vec<String>,
}

impl ParseResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, entry: SettingsEntry) {
        log::trace!("Found setting: {entry}");
        self.entries.push(entry);
    }

    pub fn add_builtin_detection_arg(&mut self, argument: impl Into<String>) {
        self.builtin_detection_args.push(argument.into());
    }

    pub fn entries(&self) -> &[SettingsEntry] {
        &self.entries
    }

    pub fn builtin_detection_args(&self) -> &[String] {
        &self.builtin_detection_args
    }

    pub fn into_parts(self) -> (Vec<SettingsEntry>, Vec<String>) {
        (self.entries, self.builtin_detection_args)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.builtin_detection_args.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_file_name() {
        assert_eq!(Language::from_file_name(Path::new("/p/a.c")), Some(Language::C));
        assert_eq!(Language::from_file_name(Path::new("a.cpp")), Some(Language::Cxx));
        assert_eq!(Language::from_file_name(Path::new("a.C")), Some(Language::Cxx));
        assert_eq!(Language::from_file_name(Path::new("kernel.cu")), Some(Language::Cuda));
        assert_eq!(Language::from_file_name(Path::new("start.S")), Some(Language::Assembly));
        assert_eq!(Language::from_file_name(Path::new("README")), None);
        assert_eq!(Language::from_file_name(Path::new("lib.rs")), None);
    }

    #[test]
    fn test_gcc_if_dash_prefixed_resolution() {
        let dashed = vec!["-std=c99".to_string(), "--sysroot=/x".to_string()];
        let slashed = vec!["/std:c++17".to_string()];

        assert_eq!(BuiltinDetection::GccIfDashPrefixed.resolve(&dashed), BuiltinDetection::Gcc);
        assert_eq!(BuiltinDetection::GccIfDashPrefixed.resolve(&[]), BuiltinDetection::Gcc);
        assert_eq!(BuiltinDetection::GccIfDashPrefixed.resolve(&slashed), BuiltinDetection::None);
        assert_eq!(BuiltinDetection::Msvc.resolve(&dashed), BuiltinDetection::Msvc);
    }

    #[test]
    fn test_command_line_entries_are_read_only_and_not_builtin() {
        let entry = SettingsEntry::macro_define("NAME", Some("VALUE".to_string()));

        assert_eq!(entry.kind, SettingKind::MacroDefine);
        assert!(entry.read_only);
        assert!(!entry.built_in);
        let undefine = SettingsEntry::macro_undefine("X");
        let path = SettingsEntry::path(SettingKind::IncludePath, "/p/inc");
        assert_eq!((undefine.read_only, undefine.built_in), (true, false));
        assert_eq!((path.read_only, path.built_in), (true, false));
        assert_eq!(entry.to_string(), "#define NAME VALUE");
        assert_eq!(SettingsEntry::macro_undefine("X").to_string(), "#undef X");
    }

    #[test]
    fn test_parse_result_keeps_insertion_order() {
        let mut result = ParseResult::new();
        assert!(result.is_empty());

        result.add_entry(SettingsEntry::macro_define("B", None));
        result.add_entry(SettingsEntry::macro_define("A", None));
        result.add_builtin_detection_arg("-std=c11");

        let names: Vec<_> = result.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(result.builtin_detection_args(), ["-std=c11"]);
    }
}
