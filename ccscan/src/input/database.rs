// SPDX-License-Identifier: GPL-3.0-or-later

//! JSON compilation database driver.
//!
//! The database is an array of objects with `directory`, `file` and either
//! `command` or `arguments` keys, as defined in the LLVM project
//! [documentation](https://clang.llvm.org/docs/JSONCompilationDatabase.html).
//!
//! Malformed entries are reported and skipped, only a broken array (or an
//! unreadable file) ends the scan.

use super::{CommandProcessor, EntryError, InputError, Invocation, Outcome, json};
use crate::output::statistics::ScanStatistics;
use crate::output::{Diagnostic, SettingsSink};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// The keys of an entry. Everything is optional here, the checks follow.
#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    file: Option<PathBuf>,
    directory: Option<PathBuf>,
    command: Option<String>,
    arguments: Option<Vec<String>>,
}

/// Converts one element of the database into an invocation.
///
/// When both `command` and `arguments` are present, `command` is used.
pub fn to_invocation(value: serde_json::Value) -> Result<Invocation, EntryError> {
    if !value.is_object() {
        return Err(EntryError::NotAnObject);
    }
    let entry: RawEntry = serde_json::from_value(value)?;

    let directory = entry.directory.ok_or(EntryError::MissingDirectory)?;
    let file = entry.file.ok_or(EntryError::MissingFile)?;
    let line = match (entry.command, entry.arguments) {
        (Some(command), arguments) => {
            if arguments.is_some() {
                log::debug!("Entry of {} has both command and arguments, using command", file.display());
            }
            // the detectors are anchored to the start of the line
            command.trim_start().to_string()
        }
        (None, Some(arguments)) => join_arguments(&arguments),
        (None, None) => return Err(EntryError::MissingCommand),
    };
    if line.trim().is_empty() {
        return Err(EntryError::EmptyCommand);
    }

    Ok(Invocation {
        directory,
        line,
        file: Some(file),
    })
}

/// Joins an argument vector into a single command line.
///
/// Quotes inside an argument are escaped, so they survive as part of the
/// value. Arguments with whitespace are quoted the way a build tool would
/// write them: only the value after the first `=`, or after the option
/// letter of an option, otherwise the whole argument.
fn join_arguments(arguments: &[String]) -> String {
    arguments
        .iter()
        .map(|argument| {
            let escaped = argument.replace('"', "\\\"").replace('\'', "\\'");
            if !argument.contains(char::is_whitespace) {
                escaped
            } else if let Some((option, value)) = escaped.split_once('=') {
                format!("{option}=\"{value}\"")
            } else if escaped.starts_with('-') && escaped.len() > 2 && escaped.is_char_boundary(2) {
                format!("{}\"{}\"", &escaped[..2], &escaped[2..])
            } else {
                format!("\"{escaped}\"")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scans a compilation database from a reader.
pub fn scan(
    reader: impl io::Read,
    processor: &mut CommandProcessor,
    sink: &mut dyn SettingsSink,
) -> Result<(), InputError> {
    for (index, element) in json::deserialize_seq::<serde_json::Value, _>(reader).enumerate() {
        let element = element?;
        ScanStatistics::increment(&processor.statistics().lines_read);
        let location = format!("entry {}", index + 1);

        match to_invocation(element) {
            Ok(invocation) => {
                if processor.process(&invocation, sink) == Outcome::NoDetector {
                    let message = format!("No compiler detected: {}", invocation.line);
                    sink.add_diagnostic(Diagnostic::new(location, message));
                }
            }
            Err(error) => {
                log::warn!("Skipping {}: {}", location, error);
                ScanStatistics::increment(&processor.statistics().malformed_entries);
                sink.add_diagnostic(Diagnostic::new(location, error.to_string()));
            }
        }
    }
    Ok(())
}

/// Scans the compilation database file at the given path.
pub fn scan_file(
    path: &Path,
    processor: &mut CommandProcessor,
    sink: &mut dyn SettingsSink,
) -> Result<(), InputError> {
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    scan(BufReader::new(file), processor, sink)
}
