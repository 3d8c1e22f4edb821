// SPDX-License-Identifier: GPL-3.0-or-later

//! Build output driver.
//!
//! Reads the captured console output of a build line by line. Most lines
//! are not compiler invocations, those are counted and ignored. The working
//! directory follows the `Entering directory`/`Leaving directory` messages
//! of recursive make.

use super::{CommandProcessor, InputError, Invocation};
use crate::output::SettingsSink;
use crate::output::statistics::ScanStatistics;
use regex_lite::Regex;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static DIRECTORY_CHANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\S*make(?:\[\d+\])?: (Entering|Leaving) directory [`'"](.*)['"]\s*$"#)
        .expect("Invalid directory change pattern")
});

/// Progress prefix of ninja in verbose mode: `[3/12] `.
static NINJA_PROGRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\d+/\d+\]\s+").expect("Invalid progress pattern"));

/// Tracks the working directory of the build.
#[derive(Debug)]
pub struct DirectoryStack {
    stack: Vec<PathBuf>,
}

impl DirectoryStack {
    pub fn new(initial: impl Into<PathBuf>) -> Self {
        Self {
            stack: vec![initial.into()],
        }
    }

    pub fn current(&self) -> &Path {
        // never empty, the initial directory is not popped
        self.stack.last().map(PathBuf::as_path).unwrap_or(Path::new("."))
    }

    /// Updates the stack when the line is a directory change message.
    /// Returns `true` when the line was consumed.
    pub fn observe(&mut self, line: &str) -> bool {
        let Some(captures) = DIRECTORY_CHANGE.captures(line) else {
            return false;
        };
        match (captures.get(1).map(|m| m.as_str()), captures.get(2)) {
            (Some("Entering"), Some(directory)) => {
                log::debug!("Entering directory {}", directory.as_str());
                self.stack.push(PathBuf::from(directory.as_str()));
            }
            (Some("Leaving"), _) => {
                if self.stack.len() > 1 {
                    self.stack.pop();
                }
            }
            _ => {}
        }
        true
    }
}

/// Scans build output from a reader. The `directory` is where the build
/// was started.
pub fn scan(
    reader: impl BufRead,
    directory: &Path,
    processor: &mut CommandProcessor,
    sink: &mut dyn SettingsSink,
) -> Result<(), InputError> {
    let mut directories = DirectoryStack::new(directory);
    for line in lines(reader) {
        let line = line?;
        ScanStatistics::increment(&processor.statistics().lines_read);

        let line = line.trim();
        if line.is_empty() || directories.observe(line) {
            continue;
        }
        let line = NINJA_PROGRESS.find(line).map_or(line, |prefix| &line[prefix.end()..]);
        let invocation = Invocation {
            directory: directories.current().to_path_buf(),
            line: line.to_string(),
            file: None,
        };
        processor.process(&invocation, sink);
    }
    Ok(())
}

/// Splits the input on line separators, invalid UTF-8 is replaced.
fn lines(mut reader: impl BufRead) -> impl Iterator<Item = io::Result<String>> {
    let mut buffer = Vec::new();
    std::iter::from_fn(move || {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => None,
            Ok(_) => Some(Ok(String::from_utf8_lossy(&buffer).into_owned())),
            Err(error) => Some(Err(error)),
        }
    })
}
