// SPDX-License-Identifier: GPL-3.0-or-later

//! Recognition of one tool at the front of a command line.
//!
//! A detector holds the compiled patterns for every way the tool can appear:
//! with or without a directory, quoted or not, with a version suffix and with
//! a file name extension. Which of these are available depends on how the
//! detector was registered.

use crate::commandline::ToolCommandlineParser;
use regex_lite::Regex;
use std::fmt;
use std::sync::Arc;

/// The four ways a tool name is tried, in order of preference.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum DetectionMethod {
    Basename,
    WithVersion,
    WithExtension,
    WithVersionAndExtension,
}

impl DetectionMethod {
    pub const ALL: [DetectionMethod; 4] = [
        DetectionMethod::Basename,
        DetectionMethod::WithVersion,
        DetectionMethod::WithExtension,
        DetectionMethod::WithVersionAndExtension,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectionMethod::Basename => "basename",
            DetectionMethod::WithVersion => "basename with version",
            DetectionMethod::WithExtension => "basename with extension",
            DetectionMethod::WithVersionAndExtension => "basename with version and extension",
        };
        write!(f, "{}", name)
    }
}

/// Directory separator convention of the tool path.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum PathStyle {
    /// Forward slashes.
    Posix,
    /// Backslashes, as on NTFS.
    Windows,
}

impl PathStyle {
    fn separator(self) -> &'static str {
        match self {
            PathStyle::Posix => "/",
            PathStyle::Windows => r"\\",
        }
    }
}

/// The tool token and the arguments after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// The tool as written, without the quotes.
    pub command: String,
    pub arguments: String,
}

/// The quoted and unquoted pattern for one detection method.
#[derive(Debug, Clone)]
struct PathPatterns {
    quoted: Regex,
    unquoted: Regex,
}

impl PathPatterns {
    fn new(name: &str, style: PathStyle) -> Result<Self, regex_lite::Error> {
        let separator = style.separator();
        Ok(Self {
            quoted: Regex::new(&format!(r#"^"((?:[^"]*{separator})?{name})"\s"#))?,
            unquoted: Regex::new(&format!(r"^((?:\S*{separator})?{name})\s"))?,
        })
    }

    fn matches(&self, line: &str) -> Option<MatchResult> {
        [&self.quoted, &self.unquoted].into_iter().find_map(|regex| {
            let captures = regex.captures(line)?;
            let whole = captures.get(0)?;
            Some(MatchResult {
                command: captures.get(1)?.as_str().to_string(),
                arguments: line[whole.end()..].to_string(),
            })
        })
    }
}

/// Detects one tool, for one path style.
#[derive(Debug, Clone)]
pub struct Detector {
    name: String,
    style: PathStyle,
    patterns: [Option<PathPatterns>; 4],
    parser: Arc<ToolCommandlineParser>,
}

impl Detector {
    /// Compiles the patterns of a tool.
    ///
    /// The `name` and `extension` are regexes. The version and extension
    /// methods are only available when the respective regex is given.
    pub fn new(
        name: &str,
        extension: Option<&str>,
        version: Option<&str>,
        style: PathStyle,
        parser: Arc<ToolCommandlineParser>,
    ) -> Result<Self, regex_lite::Error> {
        // the name may be an alternation, keep it together
        let base = format!("(?:{name})");
        let with_version = version.map(|version| format!("{base}(?:{version})"));
        let with_extension = extension.map(|extension| format!(r"{base}\.(?i:{extension})"));
        let with_both = match (version, extension) {
            (Some(version), Some(extension)) => {
                Some(format!(r"{base}(?:{version})\.(?i:{extension})"))
            }
            _ => None,
        };

        let compile = |pattern: Option<String>| {
            pattern
                .map(|pattern| PathPatterns::new(&pattern, style))
                .transpose()
        };
        Ok(Self {
            name: name.to_string(),
            style,
            patterns: [
                Some(PathPatterns::new(&base, style)?),
                compile(with_version)?,
                compile(with_extension)?,
                compile(with_both)?,
            ],
            parser,
        })
    }

    /// Tries to match the tool at the start of the line with one method.
    pub fn matches(&self, line: &str, method: DetectionMethod) -> Option<MatchResult> {
        self.patterns[method.index()].as_ref()?.matches(line)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn style(&self) -> PathStyle {
        self.style
    }

    pub fn parser(&self) -> &ToolCommandlineParser {
        &self.parser
    }
}
