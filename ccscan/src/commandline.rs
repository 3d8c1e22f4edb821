// SPDX-License-Identifier: GPL-3.0-or-later

//! The argument loop of a recognized tool.
//!
//! After detection has stripped the tool name off a command line, the
//! [`ToolCommandlineParser`] of that tool decomposes the remainder. Each
//! iteration consumes one argument: by an argument rule of the dialect, by the
//! response file parser, or by skipping to the next whitespace. Unknown
//! arguments are ignored, they never stop the extraction.

use crate::arguments::{ArgumentParser, Dialect};
use crate::matchers::skip_to_whitespace;
use crate::response_file::{self, ContentProvider, ResponseFileParser, ResponseFileTarget};
use crate::settings::{BuiltinDetection, Language, ParseResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How deep response files may reference other response files.
pub const MAX_RESPONSE_FILE_DEPTH: usize = 16;

/// The compiler families the detectors can be registered for.
///
/// A family selects the option dialect and the built-in detection method.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolFamily {
    Gcc,
    Clang,
    /// The generic `cc`, which can be anything.
    Cc,
    Msvc,
    Intel,
    IntelMsvc,
    Nvcc,
}

impl ToolFamily {
    pub fn dialect(self) -> Dialect {
        match self {
            ToolFamily::Gcc | ToolFamily::Clang | ToolFamily::Intel => Dialect::Gcc,
            ToolFamily::Cc => Dialect::Cc,
            ToolFamily::Msvc | ToolFamily::IntelMsvc => Dialect::Msvc,
            ToolFamily::Nvcc => Dialect::Nvcc,
        }
    }

    pub fn builtin_detection(self) -> BuiltinDetection {
        match self {
            ToolFamily::Gcc | ToolFamily::Clang => BuiltinDetection::Gcc,
            ToolFamily::Cc => BuiltinDetection::GccIfDashPrefixed,
            ToolFamily::Msvc => BuiltinDetection::Msvc,
            ToolFamily::Intel | ToolFamily::IntelMsvc => BuiltinDetection::Intel,
            ToolFamily::Nvcc => BuiltinDetection::Nvcc,
        }
    }
}

/// Parses the arguments of one tool.
///
/// Immutable once constructed, shared by every detector of the tool.
#[derive(Debug, Clone)]
pub struct ToolCommandlineParser {
    family: ToolFamily,
    /// `None` means the language follows the source file extension.
    language: Option<Language>,
    response_file: Option<&'static ResponseFileParser>,
}

impl ToolCommandlineParser {
    pub fn new(family: ToolFamily, language: Option<Language>) -> Self {
        Self {
            family,
            language,
            response_file: Some(ResponseFileParser::at_sign()),
        }
    }

    /// Turns off response file expansion, `@` arguments are skipped.
    pub fn without_response_files(mut self) -> Self {
        self.response_file = None;
        self
    }

    pub fn family(&self) -> ToolFamily {
        self.family
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn builtin_detection(&self) -> BuiltinDetection {
        self.family.builtin_detection()
    }

    /// Parses the arguments of one invocation.
    ///
    /// Relative paths, in the arguments and in response file references,
    /// resolve against `cwd`.
    pub fn parse(&self, cwd: &Path, args: &str, content: &dyn ContentProvider) -> ParseResult {
        let mut result = ParseResult::new();
        self.parse_into(&mut result, cwd, args, content, 0);
        result
    }

    fn parse_into(
        &self,
        result: &mut ParseResult,
        cwd: &Path,
        args: &str,
        content: &dyn ContentProvider,
        depth: usize,
    ) {
        let mut rest = args.trim_start();
        while !rest.is_empty() {
            let consumed = self.consume_one(result, cwd, rest, content, depth);
            rest = rest[consumed..].trim_start();
        }
    }

    /// Consumes exactly one argument from the front of `rest`, which is
    /// trimmed and not empty. Always returns a positive count.
    fn consume_one(
        &self,
        result: &mut ParseResult,
        cwd: &Path,
        rest: &str,
        content: &dyn ContentProvider,
        depth: usize,
    ) -> usize {
        for rule in self.family.dialect().rules() {
            let consumed = rule.process(result, cwd, rest);
            if consumed > 0 {
                return consumed;
            }
        }
        if let Some(reference) = self.response_file.and_then(|parser| parser.recognize(cwd, rest)) {
            if let ResponseFileTarget::File(path) = &reference.target {
                self.expand(result, cwd, path, content, depth);
            }
            return reference.consumed;
        }
        let skipped = skip_to_whitespace(rest);
        log::trace!("Ignored argument: {}", &rest[..skipped]);
        skipped
    }

    fn expand(
        &self,
        result: &mut ParseResult,
        cwd: &Path,
        path: &Path,
        content: &dyn ContentProvider,
        depth: usize,
    ) {
        if depth >= MAX_RESPONSE_FILE_DEPTH {
            log::warn!(
                "Response file {} is nested too deep, it is not read (limit: {})",
                path.display(),
                MAX_RESPONSE_FILE_DEPTH
            );
            return;
        }
        if let Some(text) = response_file::load(content, path) {
            log::debug!("Expanding response file {}", path.display());
            self.parse_into(result, cwd, &text, content, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{SettingKind, SettingsEntry};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::path::PathBuf;

    /// In-memory response files, remembering every path requested.
    #[derive(Default)]
    struct FakeFiles {
        files: HashMap<PathBuf, String>,
        requested: RefCell<Vec<PathBuf>>,
    }

    impl FakeFiles {
        fn with(mut self, path: &str, content: &str) -> Self {
            self.files.insert(PathBuf::from(path), content.to_string());
            self
        }
    }

    impl ContentProvider for FakeFiles {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.requested.borrow_mut().push(path.to_path_buf());
            self.files
                .get(path)
                .map(|content| content.as_bytes().to_vec())
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn gcc() -> ToolCommandlineParser {
        ToolCommandlineParser::new(ToolFamily::Gcc, None)
    }

    fn define(name: &str, value: &str) -> SettingsEntry {
        SettingsEntry::macro_define(name, Some(value.to_string()))
    }

    fn include(path: &str) -> SettingsEntry {
        SettingsEntry::path(SettingKind::IncludePath, path)
    }

    #[test]
    fn test_parse_full_command_line() {
        let result = gcc().parse(
            Path::new("/p"),
            "-DNDEBUG -I/p/inc -isystem /usr/local/include -std=c11 -c a.c -o a.o",
            &FakeFiles::default(),
        );

        assert_eq!(
            result.entries(),
            [
                SettingsEntry::macro_define("NDEBUG", None),
                include("/p/inc"),
                SettingsEntry::path(SettingKind::SystemIncludePath, "/usr/local/include"),
            ]
        );
        assert_eq!(result.builtin_detection_args(), ["-std=c11"]);
    }

    #[test]
    fn test_unknown_flags_do_not_block_neighbours() {
        let result = gcc().parse(
            Path::new("/p"),
            "-DX=1 --some-unknown-future-flag=zzz -Iinc",
            &FakeFiles::default(),
        );

        assert_eq!(result.entries(), [define("X", "1"), include("/p/inc")]);
    }

    #[test]
    fn test_parse_is_repeatable() {
        let sut = gcc();
        let files = FakeFiles::default();
        let args = r#"-DA -DB="x y" -I../inc -UC -include cfg.h"#;

        let first = sut.parse(Path::new("/p/build"), args, &files);
        let second = sut.parse(Path::new("/p/build"), args, &files);

        assert_eq!(first, second);
        assert_eq!(first.entries().len(), 5);
    }

    #[test]
    fn test_response_file_expansion_keeps_order() {
        let files = FakeFiles::default().with("/p/args.rsp", "-DX=1 -Iabc");

        let result = gcc().parse(Path::new("/p"), "@args.rsp -DY=2", &files);

        assert_eq!(result.entries(), [define("X", "1"), include("/p/abc"), define("Y", "2")]);
    }

    #[test]
    fn test_nested_response_files() {
        let files = FakeFiles::default()
            .with("/p/outer.rsp", "-DA=1 @inner.rsp -DC=3")
            .with("/p/inner.rsp", "-DB=2");

        let result = gcc().parse(Path::new("/p"), "@outer.rsp", &files);

        assert_eq!(result.entries(), [define("A", "1"), define("B", "2"), define("C", "3")]);
    }

    #[test]
    fn test_heredoc_is_never_opened() {
        let files = FakeFiles::default();

        let result = gcc().parse(Path::new("/p"), "@<< -DZ=1 <<", &files);

        assert_eq!(result.entries(), [define("Z", "1")]);
        assert!(files.requested.borrow().is_empty());
    }

    #[test]
    fn test_missing_response_file_is_consumed() {
        let files = FakeFiles::default();

        let result = gcc().parse(Path::new("/p"), "@missing.rsp -DY=2", &files);

        assert_eq!(result.entries(), [define("Y", "2")]);
        assert_eq!(*files.requested.borrow(), [PathBuf::from("/p/missing.rsp")]);
    }

    #[test]
    fn test_self_referencing_response_file_terminates() {
        let files = FakeFiles::default().with("/p/loop.rsp", "-DL=1 @loop.rsp");

        let result = gcc().parse(Path::new("/p"), "@loop.rsp", &files);

        assert_eq!(result.entries().len(), MAX_RESPONSE_FILE_DEPTH);
        assert_eq!(files.requested.borrow().len(), MAX_RESPONSE_FILE_DEPTH);
    }

    #[test]
    fn test_without_response_files() {
        let files = FakeFiles::default().with("/p/args.rsp", "-DX=1");
        let sut = gcc().without_response_files();

        let result = sut.parse(Path::new("/p"), "@args.rsp -DY=2", &files);

        assert_eq!(result.entries(), [define("Y", "2")]);
        assert!(files.requested.borrow().is_empty());
    }

    #[test]
    fn test_msvc_dialect() {
        let sut = ToolCommandlineParser::new(ToolFamily::Msvc, None);

        let result = sut.parse(
            Path::new("/p"),
            "/nologo /DWIN32 /D_DEBUG=1 /I inc /std:c++17 /c main.cpp",
            &FakeFiles::default(),
        );

        assert_eq!(
            result.entries(),
            [SettingsEntry::macro_define("WIN32", None), define("_DEBUG", "1"), include("/p/inc")]
        );
        assert_eq!(result.builtin_detection_args(), ["/std:c++17"]);
        assert_eq!(sut.builtin_detection(), BuiltinDetection::Msvc);
    }

    #[test]
    fn test_family_classification() {
        assert_eq!(ToolFamily::Cc.builtin_detection(), BuiltinDetection::GccIfDashPrefixed);
        assert_eq!(ToolFamily::Cc.dialect(), Dialect::Cc);
        assert_eq!(ToolFamily::IntelMsvc.dialect(), Dialect::Msvc);
        assert_eq!(ToolFamily::Nvcc.dialect(), Dialect::Nvcc);
        assert_eq!(ToolFamily::Clang.builtin_detection(), BuiltinDetection::Gcc);
    }
}
