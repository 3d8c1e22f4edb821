// SPDX-License-Identifier: GPL-3.0-or-later

//! Response file (`@file`) recognition and loading.
//!
//! The parser here only recognizes the reference and resolves its path. The
//! content is fed back into the argument loop by the command line parser,
//! which owns the recursion.

use crate::arguments::resolve_path;
use crate::matchers::{DOUBLE_QUOTED, END, OptionMatcher, SINGLE_QUOTED, UNQUOTED};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Access to the content of response files.
pub trait ContentProvider {
    /// Returns the raw bytes of the file at the given (absolute) path.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads response files from the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystem;

impl ContentProvider for FileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Heredoc marker, the arguments follow on the command line itself.
const HEREDOC: &str = "<<";

/// What a recognized response file reference points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFileTarget {
    /// `@<<`: nothing to read, the arguments are inline.
    Heredoc,
    /// A file, resolved against the working directory.
    File(PathBuf),
}

/// A recognized response file reference at the front of the arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFileReference {
    pub target: ResponseFileTarget,
    pub consumed: usize,
}

/// Recognizes response file references with a given marker.
#[derive(Debug, Clone)]
pub struct ResponseFileParser {
    matchers: Vec<OptionMatcher>,
}

impl ResponseFileParser {
    /// Creates a parser for the given marker regex. Quoted file names are
    /// tried before the unquoted form.
    pub fn new(marker: &str) -> Self {
        Self {
            matchers: vec![
                OptionMatcher::name(&format!("{marker}{DOUBLE_QUOTED}{END}"), 1),
                OptionMatcher::name(&format!("{marker}{SINGLE_QUOTED}{END}"), 1),
                OptionMatcher::name(&format!("{marker}{UNQUOTED}"), 1),
            ],
        }
    }

    /// The `@file` syntax, understood by every supported compiler.
    pub fn at_sign() -> &'static ResponseFileParser {
        static AT_SIGN: LazyLock<ResponseFileParser> = LazyLock::new(|| ResponseFileParser::new("@"));
        &AT_SIGN
    }

    /// Recognizes a response file reference at the start of `args`.
    pub fn recognize(&self, cwd: &Path, args: &str) -> Option<ResponseFileReference> {
        let found = self.matchers.iter().find_map(|matcher| matcher.looking_at(args))?;
        let target = if found.name == HEREDOC {
            ResponseFileTarget::Heredoc
        } else {
            ResponseFileTarget::File(PathBuf::from(resolve_path(cwd, &found.name)))
        };
        Some(ResponseFileReference { target, consumed: found.consumed })
    }
}

/// Loads the content of a response file as text.
///
/// Failures are reported and swallowed, the caller continues with the rest of
/// the command line. Byte order marks select the encoding, UTF-8 otherwise.
pub fn load(provider: &dyn ContentProvider, path: &Path) -> Option<String> {
    match provider.read(path) {
        Ok(bytes) => {
            let (text, encoding, malformed) = encoding_rs::UTF_8.decode(&bytes);
            if malformed {
                log::debug!("Response file {} is not valid {}", path.display(), encoding.name());
            }
            Some(text.into_owned())
        }
        Err(error) => {
            log::warn!("Failed to read response file {}: {}", path.display(), error);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unquoted_reference() {
        let sut = ResponseFileParser::at_sign();

        let result = sut.recognize(Path::new("/proj"), "@args.rsp -DY=2").unwrap();
        assert_eq!(result.target, ResponseFileTarget::File(PathBuf::from("/proj/args.rsp")));
        assert_eq!(result.consumed, "@args.rsp".len());
    }

    #[test]
    fn test_quoted_references() {
        let sut = ResponseFileParser::at_sign();

        let result = sut.recognize(Path::new("/proj"), r#"@"my file.rsp" -c"#).unwrap();
        assert_eq!(result.target, ResponseFileTarget::File(PathBuf::from("/proj/my file.rsp")));

        let result = sut.recognize(Path::new("/proj"), "@'/abs/other.rsp'").unwrap();
        assert_eq!(result.target, ResponseFileTarget::File(PathBuf::from("/abs/other.rsp")));
    }

    #[test]
    fn test_heredoc_marker() {
        let sut = ResponseFileParser::at_sign();

        let result = sut.recognize(Path::new("/proj"), "@<< -DZ=1 <<").unwrap();
        assert_eq!(result.target, ResponseFileTarget::Heredoc);
        assert_eq!(result.consumed, "@<<".len());
    }

    #[test]
    fn test_not_a_reference() {
        let sut = ResponseFileParser::at_sign();

        assert_eq!(sut.recognize(Path::new("/proj"), "-DX=1 @args"), None);
        assert_eq!(sut.recognize(Path::new("/proj"), "@"), None);
    }

    #[test]
    fn test_load_from_file_system() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "-DX=1 -Iabc").unwrap();

        assert_eq!(load(&FileSystem, file.path()).as_deref(), Some("-DX=1 -Iabc"));
    }

    #[test]
    fn test_load_utf16_with_byte_order_mark() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend("-DW=1".encode_utf16().flat_map(u16::to_le_bytes));
        file.write_all(&bytes).unwrap();

        assert_eq!(load(&FileSystem, file.path()).as_deref(), Some("-DW=1"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(load(&FileSystem, &dir.path().join("missing.rsp")), None);
    }
}
