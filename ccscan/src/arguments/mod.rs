// SPDX-License-Identifier: GPL-3.0-or-later

//! Tool argument parsers.
//!
//! An argument parser is offered the remaining text of a command line and
//! consumes one recognized option from its front. Each [`ArgumentRule`] covers
//! one option family (macro definitions, include paths, language standard...)
//! and turns what its matchers found into settings entries.
//!
//! Rules are data: a dialect is nothing more than an ordered list of rules.
//! The order is the priority, the first rule which consumes input wins.

mod gcc;
mod msvc;
mod nvcc;
mod posix;

use crate::matchers::{
    DOUBLE_QUOTED, END, IDENTIFIER, MACRO_NAME, OptionMatch, OptionMatcher, SINGLE_QUOTED,
    UNQUOTED,
};
use crate::settings::{ParseResult, SettingKind, SettingsEntry};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// Consumes a recognized option from the front of an argument string.
///
/// Implementations are stateless. The return value is the number of bytes
/// consumed, zero means the parser does not apply to the current argument.
pub trait ArgumentParser: Send + Sync {
    fn process(&self, result: &mut ParseResult, cwd: &Path, args: &str) -> usize;
}

/// What a matched option contributes to the parse result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    MacroDefine,
    MacroUndefine,
    IncludePath,
    SystemIncludePath,
    IncludeFile,
    MacroFile,
    /// The raw option is forwarded to the compiler built-in detection.
    BuiltinDetection,
}

/// One option family: the ways it can be spelled and what it means.
#[derive(Debug, Clone)]
pub struct ArgumentRule {
    family: &'static str,
    kind: ArgumentKind,
    matchers: Vec<OptionMatcher>,
}

impl ArgumentRule {
    pub fn new(family: &'static str, kind: ArgumentKind, matchers: Vec<OptionMatcher>) -> Self {
        Self { family, kind, matchers }
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    pub fn kind(&self) -> ArgumentKind {
        self.kind
    }

    fn apply(&self, result: &mut ParseResult, cwd: &Path, args: &str, found: OptionMatch) {
        match self.kind {
            ArgumentKind::MacroDefine => {
                result.add_entry(SettingsEntry::macro_define(found.name, found.value));
            }
            ArgumentKind::MacroUndefine => {
                result.add_entry(SettingsEntry::macro_undefine(found.name));
            }
            ArgumentKind::IncludePath => {
                result.add_entry(SettingsEntry::path(
                    SettingKind::IncludePath,
                    resolve_path(cwd, &found.name),
                ));
            }
            ArgumentKind::SystemIncludePath => {
                result.add_entry(SettingsEntry::path(
                    SettingKind::SystemIncludePath,
                    resolve_path(cwd, &found.name),
                ));
            }
            ArgumentKind::IncludeFile => {
                result.add_entry(SettingsEntry::path(
                    SettingKind::IncludeFile,
                    resolve_path(cwd, &found.name),
                ));
            }
            ArgumentKind::MacroFile => {
                result.add_entry(SettingsEntry::path(
                    SettingKind::MacroFile,
                    resolve_path(cwd, &found.name),
                ));
            }
            ArgumentKind::BuiltinDetection => {
                result.add_builtin_detection_arg(args[..found.consumed].trim_end());
            }
        }
    }
}

impl ArgumentParser for ArgumentRule {
    fn process(&self, result: &mut ParseResult, cwd: &Path, args: &str) -> usize {
        for matcher in &self.matchers {
            if let Some(found) = matcher.looking_at(args) {
                log::trace!("Option family '{}' consumed: {}", self.family, &args[..found.consumed]);
                let consumed = found.consumed;
                self.apply(result, cwd, args, found);
                return consumed;
            }
        }
        0
    }
}

/// The option syntax families a tool can understand.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// POSIX options plus the GCC specific ones (GCC, Clang, Intel on POSIX).
    Gcc,
    /// The GCC options, and the `cl` language standard switches a generic
    /// `cc` may be driven with.
    Cc,
    /// `cl` style options, with `/` or `-` prefix.
    Msvc,
    /// GCC options plus the NVCC long forms.
    Nvcc,
}

impl Dialect {
    /// The ordered argument rules of the dialect.
    pub fn rules(self) -> &'static [ArgumentRule] {
        match self {
            Dialect::Gcc => &GCC_RULES,
            Dialect::Cc => &CC_RULES,
            Dialect::Msvc => &MSVC_RULES,
            Dialect::Nvcc => &NVCC_RULES,
        }
    }
}

static GCC_RULES: LazyLock<Vec<ArgumentRule>> =
    LazyLock::new(|| [posix::rules(), gcc::rules()].concat());

static CC_RULES: LazyLock<Vec<ArgumentRule>> =
    LazyLock::new(|| [posix::rules(), gcc::rules(), msvc::standard_rules("/")].concat());

static MSVC_RULES: LazyLock<Vec<ArgumentRule>> = LazyLock::new(msvc::rules);

static NVCC_RULES: LazyLock<Vec<ArgumentRule>> =
    LazyLock::new(|| [nvcc::rules(), posix::rules(), gcc::rules()].concat());

/// How the option and its operand are separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Separation {
    /// Glued or separated by whitespace: `-Idir`, `-I dir`.
    Optional,
    /// Only as a separate argument: `-include file`.
    Required,
}

impl Separation {
    fn pattern(self) -> &'static str {
        match self {
            Separation::Optional => r"\s*",
            Separation::Required => r"\s+",
        }
    }
}

/// Matchers of a macro definition option. The `prefix` is a regex.
///
/// Tried in order: fully quoted name and value, quoted value (which may
/// hold escaped quotes), shell escaped quoted value, plain value, no value.
fn macro_define_matchers(prefix: &str) -> Vec<OptionMatcher> {
    vec![
        OptionMatcher::name_value(&format!(r#"{prefix}\s*"{MACRO_NAME}(?:=([^"]*))?"{END}"#), 1, 2),
        OptionMatcher::name_value(&format!(r"{prefix}\s*'{MACRO_NAME}(?:=([^']*))?'{END}"), 1, 2),
        OptionMatcher::name_value(&format!(r#"{prefix}\s*{MACRO_NAME}="((?:[^"\\]|\\.)*)"{END}"#), 1, 2)
            .shell_escaped(),
        OptionMatcher::name_value(&format!(r"{prefix}\s*{MACRO_NAME}={DOUBLE_QUOTED}{END}"), 1, 2),
        OptionMatcher::name_value(&format!(r"{prefix}\s*{MACRO_NAME}={SINGLE_QUOTED}{END}"), 1, 2),
        OptionMatcher::name_value(&format!(r#"{prefix}\s*{MACRO_NAME}=(\\".*?\\"){END}"#), 1, 2)
            .shell_escaped(),
        OptionMatcher::name_value(&format!(r"{prefix}\s*{MACRO_NAME}=(\\'.*?\\'){END}"), 1, 2)
            .shell_escaped(),
        OptionMatcher::name_value(&format!(r"{prefix}\s*{MACRO_NAME}=(\S*)"), 1, 2),
        OptionMatcher::name(&format!(r"{prefix}\s*{MACRO_NAME}{END}"), 1),
    ]
}

/// Matchers of a macro un-definition option.
fn macro_undefine_matchers(prefix: &str) -> Vec<OptionMatcher> {
    vec![OptionMatcher::name(&format!(r"{prefix}\s*{IDENTIFIER}{END}"), 1)]
}

/// Matchers of an option with a path operand, quoted or not.
fn path_matchers(prefix: &str, separation: Separation) -> Vec<OptionMatcher> {
    let separator = separation.pattern();
    vec![
        OptionMatcher::name(&format!(r"{prefix}{separator}{DOUBLE_QUOTED}{END}"), 1),
        OptionMatcher::name(&format!(r"{prefix}{separator}{SINGLE_QUOTED}{END}"), 1),
        OptionMatcher::name(&format!(r"{prefix}{separator}{UNQUOTED}"), 1),
    ]
}

/// Matchers of options which are forwarded verbatim. Each pattern must
/// capture the whole option in group 1.
fn verbatim_matchers(patterns: &[&str]) -> Vec<OptionMatcher> {
    patterns
        .iter()
        .map(|pattern| OptionMatcher::name(&format!("({pattern}){END}"), 1))
        .collect()
}

/// Makes a path absolute by prefixing the working directory when relative.
///
/// Some build script generators report include paths relative to the
/// compiler working directory, this undoes that.
pub fn resolve_path(cwd: &Path, name: &str) -> String {
    if is_absolute(name) {
        return name.to_string();
    }
    let cwd_text = cwd.to_string_lossy();
    if !cfg!(windows) && is_windows_absolute(&cwd_text) {
        // a Windows build recorded on a POSIX host, keep its conventions
        let trimmed = cwd_text.trim_end_matches(['\\', '/']);
        return format!("{trimmed}\\{name}");
    }
    normalize(&cwd.join(name)).to_string_lossy().to_string()
}

fn is_absolute(name: &str) -> bool {
    name.starts_with('/') || name.starts_with('\\') || is_windows_absolute(name) || Path::new(name).is_absolute()
}

/// Drive letter paths (`C:\x`, `c:/x`) are absolute on every host.
fn is_windows_absolute(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/')
}

/// Removes `.` and `..` components without touching the file system.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => result.push(".."),
            },
            other => result.push(other.as_os_str()),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{SettingKind, SettingsEntry};

    /// Runs the rules of a dialect on a single argument, like the command line
    /// parser loop would do for its first iteration.
    fn parse_one(dialect: Dialect, cwd: &str, args: &str) -> (ParseResult, usize) {
        let mut result = ParseResult::new();
        for rule in dialect.rules() {
            let consumed = rule.process(&mut result, Path::new(cwd), args);
            if consumed > 0 {
                return (result, consumed);
            }
        }
        (result, 0)
    }

    fn single_entry(dialect: Dialect, args: &str) -> SettingsEntry {
        let (result, consumed) = parse_one(dialect, "/proj/build", args);
        assert!(consumed > 0, "nothing consumed from: {args}");
        assert_eq!(result.entries().len(), 1, "for: {args}");
        result.entries()[0].clone()
    }

    #[test]
    fn test_macro_define_forms() {
        let cases: &[(&str, &str, Option<&str>)] = &[
            ("-DNAME=VALUE", "NAME", Some("VALUE")),
            ("-DNAME", "NAME", None),
            ("-DNAME=", "NAME", Some("")),
            ("-D NAME=1", "NAME", Some("1")),
            ("-DFUNC(x,y)=body", "FUNC(x,y)", Some("body")),
            (r#"-DMSG="hello world""#, "MSG", Some("hello world")),
            (r"-DMSG='hello world'", "MSG", Some("hello world")),
            (r#"-D"MSG=hello world""#, "MSG", Some("hello world")),
            (r"-D'FUNC(a, b)=a+b'", "FUNC(a, b)", Some("a+b")),
            (r#"-DMSG=\"hello world\""#, "MSG", Some(r#""hello world""#)),
            (r"-DCH=\'x\'", "CH", Some("'x'")),
            (r#"-DMSG="say \"hi\" now""#, "MSG", Some(r#"say "hi" now"#)),
            (r#"-DWIN="C:\dir\""#, "WIN", Some(r"C:\dir\")),
            ("-D$dollar=1", "$dollar", Some("1")),
        ];
        for (args, name, value) in cases {
            let entry = single_entry(Dialect::Gcc, args);
            assert_eq!(entry.kind, SettingKind::MacroDefine, "for: {args}");
            assert_eq!(entry.name, *name, "for: {args}");
            assert_eq!(entry.value.as_deref(), *value, "for: {args}");
            assert!(entry.read_only);
        }
    }

    #[test]
    fn test_macro_define_consumes_whole_quoted_value() {
        let args = r#"-DMSG="hello world" main.c"#;
        let (_, consumed) = parse_one(Dialect::Gcc, "/", args);

        assert_eq!(args[consumed..].trim_start(), "main.c");
    }

    #[test]
    fn test_macro_undefine() {
        let entry = single_entry(Dialect::Gcc, "-UNAME");
        assert_eq!(entry, SettingsEntry::macro_undefine("NAME"));

        let entry = single_entry(Dialect::Msvc, "/U NAME");
        assert_eq!(entry, SettingsEntry::macro_undefine("NAME"));
    }

    #[test]
    fn test_include_path_forms() {
        let cases: &[(&str, &str)] = &[
            ("-I/usr/include", "/usr/include"),
            ("-I /usr/include", "/usr/include"),
            ("-Iinclude", "/proj/build/include"),
            ("-I../include", "/proj/include"),
            ("-I./gen/../include", "/proj/build/include"),
            (r#"-I"/opt/my dir""#, "/opt/my dir"),
            (r"-I'rel dir'", "/proj/build/rel dir"),
        ];
        for (args, path) in cases {
            let entry = single_entry(Dialect::Gcc, args);
            assert_eq!(entry.kind, SettingKind::IncludePath, "for: {args}");
            assert_eq!(entry.name, *path, "for: {args}");
        }
    }

    #[test]
    fn test_system_include_path() {
        let entry = single_entry(Dialect::Gcc, "-isystem /usr/local/include");
        assert_eq!(entry.kind, SettingKind::SystemIncludePath);
        assert_eq!(entry.name, "/usr/local/include");

        let entry = single_entry(Dialect::Gcc, "-idirafter after");
        assert_eq!(entry.kind, SettingKind::SystemIncludePath);
        assert_eq!(entry.name, "/proj/build/after");
    }

    #[test]
    fn test_include_and_macro_files() {
        let entry = single_entry(Dialect::Gcc, "-include config.h");
        assert_eq!(entry.kind, SettingKind::IncludeFile);
        assert_eq!(entry.name, "/proj/build/config.h");

        let entry = single_entry(Dialect::Gcc, "-imacros /p/macros.h");
        assert_eq!(entry.kind, SettingKind::MacroFile);
        assert_eq!(entry.name, "/p/macros.h");
    }

    #[test]
    fn test_builtin_detection_arguments() {
        let cases: &[(&str, &str)] = &[
            ("-std=c++17 main.cpp", "-std=c++17"),
            ("--std=gnu11", "--std=gnu11"),
            ("-ansi -c", "-ansi"),
            ("--sysroot=/x", "--sysroot=/x"),
            ("--sysroot /x -c", "--sysroot /x"),
            (r#"--sysroot="/my root" -c"#, r#"--sysroot="/my root""#),
            ("-isysroot /sdk", "-isysroot /sdk"),
            ("-nostdinc++", "-nostdinc++"),
            ("-m32", "-m32"),
            ("-march=armv7-a", "-march=armv7-a"),
        ];
        for (args, expected) in cases {
            let (result, consumed) = parse_one(Dialect::Gcc, "/", args);
            assert!(consumed > 0, "for: {args}");
            assert!(result.entries().is_empty(), "for: {args}");
            assert_eq!(result.builtin_detection_args(), [*expected], "for: {args}");
        }
    }

    #[test]
    fn test_unknown_options_are_not_consumed() {
        for args in ["-c main.c", "-Wall", "-O2", "--some-unknown-future-flag=zzz", "-mthumb", "main.c"] {
            let (result, consumed) = parse_one(Dialect::Gcc, "/", args);
            assert_eq!(consumed, 0, "for: {args}");
            assert!(result.is_empty(), "for: {args}");
        }
    }

    #[test]
    fn test_msvc_options() {
        let entry = single_entry(Dialect::Msvc, "/DWIN32");
        assert_eq!(entry, SettingsEntry::macro_define("WIN32", None));

        let entry = single_entry(Dialect::Msvc, "-D_DEBUG=1");
        assert_eq!(entry, SettingsEntry::macro_define("_DEBUG", Some("1".to_string())));

        let entry = single_entry(Dialect::Msvc, r"/IC:\sdk\include");
        assert_eq!(entry.kind, SettingKind::IncludePath);
        assert_eq!(entry.name, r"C:\sdk\include");

        let entry = single_entry(Dialect::Msvc, r#"/I "C:\Program Files\inc""#);
        assert_eq!(entry.name, r"C:\Program Files\inc");

        let entry = single_entry(Dialect::Msvc, r"/external:I C:\ext");
        assert_eq!(entry.kind, SettingKind::SystemIncludePath);

        let entry = single_entry(Dialect::Msvc, "/FI pch.h");
        assert_eq!(entry.kind, SettingKind::IncludeFile);

        let (result, _) = parse_one(Dialect::Msvc, "/", "/std:c++17 /c");
        assert_eq!(result.builtin_detection_args(), ["/std:c++17"]);

        // GCC spelling of the system include option means nothing to cl
        let (_, consumed) = parse_one(Dialect::Msvc, "/", "-isystem /x");
        assert_eq!(consumed, 0);
    }

    #[test]
    fn test_cc_dialect() {
        let (result, _) = parse_one(Dialect::Cc, "/", "-std=c11 -c");
        assert_eq!(result.builtin_detection_args(), ["-std=c11"]);

        let (result, _) = parse_one(Dialect::Cc, "/", "/std:c11 /c");
        assert_eq!(result.builtin_detection_args(), ["/std:c11"]);

        let entry = single_entry(Dialect::Cc, "-DX=1");
        assert_eq!(entry.kind, SettingKind::MacroDefine);

        // only the standard switches of cl, a path is not a define
        let (result, consumed) = parse_one(Dialect::Cc, "/", "/Developer/a.c");
        assert!(result.is_empty());
        assert_eq!(consumed, 0);
    }

    #[test]
    fn test_windows_working_directory_on_posix_host() {
        if cfg!(windows) {
            return;
        }
        let (result, _) = parse_one(Dialect::Msvc, r"C:\build", "/Iinclude");
        assert_eq!(result.entries()[0].name, r"C:\build\include");
    }

    #[test]
    fn test_nvcc_options() {
        let entry = single_entry(Dialect::Nvcc, "--define-macro=USE_CUDA=1");
        assert_eq!(entry, SettingsEntry::macro_define("USE_CUDA", Some("1".to_string())));

        let entry = single_entry(Dialect::Nvcc, "--system-include /usr/local/cuda/include");
        assert_eq!(entry.kind, SettingKind::SystemIncludePath);
        assert_eq!(entry.name, "/usr/local/cuda/include");

        let entry = single_entry(Dialect::Nvcc, "--include-path=inc");
        assert_eq!(entry.kind, SettingKind::IncludePath);
        assert_eq!(entry.name, "/proj/build/inc");

        let (result, _) = parse_one(Dialect::Nvcc, "/", "--std c++17 -c");
        assert_eq!(result.builtin_detection_args(), ["--std c++17"]);

        // the POSIX set is layered below
        let entry = single_entry(Dialect::Nvcc, "-DX=1");
        assert_eq!(entry, SettingsEntry::macro_define("X", Some("1".to_string())));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        assert_eq!(resolve_path(Path::new("/cwd"), "/abs"), "/abs");
        assert_eq!(resolve_path(Path::new("/cwd"), r"D:\abs"), r"D:\abs");
        assert_eq!(resolve_path(Path::new("/cwd"), "c:/abs"), "c:/abs");
        assert_eq!(resolve_path(Path::new("/cwd"), r"\\server\share"), r"\\server\share");
    }
}
