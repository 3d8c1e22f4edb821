// SPDX-License-Identifier: GPL-3.0-or-later

//! GCC specific options, on top of the POSIX ones.
//!
//! Clang and the Intel compilers on POSIX accept the same spelling.

use super::{ArgumentKind, ArgumentRule, Separation, path_matchers, verbatim_matchers};

pub(super) fn rules() -> Vec<ArgumentRule> {
    vec![
        ArgumentRule::new(
            "include-file",
            ArgumentKind::IncludeFile,
            path_matchers("-include", Separation::Required),
        ),
        ArgumentRule::new(
            "macro-file",
            ArgumentKind::MacroFile,
            path_matchers("-imacros", Separation::Required),
        ),
        ArgumentRule::new(
            "quote-include-path",
            ArgumentKind::IncludePath,
            path_matchers("-iquote", Separation::Optional),
        ),
        ArgumentRule::new(
            "after-include-path",
            ArgumentKind::SystemIncludePath,
            path_matchers("-idirafter", Separation::Optional),
        ),
        ArgumentRule::new(
            "language-standard",
            ArgumentKind::BuiltinDetection,
            verbatim_matchers(&[r"--?std=\S+", r"-ansi"]),
        ),
        ArgumentRule::new(
            "sysroot",
            ArgumentKind::BuiltinDetection,
            verbatim_matchers(&[
                r#"--sysroot="[^"]*""#,
                r"--sysroot='[^']*'",
                r"--sysroot=\S+",
                r"--sysroot\s+\S+",
                r"-isysroot\s*\S+",
            ]),
        ),
        ArgumentRule::new(
            "standard-includes",
            ArgumentKind::BuiltinDetection,
            verbatim_matchers(&[r"-nostdinc(?:\+\+)?", r"-nostdlibinc"]),
        ),
        ArgumentRule::new(
            "target",
            ArgumentKind::BuiltinDetection,
            verbatim_matchers(&[r"-m(?:32|64|x32)", r"-m(?:arch|cpu)=\S+", r"--target=\S+"]),
        ),
    ]
}
