// SPDX-License-Identifier: GPL-3.0-or-later

//! The long option forms of the CUDA compiler driver.
//!
//! The short forms are the GCC ones, those rules are layered below these.

use super::{
    ArgumentKind, ArgumentRule, Separation, macro_define_matchers, macro_undefine_matchers,
    path_matchers, verbatim_matchers,
};

pub(super) fn rules() -> Vec<ArgumentRule> {
    vec![
        ArgumentRule::new(
            "macro-define",
            ArgumentKind::MacroDefine,
            macro_define_matchers(r"--define-macro[=\s]"),
        ),
        ArgumentRule::new(
            "macro-undefine",
            ArgumentKind::MacroUndefine,
            macro_undefine_matchers(r"--undefine-macro[=\s]"),
        ),
        ArgumentRule::new(
            "include-path",
            ArgumentKind::IncludePath,
            path_matchers(r"--include-path[=\s]", Separation::Optional),
        ),
        ArgumentRule::new(
            "system-include-path",
            ArgumentKind::SystemIncludePath,
            path_matchers(r"--system-include[=\s]", Separation::Optional),
        ),
        ArgumentRule::new(
            "include-file",
            ArgumentKind::IncludeFile,
            path_matchers(r"--pre-include[=\s]", Separation::Optional),
        ),
        ArgumentRule::new(
            "language-standard",
            ArgumentKind::BuiltinDetection,
            verbatim_matchers(&[r"--std[=\s]\s*\S+", r"-std\s+\S+"]),
        ),
    ]
}
