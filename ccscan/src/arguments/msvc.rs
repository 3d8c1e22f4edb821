// SPDX-License-Identifier: GPL-3.0-or-later

//! Options of `cl` and the compilers mimicking it (`clang-cl`, `icl`).
//!
//! Every option can be spelled with a `/` or a `-` prefix.

use super::{
    ArgumentKind, ArgumentRule, Separation, macro_define_matchers, macro_undefine_matchers,
    path_matchers, verbatim_matchers,
};

pub(super) fn rules() -> Vec<ArgumentRule> {
    vec![
        ArgumentRule::new("macro-define", ArgumentKind::MacroDefine, macro_define_matchers("[-/]D")),
        ArgumentRule::new(
            "macro-undefine",
            ArgumentKind::MacroUndefine,
            macro_undefine_matchers("[-/]U"),
        ),
        ArgumentRule::new(
            "include-path",
            ArgumentKind::IncludePath,
            path_matchers("[-/]I", Separation::Optional),
        ),
        ArgumentRule::new(
            "system-include-path",
            ArgumentKind::SystemIncludePath,
            [
                path_matchers("[-/]external:I", Separation::Optional),
                path_matchers("[-/]imsvc", Separation::Optional),
            ]
            .concat(),
        ),
        ArgumentRule::new(
            "include-file",
            ArgumentKind::IncludeFile,
            path_matchers("[-/]FI", Separation::Optional),
        ),
    ]
    .into_iter()
    .chain(standard_rules("[-/]"))
    .collect()
}

/// The language standard switches, with the given prefix regex.
pub(super) fn standard_rules(prefix: &str) -> Vec<ArgumentRule> {
    let standard = format!(r"{prefix}std:\S+");
    let conformance = format!(r"{prefix}Zc:\S+");
    vec![ArgumentRule::new(
        "language-standard",
        ArgumentKind::BuiltinDetection,
        verbatim_matchers(&[standard.as_str(), conformance.as_str()]),
    )]
}
