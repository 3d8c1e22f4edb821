// SPDX-License-Identifier: GPL-3.0-or-later

//! The options every POSIX compiler driver understands.

use super::{
    ArgumentKind, ArgumentRule, Separation, macro_define_matchers, macro_undefine_matchers,
    path_matchers,
};

pub(super) fn rules() -> Vec<ArgumentRule> {
    vec![
        ArgumentRule::new("macro-define", ArgumentKind::MacroDefine, macro_define_matchers("-D")),
        ArgumentRule::new("macro-undefine", ArgumentKind::MacroUndefine, macro_undefine_matchers("-U")),
        ArgumentRule::new(
            "include-path",
            ArgumentKind::IncludePath,
            path_matchers("-I", Separation::Optional),
        ),
        ArgumentRule::new(
            "system-include-path",
            ArgumentKind::SystemIncludePath,
            path_matchers("-isystem", Separation::Optional),
        ),
    ]
}
