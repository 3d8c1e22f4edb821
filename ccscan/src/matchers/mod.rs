// SPDX-License-Identifier: GPL-3.0-or-later

//! Regex based option matching at the front of an argument string.
//!
//! The command line is not split into words before parsing. Instead each
//! option matcher is offered the remaining (left trimmed) text and reports how
//! many characters it would consume. This keeps quoting intact, so values like
//! `-DMSG="hello world"` survive as a single argument.
//!
//! This module only knows HOW an option is spelled. What the matched option
//! means is decided by the argument parsers which own these matchers.

mod source;

use regex_lite::Regex;

pub use source::looks_like_a_source_file;

/// Matches a macro name, with an optional parameter list: `FOO` or `FOO(a,b)`.
pub const MACRO_NAME: &str = r"([\w$]+(?:\([\w$, ]*\))?)";
/// Matches a plain identifier, no parameter list.
pub const IDENTIFIER: &str = r"([\w$]+)";
/// Matches a double quoted string, the content is captured.
pub const DOUBLE_QUOTED: &str = r#""([^"]*)""#;
/// Matches a single quoted string, the content is captured.
pub const SINGLE_QUOTED: &str = r"'([^']*)'";
/// Matches a non-empty word up to the next whitespace.
pub const UNQUOTED: &str = r"(\S+)";
/// Matches the end of an argument.
pub const END: &str = r"(?:\s|$)";

/// The outcome of a successful option match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionMatch {
    /// The option's name part (macro name, directory, file).
    pub name: String,
    /// The option's value part, when the matcher has one and it was present.
    pub value: Option<String>,
    /// Number of bytes of the input this match covers.
    pub consumed: usize,
}

/// How the captured value has to be post-processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueForm {
    Verbatim,
    /// The value was written with shell escaped quotes (`\"text\"`), which
    /// the compiler receives as plain quotes.
    ShellEscaped,
}

/// Locates an option name (and optionally a value) at the start of a string.
///
/// The pattern is anchored to the start of the input when compiled, so the
/// match never skips any leading text.
#[derive(Debug, Clone)]
pub struct OptionMatcher {
    regex: Regex,
    name_group: usize,
    value_group: Option<usize>,
    value_form: ValueForm,
}

impl OptionMatcher {
    /// Creates a matcher which captures only a name.
    ///
    /// # Panics
    ///
    /// When the pattern is not a valid regular expression. Patterns are
    /// program constants, so this is a programming error.
    pub fn name(pattern: &str, name_group: usize) -> Self {
        Self {
            regex: anchored(pattern),
            name_group,
            value_group: None,
            value_form: ValueForm::Verbatim,
        }
    }

    /// Creates a matcher which captures a name and a value.
    ///
    /// # Panics
    ///
    /// When the pattern is not a valid regular expression.
    pub fn name_value(pattern: &str, name_group: usize, value_group: usize) -> Self {
        Self {
            regex: anchored(pattern),
            name_group,
            value_group: Some(value_group),
            value_form: ValueForm::Verbatim,
        }
    }

    /// Marks the value as written with shell escaped quotes.
    pub fn shell_escaped(mut self) -> Self {
        self.value_form = ValueForm::ShellEscaped;
        self
    }

    /// Tries to match the option at the very start of the input.
    pub fn looking_at(&self, input: &str) -> Option<OptionMatch> {
        let captures = self.regex.captures(input)?;
        let consumed = captures.get(0)?.end();
        let name = captures.get(self.name_group)?.as_str().to_string();
        let value = self
            .value_group
            .and_then(|group| captures.get(group))
            .map(|value| match self.value_form {
                ValueForm::Verbatim => value.as_str().to_string(),
                ValueForm::ShellEscaped => unescape_quotes(value.as_str()),
            });

        (consumed > 0).then_some(OptionMatch { name, value, consumed })
    }
}

/// Compiles the pattern anchored at the start of the input.
fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{pattern})")).expect("Invalid option pattern")
}

fn unescape_quotes(value: &str) -> String {
    value.replace("\\\"", "\"").replace("\\'", "'")
}

/// Returns the number of bytes up to the next whitespace, or the whole length.
pub fn skip_to_whitespace(input: &str) -> usize {
    input.find(char::is_whitespace).unwrap_or(input.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matcher_is_anchored() {
        let sut = OptionMatcher::name(&format!(r"-I\s*{UNQUOTED}"), 1);

        let result = sut.looking_at("-Iinclude -DX").unwrap();
        assert_eq!(result.name, "include");
        assert_eq!(result.value, None);
        assert_eq!(result.consumed, "-Iinclude".len());

        assert_eq!(sut.looking_at("-c -Iinclude"), None);
        assert_eq!(sut.looking_at(" -Iinclude"), None);
    }

    #[test]
    fn test_name_value_matcher() {
        let sut = OptionMatcher::name_value(&format!(r"-D\s*{MACRO_NAME}=(\S*)"), 1, 2);

        let result = sut.looking_at("-DFUNC(x,y)=body rest").unwrap();
        assert_eq!(result.name, "FUNC(x,y)");
        assert_eq!(result.value.as_deref(), Some("body"));
        assert_eq!(result.consumed, "-DFUNC(x,y)=body".len());
    }

    #[test]
    fn test_optional_value_group_missing() {
        let sut = OptionMatcher::name_value(&format!(r"-D{IDENTIFIER}(?:=(\S*))?{END}"), 1, 2);

        let result = sut.looking_at("-DFOO -DBAR").unwrap();
        assert_eq!(result.name, "FOO");
        assert_eq!(result.value, None);
    }

    #[test]
    fn test_shell_escaped_value() {
        let sut = OptionMatcher::name_value(&format!(r#"-D{IDENTIFIER}=(\\".*?\\"){END}"#), 1, 2)
            .shell_escaped();

        let result = sut.looking_at(r#"-DMSG=\"hello world\" main.c"#).unwrap();
        assert_eq!(result.name, "MSG");
        assert_eq!(result.value.as_deref(), Some(r#""hello world""#));
    }

    #[test]
    fn test_quoted_fragments() {
        let double = OptionMatcher::name(&format!(r"-I\s*{DOUBLE_QUOTED}{END}"), 1);
        let single = OptionMatcher::name(&format!(r"-I\s*{SINGLE_QUOTED}{END}"), 1);

        assert_eq!(double.looking_at(r#"-I"my dir" x"#).unwrap().name, "my dir");
        assert_eq!(single.looking_at(r"-I 'my dir'").unwrap().name, "my dir");
        // the quote characters have to match
        assert_eq!(double.looking_at(r#"-I"my dir' x"#), None);
    }

    #[test]
    fn test_skip_to_whitespace() {
        assert_eq!(skip_to_whitespace("--flag=1 rest"), "--flag=1".len());
        assert_eq!(skip_to_whitespace("last"), 4);
        assert_eq!(skip_to_whitespace(""), 0);
    }
}
