// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashSet;

/// Checks whether a command line word names a source file the compiler reads.
///
/// Both `-` and `/` prefixed words are options for one of the supported tool
/// families, so an absolute POSIX path only qualifies when it does not look
/// like an MSVC option (a single letter after the slash).
pub fn looks_like_a_source_file(argument: &str) -> bool {
    if argument.starts_with('-') || argument.starts_with('@') {
        return false;
    }
    if argument.starts_with('/') && !argument[1..].contains('/') && !argument.contains('.') {
        return false;
    }
    match argument.rsplit_once('.') {
        Some((stem, extension)) => !stem.is_empty() && SOURCE_EXTENSIONS.contains(extension),
        None => false,
    }
}

#[rustfmt::skip]
static SOURCE_EXTENSIONS: std::sync::LazyLock<HashSet<&'static str>> = std::sync::LazyLock::new(|| {
    HashSet::from([
        // C
        "c", "C",
        // C++
        "cc", "CC", "c++", "C++", "cxx", "cpp", "CPP", "cp",
        // CUDA
        "cu",
        // ObjectiveC
        "m", "mi", "mm", "M", "mii",
        // Preprocessed
        "i", "ii",
        // Assembly
        "s", "S", "sx", "asm",
    ])
});
