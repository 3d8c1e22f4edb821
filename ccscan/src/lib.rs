// SPDX-License-Identifier: GPL-3.0-or-later

pub mod args;
pub mod arguments;
pub mod commandline;
pub mod config;
pub mod detection;
pub mod input;
pub mod matchers;
pub mod output;
pub mod response_file;
pub mod settings;
