// SPDX-License-Identifier: GPL-3.0-or-later

//! This module contains the command line interface of the application.
//!
//! The command line parsing is implemented using the `clap` library.
//! The `Arguments` type is the structured form of the program invocation:
//! which input to scan and where to write the report.

use anyhow::anyhow;
use clap::{ArgAction, ArgMatches, Command, arg, command};
use std::fmt;

const DATABASE_SUBCOMMAND: &str = "database";
const OUTPUT_SUBCOMMAND: &str = "output";
const DEFAULT_DATABASE_FILE: &str = "compile_commands.json";
const DEFAULT_REPORT_FILE: &str = "settings.json";

/// The file name which stands for the standard input or output.
pub const STDIO: &str = "-";

/// Represents the command line arguments of the application.
#[derive(Debug, PartialEq)]
pub struct Arguments {
    // The path of the configuration file.
    pub config: Option<String>,
    // How chatty the logging is.
    pub verbose: u8,
    pub input: Input,
    // The path of the report file, `-` for the standard output.
    pub output: String,
}

/// Represents the input to scan.
#[derive(Debug, PartialEq)]
pub enum Input {
    /// A JSON compilation database.
    Database { file_name: String },
    /// Captured build output, `-` reads the standard input.
    BuildOutput { file_name: String, directory: Option<String> },
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(matches: ArgMatches) -> Result<Self, Self::Error> {
        let config = matches.get_one::<String>("config").map(String::to_string);
        let verbose = matches.get_count("verbose");

        let (input, sub_matches) = match matches.subcommand() {
            Some((DATABASE_SUBCOMMAND, sub_matches)) => {
                let file_name = required(sub_matches, "input")?;
                (Input::Database { file_name }, sub_matches)
            }
            Some((OUTPUT_SUBCOMMAND, sub_matches)) => {
                let file_name = required(sub_matches, "input")?;
                let directory = sub_matches.get_one::<String>("directory").map(String::to_string);
                (Input::BuildOutput { file_name, directory }, sub_matches)
            }
            _ => return Err(anyhow!("unrecognized subcommand")),
        };
        let output = required(sub_matches, "output")?;

        Ok(Arguments { config, verbose, input, output })
    }
}

fn required(matches: &ArgMatches, id: &str) -> anyhow::Result<String> {
    matches
        .get_one::<String>(id)
        .map(String::to_string)
        .ok_or_else(|| anyhow!("missing argument: {id}"))
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Arguments:")?;
        if let Some(config) = &self.config {
            writeln!(f, "  config: {config}")?;
        }
        match &self.input {
            Input::Database { file_name } => writeln!(f, "  database: {file_name}")?,
            Input::BuildOutput { file_name, directory } => {
                writeln!(f, "  build output: {file_name}")?;
                if let Some(directory) = directory {
                    writeln!(f, "  directory: {directory}")?;
                }
            }
        }
        write!(f, "  output: {}", self.output)
    }
}

/// Represents the command line interface of the application.
///
/// The input kinds are subcommands, the report file and the configuration
/// are common to both.
pub fn cli() -> Command {
    command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .args(&[
            arg!(-v --verbose ... "Sets the level of verbosity").action(ArgAction::Count),
            arg!(-c --config <FILE> "Path of the config file"),
        ])
        .subcommand(
            Command::new(DATABASE_SUBCOMMAND)
                .about("extract settings from a JSON compilation database")
                .args(&[
                    arg!(-i --input <FILE> "Path of the compilation database")
                        .default_value(DEFAULT_DATABASE_FILE)
                        .hide_default_value(false),
                    arg!(-o --output <FILE> "Path of the report file, '-' for standard output")
                        .default_value(DEFAULT_REPORT_FILE)
                        .hide_default_value(false),
                ]),
        )
        .subcommand(
            Command::new(OUTPUT_SUBCOMMAND)
                .about("extract settings from the console output of a build")
                .args(&[
                    arg!(-i --input <FILE> "Path of the build output, '-' for standard input")
                        .default_value(STDIO)
                        .hide_default_value(false),
                    arg!(-d --directory <DIR> "Directory where the build was started"),
                    arg!(-o --output <FILE> "Path of the report file, '-' for standard output")
                        .default_value(DEFAULT_REPORT_FILE)
                        .hide_default_value(false),
                ]),
        )
}
