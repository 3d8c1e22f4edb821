// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Context;
use ccscan::args::{self, Input, STDIO};
use ccscan::config;
use ccscan::detection::{CachingDetection, DetectorRegistry};
use ccscan::input::{CommandProcessor, build_output, database};
use ccscan::output::SettingsStore;
use ccscan::output::statistics::ScanStatistics;
use ccscan::response_file::FileSystem;
use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

/// Driver function of the application.
fn main() -> anyhow::Result<ExitCode> {
    // Parse the command line arguments.
    let matches = args::cli().get_matches();
    let arguments = args::Arguments::try_from(matches)?;

    // Initialize the logging system, `RUST_LOG` wins over the verbosity flag.
    let level = match arguments.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let pkg_name = env!("CARGO_PKG_NAME");
    let pkg_version = env!("CARGO_PKG_VERSION");
    log::info!("{pkg_name} v{pkg_version}");
    let os = env::consts::OS;
    let family = env::consts::FAMILY;
    let arch = env::consts::ARCH;
    log::info!("Running on... {family}/{os} {arch}");
    log::info!("{arguments}");

    let current_directory =
        env::current_dir().with_context(|| "Failed to get current working directory")?;
    // Load the configuration.
    let configuration = config::Loader::load(&current_directory, &arguments.config)?;
    log::info!("{configuration}");

    let registry = DetectorRegistry::new(
        configuration.detection.options(),
        &configuration.detection.tool_specs(),
    )
    .with_context(|| "Failed to build the compiler detectors")?;
    let project_root = configuration
        .output
        .project_root
        .as_deref()
        .map(|root| current_directory.join(root));

    let statistics = ScanStatistics::new();
    let mut processor = CommandProcessor::new(
        CachingDetection::new(&registry),
        &FileSystem,
        configuration.output.scope,
        project_root,
        Arc::clone(&statistics),
    );
    let mut store = SettingsStore::new();

    match &arguments.input {
        Input::Database { file_name } => {
            database::scan_file(Path::new(file_name), &mut processor, &mut store)
                .with_context(|| format!("Failed to scan compilation database {file_name}"))?;
        }
        Input::BuildOutput { file_name, directory } => {
            let directory = directory
                .as_deref()
                .map_or_else(|| current_directory.clone(), |dir| current_directory.join(dir));
            let reader = open_input(file_name)?;
            build_output::scan(reader, &directory, &mut processor, &mut store)
                .with_context(|| format!("Failed to scan build output {file_name}"))?;
        }
    }
    log::info!("{statistics}");

    let report = store.into_report(statistics.snapshot());
    let mut writer = open_output(&arguments.output)?;
    report
        .write(&mut writer)
        .and_then(|_| writeln!(writer).map_err(serde_json::Error::io))
        .and_then(|_| writer.flush().map_err(serde_json::Error::io))
        .with_context(|| format!("Failed to write report {}", arguments.output))?;

    Ok(ExitCode::SUCCESS)
}

fn open_input(file_name: &str) -> anyhow::Result<Box<dyn BufRead>> {
    if file_name == STDIO {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(file_name).with_context(|| format!("Failed to open build output {file_name}"))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(file_name: &str) -> anyhow::Result<Box<dyn Write>> {
    if file_name == STDIO {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    let file = File::create(file_name).with_context(|| format!("Failed to create report {file_name}"))?;
    Ok(Box::new(BufWriter::new(file)))
}
