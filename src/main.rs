//! Cubecell - spreadsheet recalculation from the command line

mod config;

use anyhow::{Context, bail};
use cubecell_core::{Document, Recalc};
use cubecell_engine::engine::{ERROR_VALUE, format_value};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

fn print_usage() {
    eprintln!("Usage: cubecell [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Sheet to load (one 'A1: <input>' per line)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula and print the result");
    eprintln!("  -s, --set <CELL=INPUT>    Set a cell after loading (can be repeated)");
    eprintln!("  -o, --output <FILE>       Write cell values to a file");
    eprintln!("  --config <FILE>           Read settings from this TOML file");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default, PartialEq)]
struct Args {
    file_path: Option<PathBuf>,
    command: Option<String>,
    edits: Vec<(String, String)>,
    output_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
}

/// Parse command-line arguments; `None` when help was requested.
fn parse_args(args: &[String]) -> anyhow::Result<Option<Args>> {
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(None),
            "-c" | "--command" => {
                i += 1;
                let Some(formula) = args.get(i) else {
                    bail!("--command requires a formula");
                };
                parsed.command = Some(formula.clone());
            }
            "-s" | "--set" => {
                i += 1;
                let Some(edit) = args.get(i) else {
                    bail!("--set requires CELL=INPUT");
                };
                let Some((cell, input)) = edit.split_once('=') else {
                    bail!("Invalid --set value '{}': expected CELL=INPUT", edit);
                };
                parsed.edits.push((cell.trim().to_string(), input.to_string()));
            }
            "-o" | "--output" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    bail!("--output requires a file path");
                };
                parsed.output_file = Some(PathBuf::from(path));
            }
            "--config" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    bail!("--config requires a file path");
                };
                parsed.config_file = Some(PathBuf::from(path));
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                bail!("Unknown option: {}", arg);
            }
            arg => {
                if parsed.file_path.is_some() {
                    bail!("Unexpected argument: {}", arg);
                }
                parsed.file_path = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }

    Ok(Some(parsed))
}

fn init_logger(level: Option<&str>) {
    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("warn"));
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .init();
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let (config, warnings) = config::load_config(args.config_file.as_ref());
    init_logger(config.log_level.as_deref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
    log::debug!("{:?}", config);

    let mut doc = Document::with_options(config.options);
    if let Some(path) = &args.file_path {
        doc.load_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
    }

    for (cell, input) in &args.edits {
        match doc
            .set_cell_by_address(cell, input)
            .with_context(|| format!("Failed to set {}", cell))?
        {
            Recalc::Faulted(err) => eprintln!("Warning: {}: {}", cell, err),
            Recalc::CycleRejected(err) => eprintln!("Warning: {}: {}", cell, err),
            Recalc::Literal | Recalc::Computed(_) => {}
        }
    }

    let mut code = ExitCode::SUCCESS;
    if let Some(formula) = &args.command {
        match doc.evaluate_formula(formula) {
            Ok(value) => println!("{}", format_value(&value)),
            Err(err) => {
                println!("{}", ERROR_VALUE);
                eprintln!("Error: {}", err);
                code = ExitCode::FAILURE;
            }
        }
    }

    if let Some(output_path) = &args.output_file {
        doc.export_values(output_path)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        eprintln!("Exported to {}", output_path.display());
    } else if args.command.is_none() {
        print!("{}", cubecell_core::storage::write_values_content(&doc.sheet));
    }

    Ok(code)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let parsed = match parse_args(&args) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match run(parsed) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
