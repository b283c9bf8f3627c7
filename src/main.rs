//! Cellgraph - run command scripts against a spreadsheet sheet

mod config;
mod error;
mod script;

use anyhow::Context;
use cellgraph_core::Sheet;
use std::env;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use config::OutputMode;

fn print_usage() {
    eprintln!("Usage: cellgraph [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Command script to run (reads stdin if omitted)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <LINE>      Run a command line (can be repeated; replaces FILE)");
    eprintln!("  -o, --output <MODE>       Print values, texts or none after the script");
    eprintln!("  --config <FILE>           Load settings from a TOML file");
    eprintln!("  --no-config               Ignore the user config file");
    eprintln!("  --stop-on-error           Stop at the first failing line");
    eprintln!("  -h, --help                Print help");
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();

    let mut file_path: Option<PathBuf> = None;
    let mut commands: Vec<String> = Vec::new();
    let mut output: Option<OutputMode> = None;
    let mut config_file: Option<PathBuf> = None;
    let mut no_config = false;
    let mut stop_on_error = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-c" | "--command" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --command requires a value");
                    std::process::exit(2);
                }
                commands.push(args[i].to_string());
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires a value");
                    std::process::exit(2);
                }
                match args[i].parse::<OutputMode>() {
                    Ok(mode) => output = Some(mode),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(2);
                    }
                }
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(2);
                }
                config_file = Some(PathBuf::from(&args[i]));
            }
            "--no-config" => no_config = true,
            "--stop-on-error" => stop_on_error = true,
            arg if arg.starts_with('-') && arg != "-" => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(2);
            }
            _ => {
                if file_path.is_none() {
                    file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(2);
                }
            }
        }
        i += 1;
    }

    let (mut config, warnings) = if no_config && config_file.is_none() {
        (config::Config::default(), Vec::new())
    } else {
        config::load_config(config_file.as_deref())
    };
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
    if let Some(mode) = output {
        config.output = mode;
    }
    config.stop_on_error |= stop_on_error;

    match run(&config, file_path, &commands) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Run the script and print the final sheet. Returns false if any line failed.
fn run(config: &config::Config, file_path: Option<PathBuf>, commands: &[String]) -> anyhow::Result<bool> {
    let source = if !commands.is_empty() {
        commands.join("\n")
    } else {
        match file_path {
            Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read script {}", path.display()))?,
            _ => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read script from stdin")?;
                buf
            }
        }
    };

    let mut sheet = Sheet::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stderr = io::stderr();
    let mut errors = stderr.lock();

    let summary = script::run_script(&mut sheet, &source, config.stop_on_error, &mut out, &mut errors)
        .context("Failed to write output")?;
    log::debug!(
        "ran {} commands, {} failed, {} cells materialized",
        summary.executed,
        summary.failed,
        sheet.len()
    );

    script::print_sheet(&sheet, config.output, &mut out)?;
    out.flush()?;
    Ok(summary.failed == 0)
}
