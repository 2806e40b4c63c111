//! Retrofit evaluator entry point: CLI wiring and config-driven audit run.

use std::path::Path;
use std::process;

use retrofit_eval::audit::PassOrchestrator;
use retrofit_eval::config::AuditConfig;
use retrofit_eval::dwelling::{DwellingInput, DwellingState};
use retrofit_eval::io::export::export_csv;
use retrofit_eval::logging;

/// Parsed CLI arguments.
struct CliArgs {
    dwelling_path: Option<String>,
    config_path: Option<String>,
    preset: Option<String>,
    results_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("retrofit-eval: rank energy retrofit measures for one dwelling");
    eprintln!();
    eprintln!("Usage: retrofit-eval [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --dwelling <path>        Load the dwelling description from TOML");
    eprintln!("  --config <path>          Load audit configuration from TOML");
    eprintln!("  --preset <name>          Use a built-in preset (default, strict, high_discount)");
    eprintln!("  --results-out <path>     Export measure results to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after the audit");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("Without --dwelling the built-in sample dwelling is audited.");
    eprintln!("If no --config or --preset is given, the default preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        dwelling_path: None,
        config_path: None,
        preset: None,
        results_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--dwelling" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --dwelling requires a path argument");
                    process::exit(1);
                }
                cli.dwelling_path = Some(args[i].clone());
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--results-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --results-out requires a path argument");
                    process::exit(1);
                }
                cli.results_out = Some(args[i].clone());
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --port requires a u16 argument");
                    process::exit(1);
                }
                if let Ok(p) = args[i].parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{}\" is not a valid u16", args[i]);
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    let cli = parse_args();
    logging::init();

    // --config takes priority, then --preset, then the default preset
    let config = if let Some(ref path) = cli.config_path {
        match AuditConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match AuditConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        AuditConfig::default()
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let input = match cli.dwelling_path {
        Some(ref path) => match DwellingInput::from_toml_file(Path::new(path)) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        None => DwellingInput::sample(),
    };

    let orchestrator = match PassOrchestrator::from_config(config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    let outcome = match orchestrator.run(DwellingState::from(input)) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    // Results in evaluation order
    for r in outcome.results() {
        println!("{r}");
    }

    println!("\n--- Ranked Package ---");
    for (rank, r) in outcome.ranked().iter().enumerate() {
        println!("{:>2}. {r}", rank + 1);
    }

    if !outcome.advisories().is_empty() {
        println!("\n--- Advisories ---");
        for a in outcome.advisories() {
            println!("{}: {}", a.key, a.message);
        }
    }

    println!("\n{}", outcome.summary());

    if let Some(ref path) = cli.results_out {
        if let Err(e) = export_csv(outcome.results(), Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Results written to {path}");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(retrofit_eval::api::AppState::new(outcome));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        rt.block_on(retrofit_eval::api::serve(state, addr));
    }
}
