mod config;
mod repl;

use config::{parse_args, Command, ReplConfig, DEFAULT_HISTORY_FILE};
use mal_eval::{EvalConfig, Interpreter};
use repl::Repl;
use std::env;
use std::process::ExitCode;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_usage() {
    println!("mal v{VERSION}\n");
    println!("Usage:");
    println!("  mal                       Start the REPL");
    println!("  mal -e, --eval <expr>     Evaluate one expression and exit");
    println!("  mal --prompt <text>       Prompt to show (default \"user> \")");
    println!("  mal --history <path>      History file (default {DEFAULT_HISTORY_FILE})");
    println!("  mal --no-history          Do not read or write a history file");
    println!("  mal --max-depth <n>       Non-tail nesting limit (default 512)");
    println!("  mal --json                Print results and errors as JSON lines");
    println!("  mal -h, --help            Show this help message");
    println!();
    println!("Set MAL_LOG (or RUST_LOG) to enable logging on stderr, e.g. MAL_LOG=mal_eval=trace.");
}

/// Install a stderr subscriber when `MAL_LOG` or `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match EnvFilter::try_from_env("MAL_LOG") {
        Ok(filter) => filter,
        Err(_) if env::var_os("RUST_LOG").is_some() => EnvFilter::from_default_env(),
        Err(_) => return,
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .init();
}

fn eval_once(config: &ReplConfig, expr: &str) -> ExitCode {
    let interp = Interpreter::new(EvalConfig {
        max_depth: config.max_depth,
    });
    match Repl::new(interp, config.json).respond(expr) {
        Some(response) if response.is_error() => {
            eprintln!("{response}");
            ExitCode::FAILURE
        }
        Some(response) => {
            println!("{response}");
            ExitCode::SUCCESS
        }
        None => ExitCode::SUCCESS,
    }
}

fn main() -> ExitCode {
    init_tracing();

    let config = match parse_args(env::args().skip(1)) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("error: {err}\n");
            print_usage();
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config, "starting");

    if let Some(expr) = &config.eval {
        return eval_once(&config, expr);
    }

    let interp = Interpreter::new(EvalConfig {
        max_depth: config.max_depth,
    });
    match Repl::new(interp, config.json).run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
