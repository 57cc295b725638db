//! Polyglot router — console entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI args, load config
//!   3. Init logger once (CLI `-v` flags > RUST_LOG > config)
//!   4. Build provider, registry, classifier and router
//!   5. Spawn Ctrl-C → shutdown signal watcher
//!   6. Route command-line / demo queries, then the REPL if requested

use tokio_util::sync::CancellationToken;
use tracing::info;

use polyglot_router::console::{Console, DEMO_QUERIES};
use polyglot_router::error::AppError;
use polyglot_router::{RouterError, config, logger, setup};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = logger::init(args.verbosity, &config.router.log_level)?;

    info!(
        configured_log_level = %config.router.log_level,
        effective_log_level = %effective_log_level,
        classifier = ?config.classifier.kind,
        llm_provider = %config.llm.provider,
        mode = ?config.router.mode,
        timeout = ?config.router.timeout,
        "config loaded"
    );

    let router = setup::build_router(&config)?;

    // Ctrl-C cancels whatever request is in flight and stops the console.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    let options = setup::request_options(&config).with_cancel(shutdown.clone());
    let console = Console::new(router, options, args.json);

    let mut queries = args.queries;
    if args.demo {
        queries.extend(DEMO_QUERIES.iter().map(|q| q.to_string()));
    }

    for query in &queries {
        if !args.json {
            println!("» {query}");
        }
        match console.ask(query).await {
            Ok(()) => {}
            Err(RouterError::Cancelled) => return Ok(()),
            Err(e) => eprintln!("error: {e}"),
        }
    }

    // With nothing to route on the command line, read queries from stdin.
    if args.interactive || queries.is_empty() {
        console.run(shutdown.clone()).await?;
        if args.interactive {
            use std::io::Write as _;
            println!("\nBye :) ...");
            let _ = std::io::stdout().flush();
        }
    }

    Ok(())
}

struct CliArgs {
    verbosity: u8,
    interactive: bool,
    config_path: Option<String>,
    demo: bool,
    json: bool,
    queries: Vec<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut interactive = false;
    let mut config_path = None;
    let mut demo = false;
    let mut json = false;
    let mut queries = Vec::new();

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            // Everything after `--` is a query, even if it starts with '-'.
            queries.extend(iter.by_ref());
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: polyglot-router [OPTIONS] [QUERY]...");
                println!();
                println!("Routes each QUERY to the handler for its language, or prints the fallback.");
                println!("With no QUERY and no --demo, queries are read from stdin.");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -i, --interactive          Open the console after routing any QUERY");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("      --demo                 Route the built-in demo queries");
                println!("      --json                 Print each response as a JSON line");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-i" | "--interactive" => interactive = true,
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--demo" => demo = true,
            "--json" => json = true,
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            a if a.starts_with('-') && a.len() > 1 => {
                eprintln!("error: unknown option {a} (see --help)");
                std::process::exit(1);
            }
            _ => queries.push(arg),
        }
    }

    CliArgs { verbosity, interactive, config_path, demo, json, queries }
}
