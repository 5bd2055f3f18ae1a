//! `cp` -- the context palace command-line tool.
//!
//! Entry point: parses CLI arguments with clap, resolves the runtime
//! context (config, store, providers), and dispatches to the noun command
//! modules under [`commands`].

mod cli;
mod commands;
mod context;
mod engine;
mod output;
mod providers;

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use cli::{Cli, Commands};
use context::RuntimeContext;

/// Tracks whether a Ctrl+C has already been received.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

fn main() {
    // Install signal handlers for graceful shutdown.
    // First Ctrl+C: exit cleanly. Second: force exit.
    let _ = ctrlc::set_handler(|| {
        if CTRLC_RECEIVED.swap(true, Ordering::SeqCst) {
            std::process::exit(1);
        }
        std::process::exit(0);
    });

    let cli = Cli::parse();

    let filter = if cli.global.debug { "cp=debug" } else { "cp=info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        output::emit_error(cli.global.output, &e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help().ok();
        println!();
        return Ok(());
    };

    let ctx = RuntimeContext::build(&cli.global)?;

    match command {
        Commands::Shard(args) => commands::shard::run(&ctx, args),
        Commands::Recall(args) => commands::recall::run(&ctx, args),
        Commands::Memory(args) => commands::memory::run(&ctx, args),
        Commands::Knowledge(args) => commands::knowledge::run(&ctx, args),
        Commands::Requirement(args) => commands::requirement::run(&ctx, args),
        Commands::Epic(args) => commands::epic::run(&ctx, args),
        Commands::Focus(args) => commands::focus::run(&ctx, args),
        Commands::Task(args) => commands::task::run(&ctx, args),
        Commands::Artifact(args) => commands::artifact::run(&ctx, args),
        Commands::Status => commands::status::run(&ctx),
        Commands::Init(args) => commands::init::run(&ctx, args),
        Commands::Update => commands::update::run(&ctx),
        Commands::Admin(args) => commands::admin::run(&ctx, args),
        Commands::Completion(args) => commands::completion::run(&ctx, args),
    }
}
