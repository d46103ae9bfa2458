//! `bd` -- a thin driver binary exercising the beads issue store, graph,
//! and workflow engine. Parses CLI arguments with clap, resolves the
//! runtime context, and dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;
use output::print_json_error;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Err(e) = run(&cli) {
        if cli.global.json {
            print_json_error(&format!("{e:#}"));
        } else {
            eprintln!("error: {e:#}");
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Commands::Init(args) = &cli.command {
        return commands::issue::init(args);
    }

    let ctx = RuntimeContext::from_global_args(&cli.global)?;

    match &cli.command {
        Commands::Init(_) => unreachable!("handled above"),
        Commands::Create(args) => commands::issue::create(&ctx, args),
        Commands::Show(args) => commands::issue::show(&ctx, args),
        Commands::List(args) => commands::issue::list(&ctx, args),
        Commands::Update(args) => commands::issue::update(&ctx, args),
        Commands::Close(args) => commands::issue::close(&ctx, args),
        Commands::Reopen(args) => commands::issue::reopen(&ctx, args),
        Commands::Delete(args) => commands::issue::delete(&ctx, args),
        Commands::Dep(args) => commands::dep::run(&ctx, &args.command),
        Commands::Ready => commands::issue::ready(&ctx),
        Commands::Doctor(args) => commands::doctor::run(&ctx, args),
        Commands::Cook(args) => commands::recipe::cook(&ctx, args),
        Commands::Pour(args) => commands::recipe::pour(&ctx, args),
        Commands::Wisp(args) => commands::recipe::wisp(&ctx, args),
        Commands::Burn(args) => commands::molecule::burn(&ctx, args),
        Commands::Squash(args) => commands::molecule::squash(&ctx, args),
        Commands::Gc(args) => commands::molecule::gc(&ctx, args),
        Commands::Current(args) => commands::molecule::current(&ctx, args),
        Commands::Progress(args) => commands::molecule::progress(&ctx, args),
        Commands::Config(args) => commands::config::run(&ctx, &args.command),
    }
}
