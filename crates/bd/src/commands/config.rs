//! `config get` / `config set`.

use anyhow::{bail, Result};

use crate::cli::{ConfigCommands, ConfigSetArgs};
use crate::context::RuntimeContext;
use crate::output::print_json;

pub fn run(ctx: &RuntimeContext, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Get => get(ctx),
        ConfigCommands::Set(args) => set(ctx, args),
    }
}

fn get(ctx: &RuntimeContext) -> Result<()> {
    if ctx.json {
        print_json(&ctx.config);
    } else {
        println!("prefix: {}", ctx.config.prefix.as_deref().unwrap_or("(default)"));
        println!("actor:  {}", ctx.config.actor.as_deref().unwrap_or("(unset)"));
    }
    Ok(())
}

fn set(ctx: &RuntimeContext, args: &ConfigSetArgs) -> Result<()> {
    let mut config = ctx.config.clone();
    match args.key.as_str() {
        "prefix" => config.prefix = Some(args.value.clone()),
        "actor" => config.actor = Some(args.value.clone()),
        other => bail!("unknown config key {other:?} (expected `prefix` or `actor`)"),
    }
    beads_config::config::save_config(&ctx.beads_dir, &config)?;
    println!("set {} = {}", args.key, args.value);
    Ok(())
}
