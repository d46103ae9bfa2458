//! `dep add` / `dep remove`.

use anyhow::{Context, Result};
use beads_storage::store::IssueStore;

use crate::cli::{DepCommands, DepEdgeArgs};
use crate::context::RuntimeContext;

pub fn run(ctx: &RuntimeContext, command: &DepCommands) -> Result<()> {
    match command {
        DepCommands::Add(args) => add(ctx, args),
        DepCommands::Remove(args) => remove(ctx, args),
    }
}

fn add(ctx: &RuntimeContext, args: &DepEdgeArgs) -> Result<()> {
    let dep_type = args.dep_type.parse().context("invalid --type")?;
    ctx.store.add_dependency(&args.from, &args.to, dep_type, &ctx.actor)?;
    println!("{} -> {} ({})", args.from, args.to, args.dep_type);
    Ok(())
}

fn remove(ctx: &RuntimeContext, args: &DepEdgeArgs) -> Result<()> {
    ctx.store.remove_dependency(&args.from, &args.to, &ctx.actor)?;
    println!("removed {} -> {}", args.from, args.to);
    Ok(())
}
