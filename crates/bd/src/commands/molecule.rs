//! `burn`, `squash`, `gc`, `current`, `progress` -- operations over an
//! in-flight molecule.

use anyhow::Result;
use chrono::{Duration, Utc};

use crate::cli::{CurrentArgs, GcArgs, MoleculeArgs, SquashArgs};
use crate::context::RuntimeContext;
use crate::output::print_json;

pub fn burn(ctx: &RuntimeContext, args: &MoleculeArgs) -> Result<()> {
    beads_workflow::burn(&ctx.store, &args.id, Some(&ctx.actor))?;
    println!("burned {}", args.id);
    Ok(())
}

pub fn squash(ctx: &RuntimeContext, args: &SquashArgs) -> Result<()> {
    let result = beads_workflow::squash(
        &ctx.store,
        &args.id,
        args.summary.as_deref(),
        args.keep_children,
        Some(&ctx.actor),
    )?;

    if ctx.json {
        print_json(&serde_json::json!({
            "digest_id": result.digest_id,
            "squashed": result.squashed,
            "keep_children": result.keep_children,
        }));
        return Ok(());
    }

    match &result.digest_id {
        Some(id) => println!("squashed {} wisps under {} into digest {id}", result.squashed.len(), args.id),
        None => println!("{} has no ephemeral children to squash", args.id),
    }
    Ok(())
}

pub fn gc(ctx: &RuntimeContext, args: &GcArgs) -> Result<()> {
    let removed = beads_workflow::gc(&ctx.store, Duration::hours(args.older_than_hours), Utc::now())?;

    if ctx.json {
        print_json(&serde_json::json!({ "removed": removed }));
    } else {
        println!("removed {} ephemeral issues", removed.len());
        for id in &removed {
            println!("  - {id}");
        }
    }
    Ok(())
}

pub fn current(ctx: &RuntimeContext, args: &CurrentArgs) -> Result<()> {
    let view = beads_workflow::current(&ctx.store, args.id.as_deref(), Some(&ctx.actor))?;

    if ctx.json {
        print_json(&serde_json::json!({
            "root_id": view.root_id,
            "steps": view.steps.iter().map(|s| serde_json::json!({
                "id": s.id,
                "title": s.title,
                "status": s.status.to_string(),
                "assignee": s.assignee,
                "class": format!("{:?}", s.class),
            })).collect::<Vec<_>>(),
            "percent": view.progress.percent(),
        }));
        return Ok(());
    }

    match &view.root_id {
        Some(root) => println!("molecule {root} -- {}% complete", view.progress.percent()),
        None => {
            println!("no in-flight molecule found for {}", ctx.actor);
            return Ok(());
        }
    }
    for step in &view.steps {
        println!("  [{:?}] {} {}", step.class, step.id, step.title);
    }
    Ok(())
}

pub fn progress(ctx: &RuntimeContext, args: &MoleculeArgs) -> Result<()> {
    let counts = beads_workflow::progress(&ctx.store, &args.id)?;

    if ctx.json {
        print_json(&serde_json::json!({
            "total": counts.total,
            "done": counts.done,
            "in_progress": counts.in_progress,
            "ready": counts.ready,
            "blocked": counts.blocked,
            "percent": counts.percent(),
        }));
    } else {
        println!(
            "{}/{} done ({}%), {} in progress, {} ready, {} blocked",
            counts.done, counts.total, counts.percent(), counts.in_progress, counts.ready, counts.blocked
        );
    }
    Ok(())
}
