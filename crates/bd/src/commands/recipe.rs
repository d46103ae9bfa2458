//! `cook`, `pour`, `wisp` -- the formula-to-molecule pipeline.

use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::cli::FormulaArgs;
use crate::context::RuntimeContext;
use crate::output::print_json;

fn parse_vars(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    for entry in raw {
        let (key, value) = entry
            .split_once('=')
            .with_context(|| format!("--var {entry:?} is not in key=value form"))?;
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}

pub fn cook(ctx: &RuntimeContext, args: &FormulaArgs) -> Result<()> {
    let vars = parse_vars(&args.vars)?;
    let result = beads_workflow::cook(&args.formula, &vars, &ctx.beads_dir)?;

    if ctx.json {
        print_json(&serde_json::json!({
            "formula": result.formula_name,
            "root_title": result.root_title,
            "phase": result.phase,
            "steps": result.steps.iter().map(|s| &s.title).collect::<Vec<_>>(),
        }));
    } else {
        println!("{} ({})", result.root_title, result.phase);
        for step in &result.steps {
            println!("  - {}", step.title);
        }
    }
    Ok(())
}

pub fn pour(ctx: &RuntimeContext, args: &FormulaArgs) -> Result<()> {
    let vars = parse_vars(&args.vars)?;
    let result = beads_workflow::pour(&ctx.store, &args.formula, &vars, false, Some(&ctx.actor), &ctx.beads_dir)?;
    report_pour(ctx, &result);
    Ok(())
}

pub fn wisp(ctx: &RuntimeContext, args: &FormulaArgs) -> Result<()> {
    let vars = parse_vars(&args.vars)?;
    let result = beads_workflow::wisp(&ctx.store, &args.formula, &vars, Some(&ctx.actor), &ctx.beads_dir)?;
    report_pour(ctx, &result);
    Ok(())
}

fn report_pour(ctx: &RuntimeContext, result: &beads_workflow::PourResult) {
    if ctx.json {
        print_json(&serde_json::json!({
            "root_id": result.root_id,
            "ids": result.ids,
            "created_count": result.created_count,
            "phase": result.phase,
        }));
    } else {
        println!("poured {} ({} issues, phase {})", result.root_id, result.created_count, result.phase);
    }
}
