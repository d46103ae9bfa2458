//! `init`, `create`, `show`, `list`, `update`, `close`, `reopen`, `delete`.

use anyhow::{Context, Result};
use beads_core::enums::{IssueType, Priority, Status};
use beads_core::filter::IssueFilter;
use beads_core::issue::IssueBuilder;
use beads_storage::store::IssueStore;

use crate::cli::{CloseArgs, CreateArgs, DeleteArgs, InitArgs, ListArgs, ReopenArgs, ShowArgs, UpdateArgs};
use crate::context::RuntimeContext;
use crate::output::{format_issue_detail, format_issue_row, print_json, print_json_error};

pub fn init(args: &InitArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let dir = beads_config::beads_dir::ensure_beads_dir(&cwd).context("failed to create .beads directory")?;

    let store = beads_storage::store::FsStore::new(dir.clone());
    store.init().context("failed to initialize store layout")?;

    let mut config = beads_config::config::load_config(&dir)?;
    if let Some(prefix) = &args.prefix {
        config.prefix = Some(prefix.clone());
    }
    beads_config::config::save_config(&dir, &config)?;

    println!("initialized .beads store at {}", dir.display());
    Ok(())
}

pub fn create(ctx: &RuntimeContext, args: &CreateArgs) -> Result<()> {
    let priority: Priority = args.priority.parse().context("invalid --priority")?;
    let issue_type: IssueType = args.issue_type.as_str().into();

    let mut builder = IssueBuilder::new(args.title.clone())
        .priority(priority)
        .issue_type(issue_type)
        .labels(args.labels.clone())
        .ephemeral(args.ephemeral)
        .created_by(ctx.actor.clone());

    if let Some(description) = &args.description {
        builder = builder.description(description.clone());
    }
    if let Some(assignee) = &args.assignee {
        builder = builder.assignee(assignee.clone());
    }
    if let Some(parent) = &args.parent {
        builder = builder.parent(parent.clone());
    }

    let id = ctx.store.create(builder.build(), &ctx.actor)?;

    if ctx.json {
        print_json(&serde_json::json!({ "id": id }));
    } else {
        println!("created {id}");
    }
    Ok(())
}

pub fn show(ctx: &RuntimeContext, args: &ShowArgs) -> Result<()> {
    match ctx.store.get(&args.id) {
        Ok(issue) => {
            if ctx.json {
                print_json(&issue);
            } else {
                print!("{}", format_issue_detail(&issue));
            }
            Ok(())
        }
        Err(e) => {
            if ctx.json {
                print_json_error(&e.to_string());
                Ok(())
            } else {
                Err(e.into())
            }
        }
    }
}

pub fn list(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    let mut filter = IssueFilter::new();
    if let Some(status) = &args.status {
        filter.status = Some(status.parse().context("invalid --status")?);
    }
    if let Some(assignee) = &args.assignee {
        filter.assignee = Some(assignee.clone());
    }
    if let Some(parent) = &args.parent {
        filter = filter.with_parent(parent.clone());
    }

    let issues = ctx.store.list(&filter)?;

    if ctx.json {
        print_json(&issues);
    } else {
        for issue in &issues {
            println!("{}", format_issue_row(issue));
        }
    }
    Ok(())
}

pub fn update(ctx: &RuntimeContext, args: &UpdateArgs) -> Result<()> {
    let mut issue = ctx.store.get(&args.id)?;

    if let Some(title) = &args.title {
        issue.title = title.clone();
    }
    if let Some(description) = &args.description {
        issue.description = description.clone();
    }
    if let Some(assignee) = &args.assignee {
        issue.assignee = assignee.clone();
    }
    if let Some(priority) = &args.priority {
        issue.priority = priority.parse().context("invalid --priority")?;
    }
    if let Some(status) = &args.status {
        issue.status = status.parse::<Status>().context("invalid --status")?;
    }

    ctx.store.update(issue, &ctx.actor)?;
    println!("updated {}", args.id);
    Ok(())
}

pub fn close(ctx: &RuntimeContext, args: &CloseArgs) -> Result<()> {
    ctx.store.close(&args.id, &args.reason, &ctx.actor)?;
    println!("closed {}", args.id);
    Ok(())
}

pub fn reopen(ctx: &RuntimeContext, args: &ReopenArgs) -> Result<()> {
    ctx.store.reopen(&args.id, &ctx.actor)?;
    println!("reopened {}", args.id);
    Ok(())
}

pub fn delete(ctx: &RuntimeContext, args: &DeleteArgs) -> Result<()> {
    ctx.store.delete(&args.id, args.hard, &ctx.actor)?;
    if args.hard {
        println!("deleted {}", args.id);
    } else {
        println!("tombstoned {}", args.id);
    }
    Ok(())
}

pub fn ready(ctx: &RuntimeContext) -> Result<()> {
    let closed_set = beads_graph::build_closed_set(&ctx.store)?;
    let open_issues = ctx.store.list(&IssueFilter::new().with_status(Status::Open))?;

    let ready: Vec<_> = open_issues
        .into_iter()
        .filter(|issue| {
            issue
                .dependencies
                .iter()
                .filter(|d| d.dep_type == beads_core::enums::DependencyType::Blocks)
                .all(|d| closed_set.contains(&d.id))
        })
        .collect();

    if ctx.json {
        print_json(&ready);
    } else {
        for issue in &ready {
            println!("{}", format_issue_row(issue));
        }
    }
    Ok(())
}
