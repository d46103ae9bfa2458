//! `doctor` -- report (and optionally repair) store integrity problems.

use anyhow::Result;
use beads_storage::store::IssueStore;

use crate::cli::DoctorArgs;
use crate::context::RuntimeContext;
use crate::output::print_json;

pub fn run(ctx: &RuntimeContext, args: &DoctorArgs) -> Result<()> {
    let problems = ctx.store.doctor(args.fix)?;

    if ctx.json {
        let reported: Vec<String> = problems.iter().map(|p| p.to_string()).collect();
        print_json(&serde_json::json!({ "problems": reported }));
        return Ok(());
    }

    if problems.is_empty() {
        println!("no problems found");
    } else {
        for problem in &problems {
            println!("{problem}");
        }
    }
    Ok(())
}
