use std::path::Path;

use anyhow::{Context, Result, bail};
use mailthread_core::{IndexConfig, MailIndex, OpenMode};
use serde::Serialize;

use crate::cli::{AddArgs, Commands};

mod support;


use self::support::{build_exclude_set, collect_message_paths, print_json, print_json_line};

pub(crate) fn run_from_root(root: &Path, command: Commands) -> Result<()> {
    match command {
        Commands::Init(args) => {
            let mut config = IndexConfig::from_env();
            config.legacy_threading |= args.legacy;
            let index = MailIndex::open(root, OpenMode::ReadWrite, config)
                .context("failed to create index")?;
            print_json(&index.status()?)?;
        }
        Commands::Add(args) => {
            let index = MailIndex::new(root).context("failed to open index")?;
            let report = add_paths(&index, &args)?;
            if report.failed > 0 {
                bail!("{} of {} messages failed", report.failed, report.total);
            }
        }
        Commands::Show(args) => {
            let index = open_read_only(root)?;
            match index.find_message(&args.message_id)? {
                Some(summary) => print_json(&summary)?,
                None => bail!("message not found: {}", args.message_id),
            }
        }
        Commands::Thread(args) => {
            let index = open_read_only(root)?;
            print_json(&index.thread_members(&args.thread_id)?)?;
        }
        Commands::Status => {
            let index = open_read_only(root)?;
            print_json(&index.status()?)?;
        }
    }
    Ok(())
}

fn open_read_only(root: &Path) -> Result<MailIndex> {
    MailIndex::open(root, OpenMode::ReadOnly, IndexConfig::from_env())
        .with_context(|| format!("failed to open index at {}", root.display()))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct AddReport {
    total: usize,
    failed: usize,
}

#[derive(Debug, Serialize)]
struct AddLine<'a, T: Serialize> {
    path: &'a str,
    #[serde(flatten)]
    result: T,
}

fn add_paths(index: &MailIndex, args: &AddArgs) -> Result<AddReport> {
    let exclude = build_exclude_set(&args.exclude)?;
    let files = collect_message_paths(&args.paths, &exclude)?;

    let mut report = AddReport::default();
    for file in files {
        report.total += 1;
        let path = file.display().to_string();
        match index.add_message(&file) {
            Ok(outcome) => print_json_line(&AddLine {
                path: &path,
                result: outcome,
            })?,
            Err(err) => {
                report.failed += 1;
                let payload = err.to_payload("add_message", Some(path.clone()));
                print_json_line(&AddLine {
                    path: &path,
                    result: serde_json::json!({ "error": payload }),
                })?;
            }
        }
    }
    Ok(report)
}
