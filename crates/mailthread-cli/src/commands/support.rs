use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

pub(super) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

pub(super) fn print_json_line<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

pub(super) fn build_exclude_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            continue;
        }
        let glob =
            Glob::new(trimmed).map_err(|err| anyhow!("invalid --exclude glob '{trimmed}': {err}"))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| anyhow!("invalid --exclude globs: {err}"))
}

/// Expands directories into their regular files, sorted per directory.
/// Explicit file arguments are kept in the given order.
pub(super) fn collect_message_paths(inputs: &[PathBuf], exclude: &GlobSet) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            if !is_excluded(exclude, input, input) {
                files.push(input.clone());
            }
            continue;
        }

        for entry in WalkDir::new(input)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.with_context(|| format!("failed to walk {}", input.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if is_excluded(exclude, input, entry.path()) {
                continue;
            }
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_excluded(exclude: &GlobSet, base: &Path, path: &Path) -> bool {
    if exclude.is_empty() {
        return false;
    }
    let relative = path.strip_prefix(base).unwrap_or(path);
    let relative = if relative.as_os_str().is_empty() {
        path
    } else {
        relative
    };
    exclude.is_match(relative) || exclude.is_match(path)
}
