use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;

use tally_merge::{merge_documents, MergeResult};
use tally_resolve::{apply_resolutions, ApplyOutcome};
use tally_types::{Conflict, Snapshot};

use crate::cli::{Cli, Command, MergeArgs, OutputFormat, ResolveArgs};

pub fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Merge(args) => run_merge(args, &cli.format),
        Command::Resolve(args) => run_resolve(args, &cli.format),
    }
}

fn run_merge(args: MergeArgs, format: &OutputFormat) -> Result<()> {
    let mut documents = Vec::new();
    for path in &args.files {
        documents.push((source_label(path), read_json(path)?));
    }

    let result = merge_documents(&documents, args.policy.into());

    if let Some(path) = &args.out {
        write_json(path, &result.merged.to_document())?;
    }
    if let Some(path) = &args.conflicts {
        write_json(path, &serde_json::to_value(&result.conflicts)?)?;
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_merge_summary(&result),
    }
    Ok(())
}

fn run_resolve(args: ResolveArgs, format: &OutputFormat) -> Result<()> {
    let merged = Snapshot::from_document(&read_json(&args.merged)?);
    let conflicts: Vec<Conflict> = serde_json::from_value(read_json(&args.conflicts)?)
        .with_context(|| format!("decoding conflict list from {}", args.conflicts))?;
    let choices: BTreeMap<usize, usize> = serde_json::from_value(read_json(&args.choices)?)
        .with_context(|| format!("decoding choices from {}", args.choices))?;

    let outcome = apply_resolutions(&merged.snapshot, &conflicts, &choices);

    if let Some(path) = &args.out {
        write_json(path, &outcome.snapshot.to_document())?;
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => print_resolve_summary(&outcome),
    }
    Ok(())
}

/// Snapshot provenance defaults to the file name, surfaced verbatim in
/// conflict records.
fn source_label(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn read_json(path: &str) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

fn write_json(path: &str, value: &Value) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("writing {path}"))
}

fn print_merge_summary(result: &MergeResult) {
    println!(
        "{} {} snapshot(s): {}",
        "merged".green().bold(),
        result.stats.snapshots,
        result.sources.join(", ")
    );
    println!(
        "  {} answer key(s), {} KPI line(s), {} malformed section(s)",
        result.stats.answer_keys, result.stats.kpi_lines, result.stats.malformed_sections
    );

    if result.conflicts.is_empty() {
        println!("{}", "no conflicts".green());
        return;
    }

    println!(
        "{} conflict(s) need resolution:",
        result.conflicts.len().to_string().yellow().bold()
    );
    for (index, conflict) in result.conflicts.iter().enumerate() {
        println!(
            "  [{index}] {} {}",
            conflict.section.to_string().yellow(),
            conflict.key.bold()
        );
        for (at, alternative) in conflict.values.iter().enumerate() {
            println!(
                "      ({at}) {} {}",
                alternative.value,
                format!("from {}", alternative.source).dimmed()
            );
        }
    }
}

fn print_resolve_summary(outcome: &ApplyOutcome) {
    println!("{} {} resolution(s)", "applied".green().bold(), outcome.applied);
    for skipped in &outcome.skipped {
        println!(
            "  {} conflict {}: {:?}",
            "skipped".yellow(),
            skipped.conflict_index,
            skipped.reason
        );
    }
}
