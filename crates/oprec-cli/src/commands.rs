use std::fmt::Write as _;

use anyhow::Context;
use colored::Colorize;
use oprec_records::{extract_file, write_records, DeclarationStore, FsDeclarationStore, RecordKind};
use oprec_reconcile::{
    apply, load_declarations, plan, verify, Consistency, ReconcileConfig, ReconcilePlan,
    Verification,
};
use serde::Serialize;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let store = FsDeclarationStore::new(&cli.root);
    let config = load_config(&cli)?;
    debug!(root = %cli.root.display(), config = ?config, "resolved configuration");
    let output = match cli.command {
        Command::Reconcile(args) => cmd_reconcile(&store, config, args, &cli.format)?,
        Command::Verify(args) => cmd_verify(&store, &config, args, &cli.format)?,
        Command::Extract(args) => cmd_extract(&store, args, &cli.format)?,
        Command::Config(_) => config.to_toml_string()?,
    };
    print!("{output}");
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<ReconcileConfig> {
    match &cli.config {
        Some(path) => ReconcileConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ReconcileConfig::default()),
    }
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)? + "\n")
}

fn consistency_text(out: &mut String, c: &Consistency) {
    let counts = c.counts();
    let _ = writeln!(out, "Verify consistency for {} ops yaml:", counts.kind.bold());
    let _ = writeln!(out, "  ops in dygraph: {}", counts.dygraph);
    let _ = writeln!(out, "  ops in static: {}", counts.static_);
    let _ = writeln!(out, "  shared: {}", counts.shared);
    let _ = writeln!(out, "  dygraph unique: {}", counts.dygraph_unique);
    let _ = writeln!(out, "  static unique: {}", counts.static_unique);
    let _ = writeln!(out, "  consistent: {}", counts.consistent.to_string().green());
    let _ = writeln!(out, "  inconsistent: {}", counts.inconsistent.to_string().yellow());
}

fn verification_text(v: &Verification, list: bool) -> String {
    let mut out = String::new();
    for c in [&v.forward, &v.backward] {
        consistency_text(&mut out, c);
        if list {
            for name in &c.comparison.inconsistent {
                let _ = writeln!(out, "    {} {}", "✗".red(), name);
            }
        }
        out.push('\n');
    }
    let _ = writeln!(out, "both consistent ops: {}", v.promotion.forward.len().to_string().green().bold());
    let _ = writeln!(out, "both consistent backward ops: {}", v.promotion.backward.len().to_string().green().bold());
    out
}

#[derive(Serialize)]
struct VerifyReport<'a> {
    forward: oprec_reconcile::ConsistencyCounts,
    backward: oprec_reconcile::ConsistencyCounts,
    inconsistent_forward: &'a [String],
    inconsistent_backward: &'a [String],
    promoted_forward: &'a [String],
    promoted_backward: &'a [String],
}

fn cmd_verify(
    store: &dyn DeclarationStore,
    config: &ReconcileConfig,
    args: VerifyArgs,
    format: &OutputFormat,
) -> anyhow::Result<String> {
    config.validate()?;
    let decls = load_declarations(store, config)?;
    let v = verify(&decls, config)?;
    match format {
        OutputFormat::Text => Ok(verification_text(&v, args.list)),
        OutputFormat::Json => to_json(&VerifyReport {
            forward: v.forward.counts(),
            backward: v.backward.counts(),
            inconsistent_forward: &v.forward.comparison.inconsistent,
            inconsistent_backward: &v.backward.comparison.inconsistent,
            promoted_forward: &v.promotion.forward,
            promoted_backward: &v.promotion.backward,
        }),
    }
}

fn plan_text(plan: &ReconcilePlan, dry_run: bool) -> String {
    let mut out = verification_text(&plan.verification, false);
    out.push('\n');
    let verb = if dry_run { "would write" } else { "wrote" };
    for w in &plan.writes {
        let _ = writeln!(out, "  {} {} ({} entries)", verb.dimmed(), w.path.display(), w.entries);
    }
    if dry_run {
        let _ = writeln!(out, "{} Dry run: {} files planned, nothing written.", "✓".green(), plan.writes.len());
    } else {
        let _ = writeln!(out, "{} Reconciled {} files.", "✓".green().bold(), plan.writes.len());
    }
    out
}

fn cmd_reconcile(
    store: &dyn DeclarationStore,
    mut config: ReconcileConfig,
    args: ReconcileArgs,
    format: &OutputFormat,
) -> anyhow::Result<String> {
    if args.report_dir.is_some() {
        config.report_dir = args.report_dir;
    }
    let plan = plan(store, &config)?;
    if !args.dry_run {
        apply(store, &plan)?;
    }
    match format {
        OutputFormat::Text => Ok(plan_text(&plan, args.dry_run)),
        OutputFormat::Json => to_json(&plan.summary()),
    }
}

#[derive(Serialize)]
struct ExtractedRecord<'a> {
    name: &'a str,
    lines: usize,
}

fn cmd_extract(
    store: &dyn DeclarationStore,
    args: ExtractArgs,
    format: &OutputFormat,
) -> anyhow::Result<String> {
    let kind = RecordKind::from_backward_flag(args.backward);
    let set = extract_file(store, &args.file, kind)
        .with_context(|| format!("extracting {}", args.file.display()))?;
    if let Some(out) = &args.output {
        write_records(store, out, set.names(), &set)
            .with_context(|| format!("writing {}", out.display()))?;
    }
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for (name, body) in set.iter() {
                let _ = writeln!(out, "{} {}", name.bold(), format!("({} lines)", body.len()).dimmed());
            }
            let _ = writeln!(out, "{} {} records in {}", set.len().to_string().bold(), kind, args.file.display());
            Ok(out)
        }
        OutputFormat::Json => {
            let records: Vec<ExtractedRecord> = set
                .iter()
                .map(|(name, body)| ExtractedRecord { name, lines: body.len() })
                .collect();
            to_json(&records)
        }
    }
}
