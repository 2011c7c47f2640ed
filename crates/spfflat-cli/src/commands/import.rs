//! The `import` command: restore DNS records from backup files.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use spfflat_core::{
    BackupEngine, BackupFormat, ConflictStrategy, ExportOptions, ImportOptions, ImportReport,
    RateLimiter, RecordSet, RetryPolicy,
};

use crate::cli::{GlobalOpts, ImportArgs};
use crate::config::{self, Config};
use crate::error::CliError;

use super::util;

pub async fn run(global: &GlobalOpts, args: ImportArgs) -> Result<(), CliError> {
    let config = config::load_config(&global.config)?;
    let dry_run = args.dry_run || !args.production;
    if dry_run && !global.quiet {
        println!("DRY-RUN: Testing import operation without making changes.");
    }

    let strategy = ConflictStrategy::from(args.strategy);
    let total = args.files.len();
    let cancel = CancellationToken::new();

    // One token bucket per provider tag, shared across this run's files.
    let mut limiters: std::collections::HashMap<String, Arc<RateLimiter>> = Default::default();
    let mut failed = 0;

    for file in &args.files {
        let outcome = import_file(
            file,
            &config,
            &args,
            strategy,
            dry_run,
            &cancel,
            &mut limiters,
        )
        .await;
        match outcome {
            Ok(report) => {
                if !global.quiet {
                    print!("{}", render_import_report(&report));
                }
                if report.failed > 0 {
                    failed += 1;
                }
            }
            Err(error) => {
                failed += 1;
                eprintln!("Error importing from {}: {error}", file.display());
            }
        }
    }

    if !global.quiet {
        println!("\nImport Summary:");
        println!("  Success: {} files", total - failed);
        println!("  Failed:  {failed} files");
        println!("  Strategy: {strategy}");
        if args.backup_before {
            println!("  Backup:   Enabled before import");
        }
    }

    if failed > 0 {
        return Err(CliError::TasksFailed { failed, total });
    }
    Ok(())
}

async fn import_file(
    file: &Path,
    config: &Config,
    args: &ImportArgs,
    strategy: ConflictStrategy,
    dry_run: bool,
    cancel: &CancellationToken,
    limiters: &mut std::collections::HashMap<String, Arc<RateLimiter>>,
) -> Result<ImportReport, CliError> {
    let data = std::fs::read_to_string(file)?;
    let format = BackupFormat::from_path(file).map_err(CliError::from)?;
    let set: RecordSet = format.deserialize(&data).map_err(CliError::from)?;

    // The backup's domain must be configured so credentials are known.
    let domain_config = config
        .domains
        .iter()
        .find(|d| d.name == set.domain)
        .ok_or_else(|| CliError::Config {
            message: format!("domain {} not found in configuration", set.domain),
        })?;
    let provider = domain_config
        .provider
        .clone()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| config.provider.clone());

    let tasks = config::build_tasks(config, config::RunFlags::default())?;
    let task = tasks
        .into_iter()
        .find(|t| t.name == set.domain)
        .ok_or_else(|| CliError::Config {
            message: format!("domain {} not found in configuration", set.domain),
        })?;

    let limiter = Arc::clone(
        limiters
            .entry(provider.to_lowercase())
            .or_insert_with(|| Arc::new(RateLimiter::provider_default())),
    );
    let client = util::make_client(&provider, task.api_key.clone(), task.secret_key.clone())?;
    let engine = BackupEngine::new(
        client,
        limiter,
        RetryPolicy::default(),
        cancel.clone(),
        dry_run,
    );

    if args.backup_before && !dry_run {
        let backup = engine
            .export(&set.domain, &provider, &ExportOptions::default())
            .await?;
        let path = format!(
            "{}-pre-import-backup-{}.json",
            set.domain,
            Utc::now().format("%Y%m%d-%H%M%S")
        );
        let payload = BackupFormat::Json.serialize(&backup).map_err(CliError::from)?;
        std::fs::write(PathBuf::from(&path), payload)?;
        info!(domain = %set.domain, path, "pre-import backup written");
    }

    let options = ImportOptions {
        record_types: args.record_types.clone(),
        strategy,
        dry_run,
    };
    engine.import(&set, &options).await.map_err(CliError::from)
}

fn render_import_report(report: &ImportReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nImport Results for {}:", report.domain);
    let _ = writeln!(out, "  Total Records: {}", report.total);
    let _ = writeln!(out, "  Created: {}", report.created);
    let _ = writeln!(out, "  Updated: {}", report.updated);
    let _ = writeln!(out, "  Skipped: {}", report.skipped);
    let _ = writeln!(out, "  Failed: {}", report.failed);
    if report.cancelled {
        let _ = writeln!(out, "  Cancelled before completion.");
    }
    if !report.conflicts.is_empty() {
        let _ = writeln!(out, "  Conflicts: {}", report.conflicts.len());
        for conflict in &report.conflicts {
            let _ = writeln!(out, "    - {}: {}", conflict.kind, conflict.resolution);
        }
    }
    if !report.errors.is_empty() {
        let _ = writeln!(out, "  Errors: {}", report.errors.len());
        for error in &report.errors {
            let _ = writeln!(out, "    - {error}");
        }
    }
    out
}
