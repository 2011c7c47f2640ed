//! The `export` command: write per-domain DNS record backups.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use spfflat_core::{
    group_by_provider, run_bounded, BackupEngine, BackupFormat, ExportOptions, RetryPolicy,
    DEFAULT_WORKER_LIMIT,
};

use crate::cli::{ExportArgs, ExportFormat, GlobalOpts};
use crate::config;
use crate::error::CliError;

use super::util;

impl From<&ExportFormat> for BackupFormat {
    fn from(format: &ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Txt => Self::Text,
        }
    }
}

pub async fn run(global: &GlobalOpts, args: ExportArgs) -> Result<(), CliError> {
    let config = config::load_config(&global.config)?;
    let dry_run = args.dry_run || !args.production;
    if dry_run && !global.quiet {
        println!("DRY-RUN: Testing connectivity and previewing export operation.");
    }

    let mut tasks = config::build_tasks(&config, config::RunFlags::default())?;
    if !args.domains.is_empty() {
        tasks.retain(|t| args.domains.contains(&t.name));
    }
    if tasks.is_empty() {
        return Err(CliError::Config {
            message: "no domains specified or configured for export".into(),
        });
    }
    let total = tasks.len();

    if let Some(dir) = &args.output_dir {
        if !dry_run {
            std::fs::create_dir_all(dir)?;
        }
    }

    let format = BackupFormat::from(&args.format);
    let cancel = CancellationToken::new();
    let mut futures = Vec::with_capacity(total);

    for group in group_by_provider(tasks).into_values() {
        for task in group.tasks {
            let limiter = Arc::clone(&group.limiter);
            let cancel = cancel.clone();
            let record_types = args.record_types.clone();
            let output_dir = args.output_dir.clone();
            futures.push(async move {
                let domain = task.name.clone();
                let result = async {
                    let client = util::make_client(
                        &task.provider,
                        task.api_key.clone(),
                        task.secret_key.clone(),
                    )?;
                    let engine = BackupEngine::new(
                        client,
                        limiter,
                        RetryPolicy::default(),
                        cancel,
                        dry_run,
                    );
                    let set = engine
                        .export(&task.name, &task.provider, &ExportOptions { record_types })
                        .await?;

                    if dry_run {
                        return Ok(format!(
                            "Connectivity test successful for {}. Would export {} records.",
                            task.name,
                            set.records.len()
                        ));
                    }

                    let data = format.serialize(&set).map_err(CliError::from)?;
                    let filename = export_filename(&task.name, format);
                    let path = match &output_dir {
                        Some(dir) => dir.join(filename),
                        None => PathBuf::from(filename),
                    };
                    std::fs::write(&path, data)?;
                    info!(domain = %task.name, path = %path.display(), "export written");
                    Ok(format!(
                        "Exported {} records for {} to {}",
                        set.records.len(),
                        task.name,
                        path.display()
                    ))
                }
                .await;
                (domain, result)
            });
        }
    }

    let results: Vec<(String, Result<String, CliError>)> =
        run_bounded(DEFAULT_WORKER_LIMIT, futures).await;

    let mut failed = 0;
    for (domain, result) in &results {
        match result {
            Ok(message) => {
                if !global.quiet {
                    println!("{message}");
                }
            }
            Err(error) => {
                failed += 1;
                eprintln!("Error exporting {domain}: {error}");
            }
        }
    }

    if !global.quiet {
        println!("\nExport Summary:");
        println!("  Success: {} domains", total - failed);
        println!("  Failed:  {failed} domains");
        println!("  Format:  {}", format.extension().to_uppercase());
        if let Some(dir) = &args.output_dir {
            println!("  Output:  {}", dir.display());
        }
    }

    if failed > 0 {
        return Err(CliError::TasksFailed { failed, total });
    }
    Ok(())
}

fn export_filename(domain: &str, format: BackupFormat) -> String {
    let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
    format!("{domain}-dns-backup-{timestamp}.{}", format.extension())
}
