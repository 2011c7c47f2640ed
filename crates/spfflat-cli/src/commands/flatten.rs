//! The `flatten` command: resolve, pack, and reconcile SPF records for
//! every configured domain.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use spfflat_core::{
    group_by_provider, run_bounded, AnyResolver, DomainReport, ReconcileEngine, RetryPolicy,
    DEFAULT_WORKER_LIMIT,
};

use crate::cli::{FlattenArgs, GlobalOpts};
use crate::config::{self, RunFlags};
use crate::error::CliError;
use crate::report::{render_domain_error, render_domain_report};

use super::util;

pub async fn run(global: &GlobalOpts, args: FlattenArgs) -> Result<(), CliError> {
    let config = config::load_config(&global.config)?;
    let dry_run = args.dry_run || !args.production;
    if dry_run && !global.quiet {
        println!("DRY-RUN: No changes will be applied.");
    }

    let resolver = AnyResolver::from_servers(&config::dns_server_list(&config)).map_err(|e| {
        CliError::Config {
            message: format!("failed to set up DNS resolver: {e}"),
        }
    })?;

    let tasks = config::build_tasks(
        &config,
        RunFlags {
            aggregate: args.aggregate,
            force: args.force,
            use_unflat_source: args.spf_unflat,
        },
    )?;
    let total = tasks.len();

    let cancel = CancellationToken::new();
    let mut futures = Vec::with_capacity(total);
    for group in group_by_provider(tasks).into_values() {
        debug!(provider = %group.provider, domains = group.tasks.len(), "scheduling provider group");
        for task in group.tasks {
            let limiter = std::sync::Arc::clone(&group.limiter);
            let resolver = resolver.clone();
            let cancel = cancel.clone();
            futures.push(async move {
                let domain = task.name.clone();
                let result = async {
                    let client =
                        util::make_client(&task.provider, task.api_key.clone(), task.secret_key.clone())?;
                    let engine = ReconcileEngine {
                        client,
                        limiter,
                        retry: RetryPolicy::default(),
                        cancel,
                        dry_run,
                    };
                    engine
                        .reconcile(&resolver, &task)
                        .await
                        .map_err(CliError::from)
                }
                .await;
                (domain, result)
            });
        }
    }

    let results: Vec<(String, Result<DomainReport, CliError>)> =
        run_bounded(DEFAULT_WORKER_LIMIT, futures).await;

    let mut output = String::new();
    let mut failed = 0;
    for (domain, result) in &results {
        match result {
            Ok(report) => output.push_str(&render_domain_report(report, dry_run)),
            Err(error) => {
                failed += 1;
                output.push_str(&render_domain_error(domain, error));
            }
        }
    }

    util::emit_output(args.output.as_deref(), &output, global.quiet)?;

    if failed > 0 {
        return Err(CliError::TasksFailed { failed, total });
    }
    Ok(())
}
