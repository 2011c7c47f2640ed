//! The `ping` command: per-domain credential check.

use std::fmt::Write as _;
use std::time::Instant;

use tabled::{Table, Tabled};

use spfflat_provider::ProviderClient;

use crate::cli::{GlobalOpts, PingArgs};
use crate::config;
use crate::error::CliError;

use super::util;

#[derive(Tabled)]
struct PingRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Your IP")]
    ip: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

pub async fn run(global: &GlobalOpts, args: PingArgs) -> Result<(), CliError> {
    let config = config::load_config(&global.config)?;
    let tasks = config::build_tasks(&config, config::RunFlags::default())?;
    let total = tasks.len();

    let mut rows = Vec::with_capacity(total);
    let mut failed = 0;

    for task in tasks {
        let started = Instant::now();
        let outcome = match util::make_client(
            &task.provider,
            task.api_key.clone(),
            task.secret_key.clone(),
        ) {
            Ok(client) => client.ping().await.map_err(CliError::from_provider),
            Err(e) => Err(e),
        };
        let duration = format!("{:?}", started.elapsed());

        match outcome {
            Ok(ping) if ping.is_success() => rows.push(PingRow {
                domain: task.name,
                provider: task.provider,
                status: "SUCCESS".into(),
                ip: ping.observed_ip,
                duration,
            }),
            Ok(ping) => {
                failed += 1;
                rows.push(PingRow {
                    domain: task.name,
                    provider: task.provider,
                    status: ping.status,
                    ip: String::new(),
                    duration,
                });
            }
            Err(e) => {
                failed += 1;
                rows.push(PingRow {
                    domain: task.name,
                    provider: task.provider,
                    status: format!("ERROR: {e}"),
                    ip: String::new(),
                    duration,
                });
            }
        }
    }

    let mut output = Table::new(&rows).to_string();
    let _ = write!(
        output,
        "\n\n=== Ping Summary ===\nTotal Domains: {total}\nSuccessful: {}\nFailed: {failed}\n",
        total - failed
    );

    util::emit_output(args.output.as_deref(), &output, global.quiet)?;

    if failed > 0 {
        return Err(CliError::TasksFailed { failed, total });
    }
    Ok(())
}
