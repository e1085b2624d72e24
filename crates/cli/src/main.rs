use std::sync::Arc;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    steward_approvals::{ApprovalStore, Decision},
    steward_storage::FileKvStore,
};

#[derive(Parser)]
#[command(name = "steward", about = "Steward — personal automation agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server.
    Gateway {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Approval management.
    Approvals {
        #[command(subcommand)]
        action: ApprovalAction,
    },
}

#[derive(Subcommand)]
enum ApprovalAction {
    /// List pending approval requests.
    List,
    /// Decide a pending request.
    Decide {
        id: String,
        /// "allow" or "deny".
        decision: String,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn approval_store() -> ApprovalStore {
    ApprovalStore::new(Arc::new(FileKvStore::new()))
}

fn handle_approvals(action: ApprovalAction) -> anyhow::Result<()> {
    let approvals = approval_store();
    match action {
        ApprovalAction::List => {
            let pending = approvals.list_pending()?;
            if pending.is_empty() {
                println!("no pending approvals");
            }
            for record in pending {
                println!(
                    "{}  {}  {}  {}",
                    record.id, record.tool, record.requester, record.input
                );
            }
            Ok(())
        },
        ApprovalAction::Decide { id, decision } => {
            let decision = match decision.as_str() {
                "allow" => Decision::Allow,
                "deny" => Decision::Deny,
                other => anyhow::bail!("decision must be \"allow\" or \"deny\", got \"{other}\""),
            };
            if approvals.decide(&id, decision)? {
                println!("recorded");
            } else {
                println!("request not found or already decided");
            }
            Ok(())
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "steward starting");

    match cli.command {
        Commands::Gateway { bind, port } => {
            // A broken config file must not start the gateway with default
            // (empty-allowlist, no-rules) policy.
            let mut config = steward_config::discover_and_load_strict()?;
            if let Some(bind) = bind {
                config.gateway.bind = bind;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            steward_gateway::start_gateway(&config).await
        },
        Commands::Approvals { action } => handle_approvals(action),
    }
}
