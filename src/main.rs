use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::Instrument;

use stackhand::config::StackhandConfig;
use stackhand::coordinator::{Coordinator, ServiceDescriptor};
use stackhand::install::NoopInstaller;
use stackhand::notify::{spawn_status_batcher, LogNotifier};
use stackhand::provider::memory::MemoryProvider;
use stackhand::provider::ProviderHandle;
use stackhand::telemetry;
use stackhand::token::PlainCipher;

#[derive(Parser)]
#[command(name = "stackhand")]
#[command(about = "Provision chained cloud resources with automatic rollback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the shared base of a scope and print its continuation token
    CreateScope {
        scope: String,
        /// Notification thread to report into; carried in the token so
        /// follow-up workflows keep posting there
        #[arg(long)]
        thread: Option<String>,
    },
    /// Launch a named server into an existing scope
    AddServer {
        scope: String,
        server_name: String,
        /// Continuation token from create-scope
        token: String,
    },
    /// Deploy a service onto a running server
    AddService {
        scope: String,
        server_name: String,
        /// Artifact id of the service to deploy
        artifact: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Path prefix the service is routed under
        #[arg(long)]
        path: String,
        token: String,
    },
    /// Provision a managed database reachable from the scope's servers
    CreateDatabase {
        scope: String,
        database: String,
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    StackhandConfig::load_env_file()?;
    let config = StackhandConfig::load()?;
    telemetry::init_telemetry(&config.observability.log_level)?;
    let cli = Cli::parse();

    if config.provider.mode != "memory" {
        bail!(
            "provider mode {:?} needs an external adapter; only \"memory\" is built in",
            config.provider.mode
        );
    }
    let memory = Arc::new(MemoryProvider::new());
    let provider = ProviderHandle::new()
        .with_compute(memory.clone())
        .with_load_balancer(memory.clone())
        .with_database(memory);

    let notifier = Arc::new(LogNotifier);
    let (status, batcher) = spawn_status_batcher(
        notifier.clone(),
        Duration::from_secs(config.notify.status_flush_seconds),
        config.notify.buffer_capacity,
    );
    let coordinator = Coordinator::new(
        provider,
        Arc::new(PlainCipher),
        notifier,
        Arc::new(NoopInstaller),
        status,
        config.provision_settings(),
    );

    let correlation = telemetry::generate_correlation_id();
    let outcome = run_command(&coordinator, cli.command, &correlation).await;

    // Dropping the coordinator closes the status channel so the batcher can
    // flush its last lines before we report the outcome.
    drop(coordinator);
    batcher.await?;

    match outcome {
        Ok(message) => {
            println!("✅ {message}");
            Ok(())
        }
        Err(err) => {
            println!("❌ {err}");
            std::process::exit(1);
        }
    }
}

async fn run_command(
    coordinator: &Coordinator,
    command: Commands,
    correlation: &str,
) -> Result<String> {
    match command {
        Commands::CreateScope { scope, thread } => {
            let span = telemetry::workflow_span("create-scope", &scope, correlation);
            let outcome = coordinator
                .create_scope(&scope, thread.as_deref())
                .instrument(span)
                .await?;
            Ok(format!(
                "Scope {scope} ready (key {}, security group {})\ntoken: {}",
                outcome.key_name, outcome.security_group_id, outcome.token
            ))
        }
        Commands::AddServer {
            scope,
            server_name,
            token,
        } => {
            let span = telemetry::workflow_span("add-server", &scope, correlation);
            let outcome = coordinator
                .add_server_to_scope(&scope, &server_name, &token)
                .instrument(span)
                .await?;
            Ok(format!(
                "Server {server_name} running as {} at {}\ntoken: {}",
                outcome.server_id, outcome.public_dns, outcome.token
            ))
        }
        Commands::AddService {
            scope,
            server_name,
            artifact,
            port,
            path,
            token,
        } => {
            let descriptor = ServiceDescriptor {
                artifact_id: artifact,
                port,
                path,
            };
            let span = telemetry::workflow_span("add-service", &scope, correlation);
            let outcome = coordinator
                .add_service_to_server(&scope, &server_name, &descriptor, &token)
                .instrument(span)
                .await?;
            let how = if outcome.reused_target_group {
                "joined existing target group"
            } else {
                "created new routing chain"
            };
            Ok(format!(
                "Service {} on {server_name} ({how}, target group {})\ntoken: {}",
                descriptor.artifact_id, outcome.target_group_arn, outcome.token
            ))
        }
        Commands::CreateDatabase {
            scope,
            database,
            token,
        } => {
            let span = telemetry::workflow_span("create-database", &scope, correlation);
            let outcome = coordinator
                .create_database(&scope, &database, &token)
                .instrument(span)
                .await?;
            Ok(format!(
                "Database {} ready at {}\ntoken: {}",
                outcome.identifier, outcome.endpoint, outcome.token
            ))
        }
    }
}
