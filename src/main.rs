//! Placement Mutator - scheduling-constraint admission webhook

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use placement_mutator::server::{serve, ServerConfig};
use placement_mutator::source::{
    RuleSource, DEFAULT_RULES_CONFIGMAP, DEFAULT_RULES_KEY, DEFAULT_RULES_NAMESPACE,
};
use placement_mutator::telemetry::{init_telemetry, LogFormat};
use placement_mutator::webhook::WebhookState;
use placement_mutator::{evaluate, rule, RuleStore, WorkloadView};

/// Placement Mutator - rewrites Pod node selectors and tolerations from rules
#[derive(Parser, Debug)]
#[command(name = "placement-mutator", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the admission webhook server (default mode)
    Serve(ServeArgs),

    /// Print the patch the rules produce for a Pod manifest
    ///
    /// Useful for checking a rules file before rolling it out.
    Render(RenderArgs),
}

/// Serve mode arguments
#[derive(Parser, Debug)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "MUTATOR_ADDR", default_value = "0.0.0.0:8443")]
    addr: SocketAddr,

    /// TLS certificate PEM (serves plain HTTP when omitted together with the key)
    #[arg(long, env = "MUTATOR_TLS_CERT")]
    tls_cert: Option<PathBuf>,

    /// TLS private key PEM
    #[arg(long, env = "MUTATOR_TLS_KEY")]
    tls_key: Option<PathBuf>,

    /// Read rules from this file instead of the ConfigMap
    #[arg(long, env = "MUTATOR_RULES_FILE")]
    rules_file: Option<PathBuf>,

    /// Name of the rules ConfigMap
    #[arg(long, env = "MUTATOR_RULES_CONFIGMAP", default_value = DEFAULT_RULES_CONFIGMAP)]
    rules_configmap: String,

    /// Namespace of the rules ConfigMap
    #[arg(long, env = "MUTATOR_RULES_NAMESPACE", default_value = DEFAULT_RULES_NAMESPACE)]
    rules_namespace: String,

    /// ConfigMap data key holding the rules document
    #[arg(long, env = "MUTATOR_RULES_KEY", default_value = DEFAULT_RULES_KEY)]
    rules_key: String,

    /// Log line format
    #[arg(long, env = "MUTATOR_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,
}

impl ServeArgs {
    fn rule_source(&self) -> RuleSource {
        match &self.rules_file {
            Some(path) => RuleSource::File(path.clone()),
            None => RuleSource::ConfigMap {
                name: self.rules_configmap.clone(),
                namespace: self.rules_namespace.clone(),
                key: self.rules_key.clone(),
            },
        }
    }
}

/// Render mode arguments
#[derive(Args, Debug)]
struct RenderArgs {
    /// Rules document (JSON or YAML)
    #[arg(long)]
    rules: PathBuf,

    /// Pod manifest (JSON or YAML)
    #[arg(long)]
    pod: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Render(args)) => run_render(args).await,
        Some(Commands::Serve(args)) => run_server(args).await,
        // No subcommand: serve, still honouring the MUTATOR_* environment
        None => run_server(ServeArgs::parse_from(["placement-mutator"])).await,
    }
}

/// Run the webhook server
async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        eprintln!(
            "CRITICAL: Failed to install crypto provider: {:?}. \
             The webhook cannot serve TLS without a working crypto provider.",
            e
        );
        std::process::exit(1);
    }

    init_telemetry(args.log_format)?;

    let config = ServerConfig::new(args.addr, args.tls_cert.clone(), args.tls_key.clone())?;
    let source = args.rule_source();

    let store = Arc::new(RuleStore::load(source.load_or_empty().await));
    if store.is_empty() {
        tracing::warn!(
            source = %source,
            "No mutation rules loaded, pods will be admitted unchanged"
        );
    }
    spawn_reload_on_hangup(source, Arc::clone(&store));

    serve(config, Arc::new(WebhookState::new(store)))
        .await
        .map_err(|e| anyhow::anyhow!("Webhook server error: {}", e))
}

/// Reload rules from `source` whenever the process receives SIGHUP
///
/// A failed reload keeps the rules that are already active.
#[cfg(unix)]
fn spawn_reload_on_hangup(source: RuleSource, store: Arc<RuleStore>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGHUP handler, rule reload disabled");
            return;
        }
    };

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            tracing::info!(source = %source, "SIGHUP received, reloading mutation rules");
            match source.load().await {
                Ok(rules) => {
                    store.reload(rules);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Rule reload failed, keeping current rules");
                }
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(_source: RuleSource, _store: Arc<RuleStore>) {}

/// Print the patch `args.rules` produce for `args.pod`
async fn run_render(args: RenderArgs) -> anyhow::Result<()> {
    let rules_text = tokio::fs::read_to_string(&args.rules)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read rules file {:?}: {}", args.rules, e))?;
    let rules = rule::parse_rules(&rules_text)
        .map_err(|e| anyhow::anyhow!("Failed to parse rules: {}", e))?;

    let pod_text = tokio::fs::read_to_string(&args.pod)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read pod manifest {:?}: {}", args.pod, e))?;
    let pod: serde_json::Value = serde_yaml::from_str(&pod_text)
        .map_err(|e| anyhow::anyhow!("Failed to parse pod manifest: {}", e))?;

    let workload = WorkloadView::from_value(&pod)?;
    let evaluation = evaluate(&rules, &workload)?;

    for skipped in &evaluation.skipped_rules {
        eprintln!("skipped rule with malformed selector: {}", skipped);
    }
    match &evaluation.matched_rule {
        Some(name) => eprintln!("matched rule: {}", name),
        None => eprintln!("no rule matched"),
    }
    println!("{}", serde_json::to_string_pretty(&evaluation.operations)?);
    Ok(())
}
