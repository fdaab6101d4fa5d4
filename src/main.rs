// ABOUTME: Entry point for warden — the permission gate hook for agent tool actions.
// ABOUTME: Reads the payload, runs the pipeline, emits exactly one line, logs best-effort.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use toolwarden::audit::{AuditRecord, AuditSink};
use toolwarden::config::Config;
use toolwarden::eval;
use toolwarden::gate::output::format_response;
use toolwarden::gate::pipeline::Gate;
use toolwarden::oracle::CommandOracle;
use toolwarden::policy;
use toolwarden::request::ActionRequest;

#[derive(Debug, Parser)]
#[command(name = "warden", about = "Permission gate hook for agent tool actions")]
struct Cli {
    /// Explicit policy document, overriding the lookup chain.
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Audit log destination, overriding config.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Replay a recorded audit log through the resolver and report agreement.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Free tokens passed through by the host's hook configuration.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // stdout carries the decision line and nothing else; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(log) = &cli.replay {
        let summary = eval::replay_log(log)?;
        println!("{}", eval::render_summary(&summary));
        return Ok(());
    }

    let mut raw_stdin = String::new();
    std::io::stdin().read_to_string(&mut raw_stdin)?;
    let fallback_cwd = std::env::current_dir()?;

    let mut req = ActionRequest::from_invocation(cli.args, raw_stdin, fallback_cwd);
    // Resolved once here; downstream heuristics treat cwd as the project boundary.
    req.resolve_project_root();

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config unreadable, using defaults");
        Config::default()
    });

    let policy = policy::load(cli.policy.as_deref(), &req.cwd, dirs::home_dir().as_deref());
    let oracle = CommandOracle::new(config.oracle.command.clone(), config.oracle.args.clone());
    let gate = Gate::new(&oracle, &policy.text);

    let evaluation = gate.evaluate(&req).await;
    let response = format_response(req.hook_kind, &evaluation.outcome);

    // The decision is the primary contract: emit before any logging can fail.
    println!("{response}");

    if config.audit.enabled {
        let path = cli
            .log_file
            .or(config.audit.log_path)
            .unwrap_or_else(Config::default_audit_path);
        let record = AuditRecord::new(&req, &evaluation, response);
        if let Err(e) = AuditSink::new(path).append(&record) {
            tracing::warn!(error = %e, "audit append failed");
        }
    }

    Ok(())
}
