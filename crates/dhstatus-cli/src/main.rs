//! deckhouse-status - is my PR preview deployment up to date?
//!
//! The `deckhouse-status` command correlates the running Deckhouse pod with
//! its CI build and the registry digest of its image tag.
//!
//! ## Commands
//!
//! - `status` (default): one-shot report, full sections or `--short`
//! - `watch-build`: follow the PR's build check-run until it completes

mod display;

use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dhstatus_core::status::DEFAULT_STATUS_TIMEOUT;
use dhstatus_core::watch::DEFAULT_WATCH_TIMEOUT;
use dhstatus_core::{BuildWatcher, StatusOptions, WatchOptions, WatchOutcome};
use dhstatus_github::{GitHubClient, GitHubConfig};
use dhstatus_kube::{ClusterTarget, KubeCluster};
use dhstatus_registry::{RegistryClient, RegistryConfig};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use display::{DisplayConfig, Icons, Printer, WatchSpinner, Zone};

#[derive(Parser)]
#[command(name = "deckhouse-status")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check whether a Deckhouse PR preview deployment runs the latest build", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Timezone for displayed times: IANA name or hour offset such as +3
    #[arg(long, global = true, default_value = "Europe/Moscow")]
    tz: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Replace emoji with ASCII markers
    #[arg(long, global = true)]
    no_emoji: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    /// GitHub token for higher API rate limits
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    #[command(flatten)]
    status: StatusArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone)]
struct StatusArgs {
    /// Compact two-line output
    #[arg(short, long)]
    short: bool,

    /// Skip GitHub API calls
    #[arg(long)]
    no_github: bool,

    /// Skip the registry digest check
    #[arg(long)]
    no_registry: bool,

    /// Overall timeout in seconds
    #[arg(long, default_value_t = DEFAULT_STATUS_TIMEOUT.as_secs())]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Show deployment status (default)
    Status(StatusArgs),

    /// Watch the build check-run for the running PR until it completes
    WatchBuild {
        /// Give up after this many seconds
        #[arg(long, default_value_t = DEFAULT_WATCH_TIMEOUT.as_secs())]
        timeout: u64,

        /// Restart the deployment when the build succeeds
        #[arg(long)]
        restart: bool,
    },
}

/// Cancelled on Ctrl-C or SIGTERM.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        debug!("interrupt received");
        trigger.cancel();
    });
    token
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn github_client(token: Option<&str>) -> Result<GitHubClient> {
    let mut config = GitHubConfig::default();
    if let Some(token) = token {
        config = config.with_token(token);
    }
    GitHubClient::new(config).context("Failed to create GitHub client")
}

/// Local setup failures end a watch like an unresolvable target.
fn watch_setup_failed(err: impl std::fmt::Display) -> ExitCode {
    eprintln!("Error: {err:#}");
    let outcome = WatchOutcome::Errored {
        message: err.to_string(),
    };
    ExitCode::from(outcome.exit_code())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = dhstatus_core::telemetry::default_level(cli.verbose);
    dhstatus_core::init_tracing(cli.log_json, level);

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let display = DisplayConfig {
        short: false,
        show_github: true,
        show_registry: true,
        color: !cli.no_color,
        emoji: !cli.no_emoji,
        zone: Zone::parse(&cli.tz),
    };
    let cancel = interrupt_token();

    let result = match cli.command {
        Some(Commands::WatchBuild { timeout, restart }) => {
            cmd_watch_build(display, cli.github_token, timeout, restart, &cancel).await
        }
        Some(Commands::Status(args)) => {
            cmd_status(display, cli.github_token, &args, &cancel).await
        }
        None => cmd_status(display, cli.github_token, &cli.status, &cancel).await,
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn cmd_status(
    mut display: DisplayConfig,
    github_token: Option<String>,
    args: &StatusArgs,
    cancel: &CancellationToken,
) -> Result<ExitCode> {
    display.short = args.short;
    display.show_github = !args.no_github;
    display.show_registry = !args.no_registry;

    let cluster = KubeCluster::connect(ClusterTarget::default()).await?;
    let github = github_client(github_token.as_deref())?;
    let registry = RegistryClient::new(RegistryConfig::default())
        .context("Failed to create registry client")?;

    let options = StatusOptions {
        skip_ci: args.no_github,
        skip_registry: args.no_registry,
        skip_commit_details: args.short,
        timeout: Duration::from_secs(args.timeout),
    };
    let report =
        dhstatus_core::collect_status(&cluster, &github, &registry, &options, cancel).await?;

    let printer = Printer::new(display);
    let mut stdout = io::stdout().lock();
    printer.render(&mut stdout, &report, chrono::Utc::now())?;
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}

async fn cmd_watch_build(
    display: DisplayConfig,
    github_token: Option<String>,
    timeout: u64,
    restart: bool,
    cancel: &CancellationToken,
) -> Result<ExitCode> {
    let cluster = match KubeCluster::connect(ClusterTarget::default()).await {
        Ok(cluster) => cluster,
        Err(err) => return Ok(watch_setup_failed(err)),
    };
    let github = match github_client(github_token.as_deref()) {
        Ok(github) => github,
        Err(err) => return Ok(watch_setup_failed(err)),
    };

    let options = WatchOptions {
        timeout: Duration::from_secs(timeout),
        restart_on_success: restart,
        ..Default::default()
    };
    let spinner = WatchSpinner::new(Icons::new(display.emoji), display.color);
    let printer = Printer::new(display);

    let watcher = BuildWatcher::new(&github, &cluster, &spinner, options);
    let outcome = watcher
        .run(cancel, |target| {
            let _ = printer.watch_header(&mut io::stderr().lock(), target);
        })
        .await;

    Ok(ExitCode::from(outcome.exit_code()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use dhstatus_core::SourceError;

    #[test]
    fn test_watch_setup_failures_exit_as_local_errors() {
        let k8s = SourceError::Cluster("cannot create k8s client: no kubeconfig".to_string());
        assert_eq!(watch_setup_failed(k8s), ExitCode::from(2));

        let github = anyhow::anyhow!("builder error").context("Failed to create GitHub client");
        assert_eq!(watch_setup_failed(github), ExitCode::from(2));
    }

    #[test]
    fn test_github_client_builds_with_and_without_token() {
        assert!(github_client(None).is_ok());
        assert!(github_client(Some("ghp_example")).is_ok());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_invocation_is_status() {
        let cli = Cli::try_parse_from(["deckhouse-status", "-s", "--no-registry"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.status.short);
        assert!(cli.status.no_registry);
        assert!(!cli.status.no_github);
        assert_eq!(cli.status.timeout, 15);
        assert_eq!(cli.tz, "Europe/Moscow");
    }

    #[test]
    fn test_watch_build_flags() {
        let cli = Cli::try_parse_from([
            "deckhouse-status",
            "watch-build",
            "--restart",
            "--timeout",
            "120",
            "--tz",
            "+5",
            "--no-emoji",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::WatchBuild { timeout, restart }) => {
                assert_eq!(timeout, 120);
                assert!(restart);
            }
            _ => panic!("expected watch-build"),
        }
        assert_eq!(cli.tz, "+5");
        assert!(cli.no_emoji);

        let cli = Cli::try_parse_from(["deckhouse-status", "watch-build"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::WatchBuild {
                timeout: 3600,
                restart: false
            })
        ));
    }

    #[test]
    fn test_status_subcommand_and_global_flags() {
        let cli = Cli::try_parse_from([
            "deckhouse-status",
            "status",
            "--short",
            "--timeout",
            "30",
            "--no-color",
            "-v",
        ])
        .unwrap();
        let Some(Commands::Status(args)) = cli.command else {
            panic!("expected status");
        };
        assert!(args.short);
        assert_eq!(args.timeout, 30);
        assert!(cli.no_color);
        assert!(cli.verbose);
    }
}
