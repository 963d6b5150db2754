use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{BackendDialect, ContinuityMode, QuestConfig, QuestLoopService};
use tracing_subscriber::EnvFilter;
use ui::{App, UiApp, build_app_context};

mod play;

/// Math story adventures driven by an AI story server.
#[derive(Debug, Parser)]
#[command(name = "math-quest", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    quest: QuestArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Open the desktop window (default).
    Ui,
    /// Play in the terminal.
    Play,
}

/// Overrides for the `QUEST_*` environment.
#[derive(Debug, Clone, Default, Args)]
struct QuestArgs {
    /// Story server origin, e.g. http://localhost:5000
    #[arg(long, global = true, value_name = "URL")]
    backend_url: Option<String>,

    /// Wire dialect: `story` or `quiz`.
    #[arg(long, global = true)]
    dialect: Option<BackendDialect>,

    /// How turns are linked: `session-id` or `scene-echo`.
    #[arg(long, global = true)]
    continuity: Option<ContinuityMode>,

    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// How long answer feedback stays up before the next scene.
    #[arg(long, global = true)]
    feedback_ms: Option<u64>,

    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: Option<u32>,

    /// Log filter, e.g. `debug` or `services=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Skip the intake and start with a default adventure.
    #[arg(long, global = true)]
    quick_start: bool,
}

impl QuestArgs {
    fn apply(&self, mut config: QuestConfig) -> anyhow::Result<QuestConfig> {
        if let Some(dialect) = self.dialect {
            config = config.with_dialect(dialect);
        }
        if let Some(url) = &self.backend_url {
            config = config.with_backend_url(url)?;
        }
        if let Some(continuity) = self.continuity {
            config.continuity = continuity;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = std::time::Duration::from_secs(secs);
        }
        if let Some(millis) = self.feedback_ms {
            config.feedback_dwell = std::time::Duration::from_millis(millis);
        }
        if let Some(attempts) = self.max_attempts {
            config.max_attempts = attempts;
        }
        Ok(config)
    }
}

struct DesktopApp {
    quest_loop: Arc<QuestLoopService>,
    backend_label: String,
    quick_start_on_launch: bool,
}

impl UiApp for DesktopApp {
    fn quest_loop(&self) -> Arc<QuestLoopService> {
        Arc::clone(&self.quest_loop)
    }

    fn backend_label(&self) -> String {
        self.backend_label.clone()
    }

    fn quick_start_on_launch(&self) -> bool {
        self.quick_start_on_launch
    }
}

fn init_tracing(log_level: Option<&str>) -> anyhow::Result<()> {
    let filter = match log_level {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid --log-level `{directives}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    // stdout belongs to `play`.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.quest.log_level.as_deref())?;

    let env_config = QuestConfig::from_env().context("invalid QUEST_* environment")?;
    let config = cli.quest.apply(env_config)?;
    tracing::info!(
        backend = %config.backend_url,
        dialect = %config.dialect,
        continuity = %config.continuity,
        "resolved configuration"
    );

    let quest_loop = Arc::new(
        QuestLoopService::from_config(&config).context("could not build the HTTP client")?,
    );
    let backend_label = config.backend_url.to_string();

    match cli.command.unwrap_or(Command::Ui) {
        Command::Ui => {
            let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
                quest_loop,
                backend_label,
                quick_start_on_launch: cli.quest.quick_start,
            });
            let context = build_app_context(&app);

            let desktop_cfg = DesktopConfig::new().with_window(
                WindowBuilder::new()
                    .with_title("Math Quest")
                    .with_always_on_top(false),
            );

            LaunchBuilder::desktop()
                .with_cfg(desktop_cfg)
                .with_context(context)
                .launch(App);
            Ok(())
        }
        Command::Play => {
            let stdin = std::io::stdin();
            let mut terminal = play::Terminal::new(stdin.lock(), std::io::stdout(), backend_label);
            terminal.run(&quest_loop, cli.quest.quick_start).await
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}
