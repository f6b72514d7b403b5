use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

mod application;
mod domain;
mod infrastructure;

use application::errors::BotError;
use application::messaging::{CommandResolver, Dispatcher, ErrorReporter};
use domain::entities::{ExecContext, IncomingEvent, Matcher, PluginDescriptor};
use domain::traits::Transport;
use infrastructure::adapters::ConsoleTransport;
use infrastructure::config::Config;
use infrastructure::plugins::{DirectorySource, PluginRegistry, PluginSource, StaticSource};
use infrastructure::storage::{JsonFileStore, UsageStore};

#[derive(Parser)]
#[command(name = "gardu-bot")]
#[command(about = "Message routing and authorization engine for chat automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot with the console transport
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_bot(cli.config).await;
        }
        Commands::Version => {
            println!("gardu-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

async fn run_bot(config_path: String) {
    // Load config
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    tracing::info!("Starting gardu-bot: {}", config.bot.name);

    // Usage storage with its periodic flush
    let store = Arc::new(UsageStore::new(
        Arc::new(JsonFileStore::new(&config.storage.path)),
        config.limits.default_allowance,
    ));
    if let Err(e) = store.load().await {
        tracing::warn!(%e, "continuing with an empty usage document");
    }
    let flush_task = Arc::clone(&store).spawn_flush_task(config.storage.flush_seconds);

    // Plugin discovery: directory units when configured, built-ins always
    let source: Box<dyn PluginSource> = if config.plugins.auto_load {
        Box::new(CombinedSource {
            sources: vec![
                Box::new(StaticSource::new(builtin_plugins())),
                Box::new(DirectorySource::new(&config.plugins.directory)),
            ],
        })
    } else {
        Box::new(StaticSource::new(builtin_plugins()))
    };
    let registry = Arc::new(PluginRegistry::new(source));
    registry.load();

    let transport: Arc<dyn Transport> = Arc::new(ConsoleTransport::new());
    let dispatcher = Dispatcher::new(
        CommandResolver::new(config.prefix_chars()),
        Arc::clone(&registry),
        Arc::clone(&store),
        Arc::clone(&transport),
        ErrorReporter::new(Arc::clone(&transport), config.bot.admin_contact.clone()),
        config.bot.owner.clone(),
    );

    console_loop(&dispatcher, &registry, &transport, &store).await;

    flush_task.abort();
    if let Err(e) = store.flush().await {
        tracing::warn!(%e, "final flush failed");
    }
}

/// Drive stdin lines through the dispatcher. `:reload` models the
/// external reload signal, `:group` toggles group context, `:quit` exits.
async fn console_loop(
    dispatcher: &Dispatcher,
    registry: &Arc<PluginRegistry>,
    transport: &Arc<dyn Transport>,
    store: &Arc<UsageStore>,
) {
    let chat_id = "console@local";
    let sender_id = "console-user@local";
    let mut is_group = false;

    println!("gardu-bot console. :reload reloads plugins, :group toggles group mode, :quit exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(%e, "stdin read failed");
                break;
            }
        };

        match line.trim() {
            ":quit" => break,
            ":reload" => {
                let count = registry.reload();
                println!("reloaded {} plugins", count);
                continue;
            }
            ":group" => {
                is_group = !is_group;
                println!("group mode: {}", is_group);
                continue;
            }
            ":flush" => {
                match store.flush().await {
                    Ok(()) => println!("flushed"),
                    Err(e) => println!("flush failed: {}", e),
                }
                continue;
            }
            _ => {}
        }

        let (is_admin, is_bot_admin) = if is_group {
            resolve_roles(transport, chat_id, sender_id).await
        } else {
            (false, false)
        };

        let event = IncomingEvent::new(chat_id, sender_id, line)
            .with_group(is_group)
            .with_admin_flags(is_admin, is_bot_admin);
        let outcome = dispatcher.dispatch(&event).await;
        tracing::debug!(?outcome, "dispatch finished");
    }
}

/// Look the sender and the bot up in the group participant list.
async fn resolve_roles(
    transport: &Arc<dyn Transport>,
    chat_id: &str,
    sender_id: &str,
) -> (bool, bool) {
    match transport.fetch_group_metadata(chat_id).await {
        Ok(participants) => {
            let is_admin = participants
                .iter()
                .any(|p| p.id == sender_id && p.is_admin);
            let is_bot_admin = participants
                .iter()
                .any(|p| p.id == "gardu-bot@local" && p.is_admin);
            (is_admin, is_bot_admin)
        }
        Err(e) => {
            tracing::warn!(%e, "group metadata fetch failed, assuming no roles");
            (false, false)
        }
    }
}

/// Runs several sources back to back, keeping their combined load order.
struct CombinedSource {
    sources: Vec<Box<dyn PluginSource>>,
}

impl PluginSource for CombinedSource {
    fn discover(&self) -> Vec<PluginDescriptor> {
        self.sources.iter().flat_map(|s| s.discover()).collect()
    }
}

fn builtin_plugins() -> Vec<PluginDescriptor> {
    vec![
        PluginDescriptor::new(
            "ping",
            Matcher::tokens(["ping"]),
            Arc::new(|event: IncomingEvent, ctx: ExecContext| async move {
                ctx.transport
                    .send_message(&event.chat_id, "Pong!")
                    .await
                    .map_err(|e| BotError::Handler(e.to_string()))
            }),
        )
        .with_category("info"),
        PluginDescriptor::new(
            "usage",
            Matcher::tokens(["usage", "hits"]),
            Arc::new(|event: IncomingEvent, ctx: ExecContext| async move {
                let data = ctx.store.read().await;
                let mut lines: Vec<String> = data
                    .cmd
                    .iter()
                    .map(|(token, count)| format!("{}: {}", token, count))
                    .collect();
                drop(data);
                lines.sort();
                let body = if lines.is_empty() {
                    "no invocations yet".to_string()
                } else {
                    lines.join("\n")
                };
                ctx.transport
                    .send_message(&event.chat_id, &body)
                    .await
                    .map_err(|e| BotError::Handler(e.to_string()))
            }),
        )
        .with_category("info"),
    ]
}

fn init_config() {
    let config = Config::default();
    match serde_yaml::to_string(&config) {
        Ok(yaml) => {
            if let Err(e) = std::fs::write("config.yaml", yaml) {
                tracing::error!("Failed to write config.yaml: {}", e);
            } else {
                println!("Wrote config.yaml");
            }
        }
        Err(e) => tracing::error!("Failed to serialize default config: {}", e),
    }
}
