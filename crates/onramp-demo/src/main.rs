/*
[INPUT]:  CLI arguments, YAML configuration file, environment, OS shutdown signals
[OUTPUT]: Checkout URLs, observed transaction status, webhook listener
[POS]:    Binary entry point
[UPDATE]: When changing CLI commands, startup flow, or shutdown handling
*/

mod cli;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use onramp_adapter::{
    TrackingId, TransactionsQuery, WebhookEventType, serve_webhooks, webhook_router,
};
use onramp_demo::{DemoConfig, flow};

#[derive(Parser, Debug)]
#[command(name = "onramp-demo", version, about = "Coinbase onramp checkout demo")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Session token, checkout URL, then wait for the transaction outcome
    Run {
        /// Stop after printing the checkout URL
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Print a fresh checkout URL and exit
    Url,
    /// Follow an earlier checkout with the configured status mode (polling or webhook)
    Status {
        tracking_id: String,
        /// Single lookup instead of polling
        #[arg(long)]
        once: bool,
    },
    /// Run the webhook listener until interrupted
    ServeWebhooks {
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
        #[arg(long, value_name = "PATH")]
        path: Option<String>,
    },
    /// Manage remote webhook registrations
    #[command(subcommand)]
    Webhooks(WebhooksCommand),
    /// Interactively write a configuration file
    Init {
        #[arg(long, value_name = "PATH", default_value = "onramp.yaml")]
        output: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum WebhooksCommand {
    List,
    Create {
        notification_uri: String,
        #[arg(long = "event-type", value_parser = parse_event_type, default_value = "onramp.transaction.completed")]
        event_type: WebhookEventType,
    },
    Delete {
        id: String,
    },
}

fn parse_event_type(raw: &str) -> std::result::Result<WebhookEventType, String> {
    WebhookEventType::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = WebhookEventType::ALL.iter().map(|t| t.as_str()).collect();
        format!("unknown event type {raw:?}; expected one of {}", known.join(", "))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    if let Command::Init { output } = &args.command {
        return cli::init::run_init(output.clone());
    }

    let config = DemoConfig::load(args.config_path.as_deref()).context("load config")?;
    match &args.command {
        Command::Run { .. } | Command::Url => config.validate_checkout(),
        _ => config.validate(),
    }
    .context("validate config")?;
    info!(
        config_path = ?args.config_path,
        mode = ?config.status.mode,
        "configuration loaded"
    );

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    match args.command {
        Command::Run { dry_run } => run(&config, dry_run, &shutdown).await,
        Command::Url => {
            let client = config.build_client()?;
            let link = flow::create_checkout(&client, &config).await?;
            print_link(&link);
            Ok(())
        }
        Command::Status { tracking_id, once } => {
            status(&config, TrackingId::new(tracking_id), once, &shutdown).await
        }
        Command::ServeWebhooks { bind, path } => serve(&config, bind, path, shutdown).await,
        Command::Webhooks(command) => webhooks(&config, command).await,
        Command::Init { .. } => Ok(()),
    }
}

async fn run(config: &DemoConfig, dry_run: bool, shutdown: &CancellationToken) -> Result<()> {
    let client = Arc::new(config.build_client()?);
    info!(dry_run, "starting onramp checkout flow");

    let outcome = flow::run_checkout_flow(client, config, dry_run, shutdown, print_link).await?;

    match outcome.observation {
        Some(observation) => match observation.last_status {
            Some(status) if observation.is_terminal() => {
                println!("Final status: {status}");
            }
            Some(status) => println!(
                "No final status after {} checks; last seen: {status}",
                observation.attempts
            ),
            None => println!(
                "No transaction seen after {} checks",
                observation.attempts
            ),
        },
        None if dry_run => {}
        None => println!("Status observation interrupted"),
    }
    Ok(())
}

async fn status(
    config: &DemoConfig,
    tracking_id: TrackingId,
    once: bool,
    shutdown: &CancellationToken,
) -> Result<()> {
    let client = Arc::new(config.build_client()?);

    if once {
        let page = client
            .transactions(tracking_id.as_str(), &TransactionsQuery::latest())
            .await
            .context("fetch transactions")?;
        match page.latest() {
            Some(transaction) => println!(
                "{}",
                serde_json::to_string_pretty(transaction).context("render transaction")?
            ),
            None => println!("No transactions for {tracking_id}"),
        }
        return Ok(());
    }

    match flow::watch_status(client, &config.status, &tracking_id, shutdown).await? {
        Some(observation) => match observation.last_status {
            Some(status) => println!("{tracking_id}: {status} after {} checks", observation.attempts),
            None => println!("{tracking_id}: no transaction after {} checks", observation.attempts),
        },
        None => println!("Status observation interrupted"),
    }
    Ok(())
}

async fn serve(
    config: &DemoConfig,
    bind: Option<SocketAddr>,
    path: Option<String>,
    shutdown: CancellationToken,
) -> Result<()> {
    let bind = bind.unwrap_or(config.status.webhook.bind);
    let path = path.unwrap_or_else(|| config.status.webhook.path.clone());

    let (events, mut receiver) = broadcast::channel(64);
    let router = webhook_router(&path, events);
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("bind webhook listener on {bind}"))?;
    info!(%bind, path = %path, "serving webhooks; press Ctrl-C to stop");

    let printer_shutdown = shutdown.clone();
    let printer = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = printer_shutdown.cancelled() => break,
                received = receiver.recv() => match received {
                    Ok(event) => println!("{}", event.payload),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "webhook printer lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    });

    serve_webhooks(listener, router, shutdown)
        .await
        .context("webhook listener")?;
    printer.await.context("join webhook printer")?;
    Ok(())
}

async fn webhooks(config: &DemoConfig, command: WebhooksCommand) -> Result<()> {
    let client = config.build_client()?;
    let result = match command {
        WebhooksCommand::List => client.list_webhooks().await.map(|hooks| {
            if hooks.is_empty() {
                println!("No webhooks registered");
            }
            for hook in hooks {
                println!("{}\t{}\t{}", hook.id, hook.event_type, hook.notification_uri);
            }
        }),
        WebhooksCommand::Create {
            notification_uri,
            event_type,
        } => client
            .create_webhook(&notification_uri, event_type)
            .await
            .map(|hook| println!("Registered webhook {}", hook.id)),
        WebhooksCommand::Delete { id } => client
            .delete_webhook(&id)
            .await
            .map(|()| println!("Deleted webhook {id}")),
    };

    match result {
        Err(err) if err.is_not_found() => {
            warn!("webhook management is not available for this account yet");
            Err(anyhow!(err).context("webhook management endpoint returned 404"))
        }
        other => other.context("webhook management request"),
    }
}

fn print_link(link: &flow::CheckoutLink) {
    println!("Tracking id:  {}", link.tracking_id);
    println!("Checkout URL: {}", link.url);
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
