use clap::{Parser, Subcommand};
use rpclink::config::{DEFAULT_HOST, DEFAULT_ORIGIN, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_SECS, timeout_from_secs};
use rpclink::{Client, ClientConfig, ClientError, ClientEvent, ErrorCode};
use serde::Serialize;
use serde_json::Value;
use tracing::Level;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{code}: {source}")]
    Client {
        code: &'static str,
        #[source]
        source: ClientError,
    },
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("event stream closed")]
    EventsClosed,
}

impl From<ClientError> for CliError {
    fn from(source: ClientError) -> Self {
        Self::Client { code: source.error_code(), source }
    }
}

#[derive(Parser, Debug)]
#[command(name = "rpclink-cli", about = "Issue RPC commands over the local WebSocket endpoint")]
struct Cli {
    #[arg(long, env = "RPC_CLIENT_ID")]
    client_id: u64,

    #[arg(long, env = "RPC_ORIGIN", default_value = DEFAULT_ORIGIN)]
    origin: String,

    #[arg(long, env = "RPC_HOST", default_value = DEFAULT_HOST)]
    host: String,

    #[arg(long, env = "RPC_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(long, env = "RPC_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, help = "0 waits forever")]
    timeout_secs: u64,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Authorize {
        #[arg(long = "scope", required = true)]
        scopes: Vec<String>,
    },
    Authenticate {
        #[arg(long, env = "RPC_ACCESS_TOKEN")]
        token: String,
    },
    SelectTextChannel {
        channel_id: u64,
    },
    SelectVoiceChannel {
        channel_id: u64,
    },
    Servers,
    Server {
        server_id: u64,
    },
    /// Print unsolicited events as they arrive.
    Watch {
        #[arg(long, help = "Subscribe to this event first")]
        event: Option<String>,

        #[arg(long, help = "Subscription args as a JSON object")]
        args: Option<String>,

        #[arg(long, help = "Stop after this many events")]
        count: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let mut config = ClientConfig::new(cli.client_id)
        .with_origin(cli.origin)
        .with_request_timeout(timeout_from_secs(cli.timeout_secs));
    config.host = cli.host;
    config.port = cli.port;

    let client = Client::connect(config).await?;
    run(&client, cli.command).await
}

async fn run(client: &Client, command: Command) -> Result<(), CliError> {
    match command {
        Command::Authorize { scopes } => {
            let scopes: Vec<&str> = scopes.iter().map(String::as_str).collect();
            print_json(&client.authorize(&scopes).await?)
        }
        Command::Authenticate { token } => print_json(&client.authenticate(&token).await?),
        Command::SelectTextChannel { channel_id } => print_json(&client.select_text_channel(channel_id).await?),
        Command::SelectVoiceChannel { channel_id } => print_json(&client.select_voice_channel(channel_id).await?),
        Command::Servers => print_json(&client.list_servers().await?),
        Command::Server { server_id } => print_json(&client.get_server(server_id).await?),
        Command::Watch { event, args, count } => watch(client, event, args, count).await,
    }
}

async fn watch(
    client: &Client,
    event: Option<String>,
    args: Option<String>,
    count: Option<usize>,
) -> Result<(), CliError> {
    let mut events = client.events();

    if let Some(event) = event {
        let args = args.map(|raw| serde_json::from_str::<Value>(&raw)).transpose()?;
        let subscription = client.subscribe(&event, args).await?;
        eprintln!("subscribed: {}", subscription.evt);
    }

    let mut seen = 0_usize;
    loop {
        if count.is_some_and(|limit| seen >= limit) {
            return Ok(());
        }
        match events.recv().await {
            Ok(ClientEvent::Dispatch(reply)) => {
                print_json(&reply)?;
                seen = seen.saturating_add(1);
            }
            Ok(ClientEvent::ProtocolError(message)) => eprintln!("protocol error: {message}"),
            Ok(ClientEvent::TransportError(message)) => eprintln!("transport error: {message}"),
            Ok(ClientEvent::Closed(reason)) => {
                eprintln!("connection closed: {}", reason.as_deref().unwrap_or("no reason"));
                return Ok(());
            }
            Ok(ClientEvent::Open) => {}
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                eprintln!("skipped {skipped} events");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => return Err(CliError::EventsClosed),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
