//! Terminal client for a tickshare server.
//!
//! `watch` keeps a live view of every stopwatch in a group; the other
//! subcommands mutate records through the HTTP interface, which in turn
//! pushes the change to every watching client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tickshare-client -- watch my-group
//! cargo run --bin tickshare-client -- add my-group
//! cargo run --bin tickshare-client -- toggle <STOPWATCH_ID>
//! ```

use std::{io::Write, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tickshare::{
    client::{ApiClient, ClientError, GENERATED_ID_LEN, Reconciler, now_millis, random_id},
    dto::ws::{ReceivedEvent, SyncRequest},
    state::stopwatch::{DEFAULT_NAME, Stopwatch, StopwatchGroup},
};

/// Name given to groups the client creates.
const NEW_GROUP_NAME: &str = "none";
const RENDER_TICK: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "tickshare-client")]
#[command(about = "Watch and edit shared stopwatches from the terminal", long_about = None)]
struct Args {
    /// Base URL of the tickshare server
    #[arg(short = 'u', long, default_value = "http://127.0.0.1:8080")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Live view of every stopwatch in a group
    Watch { group: String },
    /// Create a stopwatch and append it to a group
    Add {
        group: String,
        /// Use this id instead of a random one
        #[arg(long)]
        id: Option<String>,
    },
    /// Start a stopped stopwatch or stop a running one
    Toggle { id: String },
    /// Zero a stopwatch and leave it stopped
    Reset { id: String },
    /// Change a stopwatch's display name
    Rename { id: String, name: String },
    /// Delete a stopwatch and drop it from a group
    Remove { group: String, id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    let api = ApiClient::new(&args.url).context("configuring http client")?;

    match args.command {
        Command::Watch { group } => watch(&api, &group).await,
        Command::Add { group, id } => add(&api, &group, id).await,
        Command::Toggle { id } => edit(&api, &id, |view| view.toggle(&id, now_millis())).await,
        Command::Reset { id } => edit(&api, &id, |view| view.reset(&id)).await,
        Command::Rename { id, name } => edit(&api, &id, |view| view.rename(&id, name)).await,
        Command::Remove { group, id } => remove(&api, &group, &id).await,
    }
}

/// Logs go to stderr at `warn` so they do not fight the live view.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn add(api: &ApiClient, group_id: &str, id: Option<String>) -> anyhow::Result<()> {
    let id = id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| random_id(GENERATED_ID_LEN));

    let record = api.get_stopwatch(&id).await.context("fetching stopwatch")?;
    api.put_stopwatch(&id, &record)
        .await
        .context("storing stopwatch")?;

    let mut group = api.get_group(group_id).await.context("fetching group")?;
    if group.ids.is_empty() && group.name == DEFAULT_NAME {
        group.name = NEW_GROUP_NAME.to_string();
    }
    let group = group.with_member(id.as_str());
    api.put_group(group_id, &group)
        .await
        .context("storing group")?;

    println!("{id}");
    Ok(())
}

/// Fetch a record, change it through the local view, and push the result.
async fn edit<F>(api: &ApiClient, id: &str, change: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut Reconciler) -> Option<Stopwatch>,
{
    let mut view = Reconciler::new();
    view.track(id, api.get_stopwatch(id).await.context("fetching stopwatch")?);

    if let Some(record) = change(&mut view) {
        api.put_stopwatch(id, &record)
            .await
            .context("storing stopwatch")?;
    }
    Ok(())
}

async fn remove(api: &ApiClient, group_id: &str, id: &str) -> anyhow::Result<()> {
    api.delete_stopwatch(id)
        .await
        .context("deleting stopwatch")?;

    let group: StopwatchGroup = api.get_group(group_id).await.context("fetching group")?;
    api.put_group(group_id, &group.without_member(id))
        .await
        .context("storing group")?;
    Ok(())
}

async fn watch(api: &ApiClient, group_id: &str) -> anyhow::Result<()> {
    let url = api.sync_url()?;
    let (socket, _) = connect_async(url.as_str())
        .await
        .map_err(ClientError::from)
        .context("connecting to sync socket")?;
    let (mut write, mut read) = socket.split();

    let group = api.get_group(group_id).await.context("fetching group")?;
    let mut view = Reconciler::new();

    send_request(&mut write, &SyncRequest::Clear).await?;
    for id in &group.ids {
        let record = api.get_stopwatch(id).await.context("fetching stopwatch")?;
        view.track(id.as_str(), record);
        send_request(&mut write, &SyncRequest::Listen { id: id.clone() }).await?;
    }

    let mut tick = tokio::time::interval(RENDER_TICK);
    loop {
        tokio::select! {
            _ = tick.tick() => draw(&group, &view)?,
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ReceivedEvent>(text.as_str()) {
                    Ok(event) => {
                        let changed = view.apply(&event);
                        debug!(id = %event.id, kind = ?event.kind, changed, "event applied");
                    }
                    Err(err) => warn!(error = %err, "ignoring unexpected frame"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    println!("server closed the connection");
                    return Ok(());
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    return Err(ClientError::from(err)).context("reading sync socket");
                }
            },
            _ = tokio::signal::ctrl_c() => {
                let _ = write.send(Message::Close(None)).await;
                return Ok(());
            }
        }
    }
}

async fn send_request<S>(write: &mut S, request: &SyncRequest) -> anyhow::Result<()>
where
    S: futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let payload = serde_json::to_string(request).map_err(ClientError::from)?;
    write
        .send(Message::text(payload))
        .await
        .map_err(ClientError::from)
        .context("sending sync request")
}

fn draw(group: &StopwatchGroup, view: &Reconciler) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    write!(out, "\x1b[2J\x1b[H")?;
    writeln!(out, "{} ({} stopwatches)", group.name, view.len())?;
    for line in view.render(now_millis()) {
        let marker = if line.running { '>' } else { ' ' };
        writeln!(
            out,
            "{marker} {:>14}  {:<24} {}",
            line.display_elapsed(),
            line.name,
            line.id
        )?;
    }
    out.flush()?;
    Ok(())
}
