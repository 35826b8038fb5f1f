use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use endpoints::{FileStatusSource, StatusSource};
use shared::{
    domain::{Direction, PlaybackStatus},
    error::{ApiError, ApiException},
    protocol::DirectChannelRequest,
};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "cablebox-ctl", about = "Drive a cable box bridge from the shell")]
struct Cli {
    #[arg(long, env = "CABLEBOX_URL", default_value = "http://127.0.0.1:8080/")]
    server: Url,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current playback status
    Status,
    /// Step one channel up
    Up,
    /// Step one channel down
    Down,
    /// Tune straight to a channel
    Direct { channel: i64 },
    /// Read a status socket directly, bypassing the bridge
    ReadStatus {
        #[arg(long, default_value = "FieldStation42/runtime/play_status.socket")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let status = match cli.command {
        Command::Status => {
            let url = endpoint(&cli.server, "status")?;
            decode(client.get(url).send().await?).await?
        }
        Command::Up => step(&client, &cli.server, Direction::Up).await?,
        Command::Down => step(&client, &cli.server, Direction::Down).await?,
        Command::Direct { channel } => {
            let url = endpoint(&cli.server, "channel/direct")?;
            let response = client
                .post(url)
                .json(&DirectChannelRequest { channel })
                .send()
                .await?;
            decode(response).await?
        }
        Command::ReadStatus { path } => FileStatusSource::new(path).read_status().await?,
    };

    print_status(&status);
    Ok(())
}

async fn step(
    client: &reqwest::Client,
    server: &Url,
    direction: Direction,
) -> Result<PlaybackStatus> {
    let url = endpoint(server, &format!("channel/{direction}"))?;
    decode(client.post(url).send().await?).await
}

/// Joins `path` under the server URL, treating its last segment as a
/// directory so `http://host/api` and `http://host/api/` behave alike.
fn endpoint(server: &Url, path: &str) -> Result<Url> {
    let mut base = server.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    base.join(path)
        .with_context(|| format!("cannot build request url from '{server}'"))
}

async fn decode(response: reqwest::Response) -> Result<PlaybackStatus> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(err) => Err(ApiException::from(err).into()),
        Err(_) => anyhow::bail!("bridge answered {status}: {}", body.trim()),
    }
}

fn print_status(status: &PlaybackStatus) {
    println!("status={}", status.status);
    println!("network={}", status.network_name);
    println!("channel={}", status.channel_number);
    println!("title={}", status.title);
    println!("timestamp={}", status.timestamp);
}
