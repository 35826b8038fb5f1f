use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "bridge.toml";

/// Command-line overrides. Anything left unset falls back to the
/// environment, then `bridge.toml`, then the built-in defaults.
#[derive(Debug, Default, Parser)]
#[command(name = "cablebox-bridge", about = "HTTP control surface for a cable box")]
pub struct Cli {
    /// Settings file to load instead of ./bridge.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Address to listen on, e.g. ':8080' or '127.0.0.1:8080'
    #[arg(long)]
    pub listen: Option<String>,
    /// Path to the play status socket
    #[arg(long = "status-socket")]
    pub status_socket: Option<PathBuf>,
    /// Path to the channel socket
    #[arg(long = "channel-socket")]
    pub channel_socket: Option<PathBuf>,
    /// Milliseconds to wait after a channel command before re-reading status
    #[arg(long)]
    pub settle_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub listen_addr: String,
    pub status_path: PathBuf,
    pub command_path: PathBuf,
    pub settle_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            status_path: "FieldStation42/runtime/play_status.socket".into(),
            command_path: "FieldStation42/runtime/channel.socket".into(),
            settle_delay_ms: 100,
        }
    }
}

impl Settings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let normalized = normalize_listen_addr(&self.listen_addr);
        normalized
            .parse()
            .with_context(|| format!("invalid listen address '{}'", self.listen_addr))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    listen_addr: Option<String>,
    status_path: Option<PathBuf>,
    command_path: Option<PathBuf>,
    settle_delay_ms: Option<u64>,
}

pub fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match &cli.config {
        Some(path) => apply_file(&mut settings, path)?,
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                apply_file(&mut settings, path)?;
            }
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    apply_cli(&mut settings, cli);
    Ok(settings)
}

fn apply_file(settings: &mut Settings, path: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    let file_cfg: FileSettings = toml::from_str(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;

    if let Some(v) = file_cfg.listen_addr {
        settings.listen_addr = v;
    }
    if let Some(v) = file_cfg.status_path {
        settings.status_path = v;
    }
    if let Some(v) = file_cfg.command_path {
        settings.command_path = v;
    }
    if let Some(v) = file_cfg.settle_delay_ms {
        settings.settle_delay_ms = v;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let lookup = |primary: &str, alias: &str| var(alias).or_else(|| var(primary));

    if let Some(v) = lookup("BRIDGE_LISTEN", "APP__LISTEN_ADDR") {
        settings.listen_addr = v;
    }
    if let Some(v) = lookup("BRIDGE_STATUS_PATH", "APP__STATUS_PATH") {
        settings.status_path = v.into();
    }
    if let Some(v) = lookup("BRIDGE_COMMAND_PATH", "APP__COMMAND_PATH") {
        settings.command_path = v.into();
    }
    if let Some(v) = lookup("BRIDGE_SETTLE_DELAY_MS", "APP__SETTLE_DELAY_MS") {
        settings.settle_delay_ms = v
            .trim()
            .parse()
            .with_context(|| format!("invalid settle delay '{v}'"))?;
    }
    Ok(())
}

fn apply_cli(settings: &mut Settings, cli: &Cli) {
    if let Some(v) = &cli.listen {
        settings.listen_addr = v.clone();
    }
    if let Some(v) = &cli.status_socket {
        settings.status_path = v.clone();
    }
    if let Some(v) = &cli.channel_socket {
        settings.command_path = v.clone();
    }
    if let Some(v) = cli.settle_delay_ms {
        settings.settle_delay_ms = v;
    }
}

/// Accepts the `:8080` shorthand for "all interfaces".
fn normalize_listen_addr(raw: &str) -> String {
    let raw = raw.trim();
    match raw.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => raw.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
