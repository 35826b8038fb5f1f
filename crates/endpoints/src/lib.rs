//! The two device endpoints the bridge talks to: a status source it reads
//! playback state from and a command sink it writes channel directives to.
//!
//! Both are opened, used and closed inside a single call. Nothing is cached
//! and nothing is retried.

use std::{io, path::PathBuf};

use async_trait::async_trait;
use shared::{domain::PlaybackStatus, protocol::ChannelCommand};
use thiserror::Error;
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::debug;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("endpoint '{}' unavailable: {source}", path.display())]
    Unavailable { path: PathBuf, source: io::Error },
    #[error("i/o on endpoint '{}' failed: {source}", path.display())]
    Transport { path: PathBuf, source: io::Error },
    #[error("malformed playback status from '{}': {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode channel command: {0}")]
    Encode(#[source] serde_json::Error),
}

#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn read_status(&self) -> Result<PlaybackStatus, EndpointError>;
}

#[async_trait]
pub trait CommandSink: Send + Sync {
    async fn send(&self, command: &ChannelCommand) -> Result<(), EndpointError>;
}

#[derive(Debug, Clone)]
pub struct FileStatusSource {
    path: PathBuf,
}

impl FileStatusSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StatusSource for FileStatusSource {
    async fn read_status(&self) -> Result<PlaybackStatus, EndpointError> {
        debug!(path = %self.path.display(), "reading playback status");
        let mut file = File::open(&self.path)
            .await
            .map_err(|source| EndpointError::Unavailable {
                path: self.path.clone(),
                source,
            })?;

        let mut raw = Vec::new();
        file.read_to_end(&mut raw)
            .await
            .map_err(|source| EndpointError::Transport {
                path: self.path.clone(),
                source,
            })?;

        serde_json::from_slice(&raw).map_err(|source| EndpointError::Malformed {
            path: self.path.clone(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FileCommandSink {
    path: PathBuf,
}

impl FileCommandSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CommandSink for FileCommandSink {
    async fn send(&self, command: &ChannelCommand) -> Result<(), EndpointError> {
        let payload = serde_json::to_vec(command).map_err(EndpointError::Encode)?;
        debug!(path = %self.path.display(), ?command, "writing channel command");

        // The sink is owned by the device process; never create it here.
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .await
            .map_err(|source| EndpointError::Unavailable {
                path: self.path.clone(),
                source,
            })?;

        let transport = |source: io::Error| EndpointError::Transport {
            path: self.path.clone(),
            source,
        };
        file.write_all(&payload).await.map_err(transport)?;
        file.flush().await.map_err(transport)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
