//! In-process endpoints for tests.

use std::{io, path::PathBuf, sync::Arc, time::Instant};

use async_trait::async_trait;
use shared::{domain::PlaybackStatus, protocol::ChannelCommand};
use tokio::sync::Mutex;

use crate::{CommandSink, EndpointError, StatusSource};

/// A status source holding a raw document, parsed on every read like the
/// file-backed one. `None` behaves as an endpoint that cannot be opened.
#[derive(Clone, Default)]
pub struct MemoryStatusSource {
    document: Arc<Mutex<Option<Vec<u8>>>>,
    reads: Arc<Mutex<Vec<Instant>>>,
}

impl MemoryStatusSource {
    pub fn with_status(status: &PlaybackStatus) -> Self {
        Self::from_document(serde_json::to_vec(status).ok())
    }

    pub fn with_raw(raw: impl Into<Vec<u8>>) -> Self {
        Self::from_document(Some(raw.into()))
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    fn from_document(document: Option<Vec<u8>>) -> Self {
        Self {
            document: Arc::new(Mutex::new(document)),
            reads: Arc::default(),
        }
    }

    pub async fn set_raw(&self, raw: Option<Vec<u8>>) {
        *self.document.lock().await = raw;
    }

    /// When each read started, oldest first.
    pub async fn reads(&self) -> Vec<Instant> {
        self.reads.lock().await.clone()
    }
}

#[async_trait]
impl StatusSource for MemoryStatusSource {
    async fn read_status(&self) -> Result<PlaybackStatus, EndpointError> {
        self.reads.lock().await.push(Instant::now());
        let document = self.document.lock().await;
        let Some(raw) = document.as_deref() else {
            return Err(EndpointError::Unavailable {
                path: PathBuf::from("memory:status"),
                source: io::Error::new(io::ErrorKind::NotFound, "no status document"),
            });
        };
        serde_json::from_slice(raw).map_err(|source| EndpointError::Malformed {
            path: PathBuf::from("memory:status"),
            source,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecordedCommand {
    pub command: ChannelCommand,
    pub at: Instant,
}

/// A command sink that records every write. Optionally refuses writes.
#[derive(Clone, Default)]
pub struct RecordingCommandSink {
    sent: Arc<Mutex<Vec<RecordedCommand>>>,
    refuse: bool,
}

impl RecordingCommandSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<RecordedCommand> {
        self.sent.lock().await.clone()
    }

    pub async fn commands(&self) -> Vec<ChannelCommand> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|recorded| recorded.command)
            .collect()
    }
}

#[async_trait]
impl CommandSink for RecordingCommandSink {
    async fn send(&self, command: &ChannelCommand) -> Result<(), EndpointError> {
        if self.refuse {
            return Err(EndpointError::Unavailable {
                path: PathBuf::from("memory:commands"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "sink refuses writes"),
            });
        }
        self.sent.lock().await.push(RecordedCommand {
            command: *command,
            at: Instant::now(),
        });
        Ok(())
    }
}
