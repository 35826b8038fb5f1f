use std::{sync::Arc, time::Duration};

use endpoints::{CommandSink, EndpointError, StatusSource};
use shared::{
    domain::{ChannelNumber, Direction, PlaybackStatus},
    error::{ApiError, ErrorCode},
    protocol::ChannelCommand,
};
use tracing::{error, info, warn};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Shared, read-only handles for one bridge. Cloned into every request.
#[derive(Clone)]
pub struct BridgeContext {
    pub status: Arc<dyn StatusSource>,
    pub commands: Arc<dyn CommandSink>,
    /// Wait between writing a command and re-reading status. The sink gives
    /// no acknowledgement, so this is a best-effort guess at how long the
    /// device needs to apply it.
    pub settle_delay: Duration,
}

impl BridgeContext {
    pub fn new(
        status: impl StatusSource + 'static,
        commands: impl CommandSink + 'static,
        settle_delay: Duration,
    ) -> Self {
        Self {
            status: Arc::new(status),
            commands: Arc::new(commands),
            settle_delay,
        }
    }
}

pub async fn get_status(ctx: &BridgeContext) -> Result<PlaybackStatus, ApiError> {
    let status = ctx.status.read_status().await.map_err(|err| {
        error!(error = %err, kind = failure_kind(&err), "failed to read playback status");
        internal("Error getting status")
    })?;
    info!(?status, "read playback status");
    Ok(status)
}

pub async fn step_channel(
    ctx: &BridgeContext,
    direction: Direction,
) -> Result<PlaybackStatus, ApiError> {
    info!(%direction, "channel step requested");
    issue(ctx, ChannelCommand::Step(direction)).await
}

pub async fn set_channel_direct(
    ctx: &BridgeContext,
    channel: i64,
) -> Result<PlaybackStatus, ApiError> {
    let channel = ChannelNumber::new(channel).map_err(|err| {
        warn!(channel = err.0, "rejected direct tune");
        ApiError::new(ErrorCode::Validation, "Channel number must be positive")
    })?;
    info!(%channel, "direct tune requested");
    issue(ctx, ChannelCommand::Direct(channel)).await
}

/// Write one command, wait for the device to settle, then report what the
/// status source says. A failed re-read does not undo the command.
async fn issue(ctx: &BridgeContext, command: ChannelCommand) -> Result<PlaybackStatus, ApiError> {
    ctx.commands.send(&command).await.map_err(|err| {
        error!(error = %err, kind = failure_kind(&err), ?command, "failed to send channel command");
        internal("Error changing channel")
    })?;

    tokio::time::sleep(ctx.settle_delay).await;

    let status = ctx.status.read_status().await.map_err(|err| {
        error!(
            error = %err,
            kind = failure_kind(&err),
            ?command,
            "failed to read playback status after channel command"
        );
        internal("Error getting status")
    })?;
    info!(?command, ?status, "channel command applied");
    Ok(status)
}

fn failure_kind(err: &EndpointError) -> &'static str {
    match err {
        EndpointError::Unavailable { .. } => "unavailable",
        EndpointError::Transport { .. } => "transport",
        EndpointError::Malformed { .. } => "malformed",
        EndpointError::Encode(_) => "encode",
    }
}

fn internal(message: &str) -> ApiError {
    ApiError::new(ErrorCode::Internal, message)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
