use serde::{Deserialize, Serialize};

use crate::domain::{ChannelNumber, Direction};

/// A single directive for the device's command sink.
///
/// On the wire this is always the structured form
/// `{"command":"up"}` / `{"command":"direct","channel":7}`; the `channel`
/// key is present only for direct tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "CommandFrame", try_from = "CommandFrame")]
pub enum ChannelCommand {
    Step(Direction),
    Direct(ChannelNumber),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CommandKind {
    Up,
    Down,
    Direct,
}

#[derive(Debug, Serialize, Deserialize)]
struct CommandFrame {
    command: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel: Option<ChannelNumber>,
}

impl From<ChannelCommand> for CommandFrame {
    fn from(value: ChannelCommand) -> Self {
        match value {
            ChannelCommand::Step(Direction::Up) => CommandFrame {
                command: CommandKind::Up,
                channel: None,
            },
            ChannelCommand::Step(Direction::Down) => CommandFrame {
                command: CommandKind::Down,
                channel: None,
            },
            ChannelCommand::Direct(channel) => CommandFrame {
                command: CommandKind::Direct,
                channel: Some(channel),
            },
        }
    }
}

impl TryFrom<CommandFrame> for ChannelCommand {
    type Error = String;

    fn try_from(frame: CommandFrame) -> Result<Self, Self::Error> {
        match (frame.command, frame.channel) {
            (CommandKind::Up, None) => Ok(ChannelCommand::Step(Direction::Up)),
            (CommandKind::Down, None) => Ok(ChannelCommand::Step(Direction::Down)),
            (CommandKind::Direct, Some(channel)) => Ok(ChannelCommand::Direct(channel)),
            (CommandKind::Direct, None) => Err("direct command requires a channel".into()),
            (kind, Some(_)) => Err(format!("{kind:?} command does not take a channel")),
        }
    }
}

/// Body of `POST /channel/direct`. Validation happens in the bridge so the
/// caller gets a descriptive error instead of a decode failure for `0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectChannelRequest {
    pub channel: i64,
}
