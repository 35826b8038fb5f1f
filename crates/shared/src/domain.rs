use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Playback state as published by the device on its status source.
///
/// Field order matches the device's document so a status read and written
/// back out is byte-for-byte comparable after normalization. Absent or
/// `null` fields decode to empty strings and zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackStatus {
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub network_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub channel_number: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A channel that can be tuned directly. Always `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ChannelNumber(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("channel number must be positive, got {0}")]
pub struct InvalidChannel(pub i64);

impl ChannelNumber {
    pub fn new(raw: i64) -> Result<Self, InvalidChannel> {
        if raw < 1 {
            return Err(InvalidChannel(raw));
        }
        u32::try_from(raw)
            .map(Self)
            .map_err(|_| InvalidChannel(raw))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChannelNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for ChannelNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        ChannelNumber::new(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
