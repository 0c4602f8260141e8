//! Engine error type.

use std::fmt;

/// Result type for engine operations.
pub type EngineResult<T = ()> = Result<T, EngineError>;

/// Everything that can go wrong between a control call and the output device.
///
/// Stop and disconnect paths never produce one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The host has no usable audio output at all.
    AudioUnavailable(String),
    /// A resume request did not bring the output context to the running state.
    DeviceSuspended,
    /// The tone source was stopped; handles cannot be restarted.
    SourceStopped,
    /// Only channels 0 (left) and 1 (right) exist.
    InvalidChannel(usize),
    /// A graph holds exactly as many sources as it has channels.
    TooManySources,
    /// The output stream failed to build, play or pause.
    Stream(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::AudioUnavailable(why) => write!(f, "audio output unavailable: {why}"),
            EngineError::DeviceSuspended => write!(f, "audio context did not resume"),
            EngineError::SourceStopped => write!(f, "tone source already stopped"),
            EngineError::InvalidChannel(ch) => write!(f, "invalid output channel {ch} (expected 0 or 1)"),
            EngineError::TooManySources => write!(f, "graph already holds two tone sources"),
            EngineError::Stream(why) => write!(f, "output stream error: {why}"),
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_channel() {
        assert_eq!(
            EngineError::InvalidChannel(3).to_string(),
            "invalid output channel 3 (expected 0 or 1)"
        );
    }
}
