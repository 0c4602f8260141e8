//! Focus Flow Engine: binaural beat graph, control handles and session.
//!
//! Crate layout:
//! - [`graph`]    : `Generator` trait, `Destination<G>` and the per-episode renderer
//! - [`nodes`]    : render-side voice, mixer and master nodes
//! - [`tone`], [`mixer`], [`master`] : control-side handles for one episode
//! - [`episode`]  : wiring of the two-tone graph and its teardown order
//! - [`context`]  : `AudioHost` / `AudioContext` abstraction
//! - [`offline`]  : deterministic in-memory host
//! - [`realtime`] : CPAL output (feature `realtime`)
//! - [`session`]  : start/stop state machine owning the context
//! - [`params`]   : clamped tone parameters and their controller
//!
//! The render side never takes locks or allocates; control handles talk to
//! it through a bounded command channel.

pub mod context;
pub mod episode;
pub mod error;
pub mod graph;
pub mod master;
pub mod mixer;
pub mod nodes;
pub mod offline;
pub mod params;
pub mod session;
pub mod tone;

cfg_if::cfg_if! {
    if #[cfg(feature = "realtime")] {
        pub mod realtime;
        pub use realtime::{CpalContext, CpalHost};
    }
}

pub use context::{AudioContext, AudioHost, ContextState, ResumeOutcome};
pub use episode::{AudioGraph, GraphBuilder};
pub use error::{EngineError, EngineResult};
pub use graph::{Destination, EngineSettings, Frame, Generator, GraphRenderer};
pub use master::MasterOutput;
pub use mixer::{ChannelMixer, LEFT, RIGHT};
pub use offline::{OfflineContext, OfflineHost, ResumeBehavior};
pub use params::{ParameterController, ParameterSink, ToneParameters};
pub use session::{PlaybackState, ResumeTicket, Session, StartProgress};
pub use tone::{SourceState, ToneSource};

pub use focusflow_core::osc::Wave;
