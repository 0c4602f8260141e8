//! Audio Session: the owner of one playback episode at a time.
//!
//! ```text
//!   Stopped ──start──▶ Starting ──resume settled──▶ Running
//!      ▲                  │                            │
//!      └──────stop────────┴───────────stop─────────────┘
//! ```
//!
//! The context is opened lazily on the first start and kept for the life of
//! the session. The graph is not: every episode builds a fresh [`AudioGraph`]
//! and tears it down on stop. If the context is suspended the session asks it
//! to resume; when that resume does not settle synchronously the session sits
//! in `Starting` and hands out a [`ResumeTicket`]. A `stop` in that window
//! cancels the start, and the ticket goes stale.

use crate::context::{AudioContext, AudioHost, ContextState, ResumeOutcome};
use crate::episode::AudioGraph;
use crate::error::{EngineError, EngineResult};
use crate::graph::EngineSettings;
use crate::params::{ParameterSink, ToneParameters};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Starting,
    Running,
}

/// Identifies one start attempt that is waiting on a context resume.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResumeTicket {
    attempt: u64,
}

/// Result of a successful `start` call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StartProgress {
    Running,
    /// Report completion through [`Session::resume_settled`].
    AwaitingResume(ResumeTicket),
}

pub struct Session<H: AudioHost> {
    host: H,
    context: Option<H::Context>,
    settings: EngineSettings,
    params: ToneParameters,
    state: PlaybackState,
    graph: Option<AudioGraph>,
    pending: Option<ResumeTicket>,
    attempts: u64,
    episodes: u64,
}

impl<H: AudioHost> std::fmt::Debug for Session<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("params", &self.params)
            .field("episodes", &self.episodes)
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

impl<H: AudioHost> Session<H> {
    pub fn new(host: H, settings: EngineSettings) -> Self {
        Self {
            host,
            context: None,
            settings,
            params: ToneParameters::default(),
            state: PlaybackState::Stopped,
            graph: None,
            pending: None,
            attempts: 0,
            episodes: 0,
        }
    }

    pub fn with_parameters(mut self, params: ToneParameters) -> Self {
        self.params = params.clamped();
        self
    }

    #[inline] pub fn state(&self) -> PlaybackState { self.state }
    #[inline] pub fn is_running(&self) -> bool { self.state == PlaybackState::Running }
    #[inline] pub fn parameters(&self) -> ToneParameters { self.params }

    /// Number of episodes that reached `Running`.
    #[inline] pub fn episodes(&self) -> u64 { self.episodes }

    #[inline] pub fn has_graph(&self) -> bool { self.graph.is_some() }

    pub fn left_frequency(&self) -> Option<f32> { self.graph.as_ref().map(|g| g.left().frequency_hz()) }
    pub fn right_frequency(&self) -> Option<f32> { self.graph.as_ref().map(|g| g.right().frequency_hz()) }
    pub fn master_gain(&self) -> Option<f32> { self.graph.as_ref().map(|g| g.master().gain()) }

    pub fn host(&self) -> &H { &self.host }
    pub fn context(&self) -> Option<&H::Context> { self.context.as_ref() }
    pub fn context_mut(&mut self) -> Option<&mut H::Context> { self.context.as_mut() }

    /// Begin playback with the stored parameters.
    ///
    /// From `Running` this rebuilds a fresh episode. From `Starting` it does
    /// nothing and returns the outstanding ticket.
    pub fn start(&mut self) -> EngineResult<StartProgress> {
        match self.state {
            PlaybackState::Starting => {
                if let Some(ticket) = self.pending {
                    log::debug!(target: "session", "start while starting; still awaiting resume");
                    return Ok(StartProgress::AwaitingResume(ticket));
                }
            }
            PlaybackState::Running => {
                log::info!(target: "session", "start while running; rebuilding graph");
                self.stop();
            }
            PlaybackState::Stopped => {}
        }

        self.ensure_context()?;
        let state = self.context.as_ref().map_or(ContextState::Closed, AudioContext::state);
        if state == ContextState::Running {
            return self.build_and_run().map(|()| StartProgress::Running);
        }

        self.attempts += 1;
        let ticket = ResumeTicket { attempt: self.attempts };
        self.state = PlaybackState::Starting;
        let outcome = match self.context.as_mut() {
            Some(ctx) => ctx.resume(),
            None => Err(EngineError::AudioUnavailable("no audio context".into())),
        };
        match outcome {
            Ok(ResumeOutcome::Settled) => {
                self.pending = Some(ticket);
                self.finish_start(ticket).map(|()| StartProgress::Running)
            }
            Ok(ResumeOutcome::Pending) => {
                log::info!(target: "session", "waiting for audio context to resume");
                self.pending = Some(ticket);
                Ok(StartProgress::AwaitingResume(ticket))
            }
            Err(e) => {
                log::error!(target: "session", "resume request failed: {e}");
                self.state = PlaybackState::Stopped;
                Err(EngineError::DeviceSuspended)
            }
        }
    }

    /// The host reports that the resume behind `ticket` has completed.
    ///
    /// Stale tickets (the start was cancelled or superseded) are ignored and
    /// the current state is returned unchanged.
    pub fn resume_settled(&mut self, ticket: ResumeTicket) -> EngineResult<PlaybackState> {
        if self.state != PlaybackState::Starting || self.pending != Some(ticket) {
            log::debug!(target: "session", "ignoring stale resume ticket {ticket:?}");
            return Ok(self.state);
        }
        self.finish_start(ticket).map(|()| self.state)
    }

    /// Tear down the current episode. Safe from any state, any number of
    /// times.
    pub fn stop(&mut self) {
        if self.pending.take().is_some() {
            log::info!(target: "session", "start cancelled before audio context resumed");
        }
        if let Some(mut graph) = self.graph.take() {
            graph.teardown();
            if let Some(ctx) = self.context.as_mut() {
                ctx.detach();
            }
            log::info!(target: "session", "stopped");
        }
        self.state = PlaybackState::Stopped;
    }

    /// Store `params` and, while running, push them into the live graph at the
    /// context's current time.
    pub fn update_parameters(&mut self, params: ToneParameters) {
        self.params = params.clamped();
        if self.state != PlaybackState::Running {
            return;
        }
        let now = self.context.as_ref().map_or(0.0, AudioContext::current_time);
        if let Some(graph) = self.graph.as_mut() {
            if let Err(e) = graph.apply(self.params, now) {
                log::warn!(target: "session", "live update failed: {e}");
            }
        }
    }

    /// `Running` or `Starting` → stop; `Stopped` → start.
    pub fn toggle(&mut self) -> EngineResult<PlaybackState> {
        match self.state {
            PlaybackState::Running | PlaybackState::Starting => {
                self.stop();
                Ok(PlaybackState::Stopped)
            }
            PlaybackState::Stopped => self.start().map(|p| match p {
                StartProgress::Running => PlaybackState::Running,
                StartProgress::AwaitingResume(_) => PlaybackState::Starting,
            }),
        }
    }

    /// Open and resume the context ahead of the first start, so platforms
    /// that gate output on a user gesture are unlocked while nothing audible
    /// plays. Optional; `start` works without it.
    pub fn prewarm(&mut self) -> EngineResult<ContextState> {
        self.ensure_context()?;
        let Some(ctx) = self.context.as_mut() else {
            return Err(EngineError::AudioUnavailable("no audio context".into()));
        };
        if ctx.state() != ContextState::Running {
            ctx.resume()?;
        }
        let state = ctx.state();
        log::info!(target: "session", "prewarmed audio context: {state:?}");
        Ok(state)
    }

    fn ensure_context(&mut self) -> EngineResult {
        if matches!(self.context.as_ref().map(AudioContext::state), Some(ContextState::Closed)) {
            log::warn!(target: "session", "audio context closed; reopening");
            self.context = None;
        }
        if self.context.is_none() {
            match self.host.open_context() {
                Ok(ctx) => {
                    log::info!(target: "session", "opened audio context at {} Hz", ctx.sample_rate());
                    self.context = Some(ctx);
                }
                Err(e) => {
                    log::error!(target: "session", "cannot open audio output: {e}");
                    self.state = PlaybackState::Stopped;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn finish_start(&mut self, ticket: ResumeTicket) -> EngineResult {
        debug_assert_eq!(self.pending, Some(ticket));
        self.pending = None;
        let state = self.context.as_ref().map_or(ContextState::Closed, AudioContext::state);
        if state != ContextState::Running {
            log::error!(target: "session", "audio context still {state:?} after resume");
            self.state = PlaybackState::Stopped;
            return Err(EngineError::DeviceSuspended);
        }
        self.build_and_run()
    }

    fn build_and_run(&mut self) -> EngineResult {
        if let Some(mut stale) = self.graph.take() {
            log::warn!(target: "session", "tearing down stale graph before start");
            stale.teardown();
            if let Some(ctx) = self.context.as_mut() {
                ctx.detach();
            }
        }
        let Some(ctx) = self.context.as_mut() else {
            self.state = PlaybackState::Stopped;
            return Err(EngineError::AudioUnavailable("no audio context".into()));
        };

        let built = AudioGraph::build(ctx.sample_rate(), self.settings, self.params)
            .and_then(|(mut graph, renderer)| {
                ctx.attach(Box::new(renderer))?;
                graph.start()?;
                Ok(graph)
            });
        match built {
            Ok(graph) => {
                self.graph = Some(graph);
                self.state = PlaybackState::Running;
                self.episodes += 1;
                log::info!(
                    target: "session",
                    "running: left {:.1} Hz, right {:.1} Hz, gain {:.3}",
                    self.params.left_frequency_hz(),
                    self.params.right_frequency_hz(),
                    self.params.gain()
                );
                Ok(())
            }
            Err(e) => {
                log::error!(target: "session", "failed to build graph: {e}");
                ctx.detach();
                self.state = PlaybackState::Stopped;
                Err(e)
            }
        }
    }
}

impl<H: AudioHost> ParameterSink for Session<H> {
    fn update_parameters(&mut self, params: ToneParameters) {
        Session::update_parameters(self, params);
    }
}

impl<H: AudioHost> Drop for Session<H> {
    fn drop(&mut self) {
        self.stop();
    }
}
