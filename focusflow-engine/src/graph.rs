//! Realtime synthesis graph core.
//!
//! This module defines the `Generator` trait, the `Destination<G>` wrapper an
//! audio context pulls frames through, and the per-episode `GraphRenderer`.
//!
//! Control handles never share memory with the renderer. They send
//! [`GraphCommand`]s over a bounded channel; the renderer drains that channel
//! at the start of every block and applies timed commands on the exact frame
//! they were scheduled for.
//!
//! Design goals
//! - No allocations or locks in the audio thread
//! - SR changes handled lazily through `reset`
//! - Frame-accurate parameter scheduling on the context clock

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use focusflow_core::osc::Wave;

use crate::nodes::{MasterNode, MixerNode, ToneVoice, CHANNELS, MAX_SOURCES};

/// Queue depth between the control thread and one renderer.
const COMMAND_CAPACITY: usize = 1024;

/// Timed commands waiting for their frame. On overflow the waiting ones are
/// applied early, in the order they were sent.
const PENDING_CAPACITY: usize = 64;

/// Stereo frame, `[left, right]`.
pub type Frame = [f32; CHANNELS];

/// Engine-internal graph settings that are fixed for one episode.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EngineSettings {
    pub wave: Wave,
    /// Master gain glide time constant; `0` switches instantly.
    pub gain_smoothing_ms: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { wave: Wave::Sine, gain_smoothing_ms: 15.0 }
    }
}

/// Anything that can generate one stereo frame at a time.
pub trait Generator {
    /// Called when attached to a destination or when the sample rate changes.
    fn reset(&mut self, sr: f32);

    /// Called once before each block of `next` calls; `frame` is the
    /// destination clock at the first frame of the block.
    fn begin_block(&mut self, _frame: u64) {}

    /// Generate the frame at absolute position `frame` on the context clock.
    fn next(&mut self, frame: u64) -> Frame;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    #[inline] fn reset(&mut self, sr: f32) { (**self).reset(sr); }
    #[inline] fn begin_block(&mut self, frame: u64) { (**self).begin_block(frame); }
    #[inline] fn next(&mut self, frame: u64) -> Frame { (**self).next(frame) }
}

/// The end of the chain: owns the attached generator (if any) and the frame
/// clock shared with the control thread.
///
/// Renders silence while nothing is attached.
pub struct Destination<G: Generator> {
    sr: f32,
    frame: u64,
    clock: Arc<AtomicU64>,
    gen: Option<G>,
}

impl<G: Generator> std::fmt::Debug for Destination<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Destination")
            .field("sr", &self.sr)
            .field("frame", &self.frame)
            .field("attached", &self.gen.is_some())
            .finish()
    }
}

impl<G: Generator> Destination<G> {
    pub fn new(sr: f32) -> Self {
        Self { sr: sr.max(1.0), frame: 0, clock: Arc::new(AtomicU64::new(0)), gen: None }
    }

    /// Shared frame counter; readable from any thread.
    pub fn clock(&self) -> Arc<AtomicU64> { Arc::clone(&self.clock) }

    #[inline] pub fn sample_rate(&self) -> f32 { self.sr }

    /// Elapsed context time in seconds.
    #[inline] pub fn time(&self) -> f64 { self.frame as f64 / f64::from(self.sr) }

    #[inline] pub fn is_attached(&self) -> bool { self.gen.is_some() }

    #[inline] pub fn generator(&self) -> Option<&G> { self.gen.as_ref() }

    /// Attach `gen`, returning whatever was attached before.
    pub fn attach(&mut self, mut gen: G) -> Option<G> {
        gen.reset(self.sr);
        self.gen.replace(gen)
    }

    pub fn detach(&mut self) -> Option<G> { self.gen.take() }

    /// Render `frames` stereo frames, handing each to `sink` in order.
    pub fn render_frames(&mut self, frames: usize, mut sink: impl FnMut(Frame)) {
        match self.gen.as_mut() {
            Some(g) => {
                g.begin_block(self.frame);
                for i in 0..frames as u64 {
                    sink(g.next(self.frame + i));
                }
            }
            None => {
                for _ in 0..frames { sink([0.0; CHANNELS]); }
            }
        }
        self.frame += frames as u64;
        self.clock.store(self.frame, Ordering::Relaxed);
    }
}

/// One message from a control handle to the renderer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum GraphCommand {
    Frequency { slot: usize, hz: f32, at_frame: u64 },
    Gain { value: f32, at_frame: u64 },
    Start { slot: usize },
    Stop { slot: usize },
    Route { slot: usize, channel: Option<usize> },
    Trim { slot: usize, gain: f32 },
    Disconnect,
}

impl GraphCommand {
    #[inline]
    fn at_frame(&self) -> u64 {
        match *self {
            GraphCommand::Frequency { at_frame, .. } | GraphCommand::Gain { at_frame, .. } => at_frame,
            _ => 0,
        }
    }
}

/// Control-side end of the command channel, cloned into every handle.
#[derive(Clone, Debug)]
pub(crate) struct GraphLink {
    tx: Sender<GraphCommand>,
    sr: f32,
}

impl GraphLink {
    /// Convert a context time in seconds into a frame index.
    #[inline]
    pub(crate) fn frame_at(&self, at_time: f64) -> u64 {
        if at_time.is_finite() && at_time > 0.0 {
            (at_time * f64::from(self.sr)).round() as u64
        } else {
            0
        }
    }

    /// Queue a command. A full queue drops it; a dropped renderer is ignored.
    pub(crate) fn send(&self, cmd: GraphCommand) {
        match self.tx.try_send(cmd) {
            Ok(()) => {}
            Err(TrySendError::Full(cmd)) => {
                log::warn!(target: "graph", "command queue full, dropping {cmd:?}");
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Render half of one episode's graph: two voices, the mixer and the master
/// stage.
pub struct GraphRenderer {
    rx: Receiver<GraphCommand>,
    sr: f32,
    voices: [ToneVoice; MAX_SOURCES],
    mixer: MixerNode,
    master: MasterNode,
    pending: Vec<GraphCommand>,
    next_due: u64,
}

impl std::fmt::Debug for GraphRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphRenderer")
            .field("sr", &self.sr)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl GraphRenderer {
    /// Build an unattached renderer and the link that drives it.
    pub(crate) fn new(sr: f32, settings: EngineSettings, gain: f32) -> (Self, GraphLink) {
        let sr = sr.max(1.0);
        let (tx, rx) = crossbeam_channel::bounded(COMMAND_CAPACITY);
        let renderer = Self {
            rx,
            sr,
            voices: [ToneVoice::new(0.0, settings.wave); MAX_SOURCES],
            mixer: MixerNode::new(),
            master: MasterNode::new(gain, settings.gain_smoothing_ms, sr),
            pending: Vec::with_capacity(PENDING_CAPACITY),
            next_due: u64::MAX,
        };
        (renderer, GraphLink { tx, sr })
    }

    /// Frequency the voice in `slot` is currently running at.
    pub fn voice_frequency(&self, slot: usize) -> Option<f32> { self.voices.get(slot).map(ToneVoice::freq) }

    /// Whether the master stage still feeds the destination.
    pub fn is_connected(&self) -> bool { self.master.is_connected() }

    /// Current master gain target (before slewing).
    pub fn master_target(&self) -> f32 { self.master.target() }

    #[cfg(test)]
    pub(crate) fn voice_state(&self, slot: usize) -> Option<crate::nodes::VoiceState> {
        self.voices.get(slot).map(ToneVoice::state)
    }

    /// Apply exactly one queued command, bypassing the pending list.
    #[cfg(test)]
    pub(crate) fn step_command(&mut self) -> Option<GraphCommand> {
        let cmd = self.rx.try_recv().ok()?;
        self.apply(cmd);
        Some(cmd)
    }

    fn apply(&mut self, cmd: GraphCommand) {
        match cmd {
            GraphCommand::Frequency { slot, hz, .. } => {
                if let Some(v) = self.voices.get_mut(slot) { v.set_freq(hz.min(0.5 * self.sr)); }
            }
            GraphCommand::Gain { value, .. } => self.master.set_target(value),
            GraphCommand::Start { slot } => {
                if let Some(v) = self.voices.get_mut(slot) { v.start(); }
            }
            GraphCommand::Stop { slot } => {
                if let Some(v) = self.voices.get_mut(slot) { v.stop(); }
            }
            GraphCommand::Route { slot, channel } => self.mixer.set_route(slot, channel),
            GraphCommand::Trim { slot, gain } => self.mixer.set_trim(slot, gain),
            GraphCommand::Disconnect => self.master.disconnect(),
        }
    }

    fn drain(&mut self, frame: u64) {
        loop {
            match self.rx.try_recv() {
                Ok(cmd) => {
                    let at = cmd.at_frame();
                    if at <= frame {
                        self.apply(cmd);
                        continue;
                    }
                    if self.pending.len() == self.pending.capacity() {
                        self.flush_pending();
                    }
                    self.next_due = self.next_due.min(at);
                    self.pending.push(cmd);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Apply every waiting command now, oldest first.
    fn flush_pending(&mut self) {
        for i in 0..self.pending.len() {
            let cmd = self.pending[i];
            self.apply(cmd);
        }
        self.pending.clear();
        self.next_due = u64::MAX;
    }

    fn apply_due(&mut self, frame: u64) {
        let mut next_due = u64::MAX;
        let mut i = 0;
        while i < self.pending.len() {
            let cmd = self.pending[i];
            if cmd.at_frame() <= frame {
                self.pending.remove(i);
                self.apply(cmd);
            } else {
                next_due = next_due.min(cmd.at_frame());
                i += 1;
            }
        }
        self.next_due = next_due;
    }
}

impl Generator for GraphRenderer {
    fn reset(&mut self, sr: f32) {
        self.sr = sr.max(1.0);
        self.master.reset_sr(self.sr);
    }

    fn begin_block(&mut self, frame: u64) {
        self.drain(frame);
    }

    #[inline]
    fn next(&mut self, frame: u64) -> Frame {
        if frame >= self.next_due {
            self.apply_due(frame);
        }
        let mut mix = [0.0; CHANNELS];
        for slot in 0..MAX_SOURCES {
            let s = self.voices[slot].next(self.sr);
            self.mixer.mix(slot, s, &mut mix);
        }
        self.master.process(mix)
    }
}
