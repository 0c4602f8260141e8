//! Master Output Stage control handle: one gain on the mixed signal.

use crate::graph::{GraphCommand, GraphLink};

#[derive(Debug)]
pub struct MasterOutput {
    gain: f32,
    connected: bool,
    link: GraphLink,
}

impl MasterOutput {
    pub(crate) fn new(link: GraphLink, gain: f32) -> Self {
        Self { gain: sanitize(gain), connected: true, link }
    }

    /// Scheduled gain target, exactly as last set.
    #[inline] pub fn gain(&self) -> f32 { self.gain }
    #[inline] pub fn is_connected(&self) -> bool { self.connected }

    /// Schedule a new gain at `at_time`. Negative or non-finite values clamp
    /// to `0`. Ignored once disconnected.
    pub fn set_gain(&mut self, value: f32, at_time: f64) {
        if !self.connected {
            log::debug!(target: "graph", "set_gain on disconnected master ignored");
            return;
        }
        self.gain = sanitize(value);
        self.link.send(GraphCommand::Gain { value: self.gain, at_frame: self.link.frame_at(at_time) });
    }

    /// Cut the stage off from the destination. Idempotent.
    pub fn disconnect(&mut self) {
        if self.connected {
            self.link.send(GraphCommand::Disconnect);
            self.connected = false;
        }
    }
}

#[inline]
fn sanitize(g: f32) -> f32 {
    if g.is_finite() { g.max(0.0) } else { 0.0 }
}
