#![cfg_attr(not(feature = "std"), no_std)]
//! Focus Flow Core: no_std-ready DSP primitives for the binaural tone engine.
//!
//! Features
//! - `std`      : (default) use the Rust standard library
//! - `no-std`   : build with `#![no_std]` and use `libm`/`micromath` math backends
//! - `fast-math`: polynomial sine in the oscillator hot path
//!
//! Modules
//! - [`dsp`]  : math backend, utils (clamp, phase wrap, denormals, gain law)
//! - [`osc`]  : phase-accumulator oscillator with selectable waveform
//! - [`slew`] : one-pole slew limiter for click-free parameter changes
//!
//! Design
//! - No heap allocations; everything here is `Copy` and sample-by-sample
//! - Safe to run inside a realtime audio callback

pub mod dsp;
pub mod osc;
pub mod slew;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::dsp::{
        clamp, kill_denormals, lerp, one_pole_coeff_ms, volume_to_gain, wrap_phase01, TAU,
    };
    pub use crate::osc::{PhaseOsc, Wave};
    pub use crate::slew::SlewLimiter;
}
