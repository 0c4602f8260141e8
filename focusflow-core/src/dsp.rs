//! Scalar math for the tone path: backend selection, clamping, phase
//! wrapping, denormal flushing, the volume gain law and one-pole coefficients.
//!
//! The backend is chosen at compile time: `micromath`, else `libm` under
//! `no-std`, else std float methods. Everything here is pure and `#[inline]`.

#![allow(clippy::excessive_precision)]

use core::f32::consts::PI;

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "micromath")] {
        use micromath::F32Ext as _;
        #[inline] pub(crate) fn m_sin(x: f32) -> f32 { x.sin() }
        #[inline] pub(crate) fn m_exp(x: f32) -> f32 { x.exp() }
        #[inline] pub(crate) fn m_floor(x: f32) -> f32 { x.floor() }
    } else if #[cfg(feature = "no-std")] {
        #[inline] pub(crate) fn m_sin(x: f32) -> f32 { libm::sinf(x) }
        #[inline] pub(crate) fn m_exp(x: f32) -> f32 { libm::expf(x) }
        #[inline] pub(crate) fn m_floor(x: f32) -> f32 { libm::floorf(x) }
    } else {
        #[inline] pub(crate) fn m_sin(x: f32) -> f32 { x.sin() }
        #[inline] pub(crate) fn m_exp(x: f32) -> f32 { x.exp() }
        #[inline] pub(crate) fn m_floor(x: f32) -> f32 { x.floor() }
    }
}

pub const TAU: f32 = 2.0 * PI;

/// Magnitudes below this are flushed to zero.
pub const EPS_SMALL: f32 = 1.0e-20;

#[inline]
pub fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    if x < lo { lo } else if x > hi { hi } else { x }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn abs(x: f32) -> f32 {
    if x < 0.0 { -x } else { x }
}

/// Wrap phase into [0, 1).
#[inline]
pub fn wrap_phase01(p: f32) -> f32 {
    let w = p - m_floor(p);
    if w >= 1.0 { w - 1.0 } else { w }
}

/// `0.0` for subnormal-range input, `x` otherwise.
#[inline]
pub fn kill_denormals(x: f32) -> f32 {
    if abs(x) < EPS_SMALL { 0.0 } else { x }
}

// --------------------------------- Gain law --------------------------------------

/// Map a volume slider position in percent to a linear gain: `(v / 100)^2`.
///
/// Input is clamped to [0, 100]; non-finite input maps to silence.
#[inline]
pub fn volume_to_gain(percent: f32) -> f32 {
    if !percent.is_finite() {
        return 0.0;
    }
    let v = clamp(percent, 0.0, 100.0) / 100.0;
    v * v
}

// --------------------------------- Trig ------------------------------------------

/// Sine of `x` (radians).
///
/// With `fast-math` this is a range-reduced 7th-order odd polynomial
/// (max abs error ~2e-4 over a period); otherwise the backend `sin`.
#[inline]
pub fn sine(x: f32) -> f32 {
    cfg_if! {
        if #[cfg(feature = "fast-math")] {
            // reduce to [-π, π], then fold into [-π/2, π/2]
            let k = m_floor(x / TAU + 0.5);
            let mut xr = x - k * TAU;
            if xr > 0.5 * PI { xr = PI - xr; } else if xr < -0.5 * PI { xr = -PI - xr; }
            let x2 = xr * xr;
            let x3 = x2 * xr;
            xr
                + (-1.0 / 6.0) * x3
                + (1.0 / 120.0) * x3 * x2
                + (-1.0 / 5040.0) * x3 * x2 * x2
        } else {
            m_sin(x)
        }
    }
}

// --------------------------------- Exponentials / smoothing ----------------------

/// One-pole smoothing coefficient for a time constant `t_ms` (milliseconds).
///
/// The discrete one-pole form: `y[n] += (1 - a) * (x[n] - y[n])`
/// where `a = exp(-1/(tau * sr))` for first-order lag with time constant `tau`.
///
/// We interpret `t_ms` as the time to reach ~63% (1 - 1/e). `t_ms <= 0` yields
/// `0.0`, i.e. the smoother jumps straight to its input.
#[inline]
pub fn one_pole_coeff_ms(t_ms: f32, sr: f32) -> f32 {
    if t_ms <= 0.0 || sr <= 0.0 { return 0.0; }
    let tau = t_ms * 0.001;
    m_exp(-1.0 / (tau * sr))
}

// --------------------------------- Tests (std only) ------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limits_both_ends() {
        assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(2.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
    }

    #[test]
    fn gain_law_is_squared_percent() {
        assert_eq!(volume_to_gain(0.0), 0.0);
        assert_eq!(volume_to_gain(100.0), 1.0);
        assert!((volume_to_gain(41.0) - 0.1681).abs() < 1e-6);
        assert!((volume_to_gain(50.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn gain_law_clamps_out_of_range() {
        assert_eq!(volume_to_gain(-20.0), 0.0);
        assert_eq!(volume_to_gain(250.0), 1.0);
        assert_eq!(volume_to_gain(f32::NAN), 0.0);
    }

    #[test]
    fn wrap_phase_stays_in_unit_interval() {
        for p in [-3.75, -1.0, -0.25, 0.0, 0.5, 0.999, 1.0, 7.125] {
            let w = wrap_phase01(p);
            assert!((0.0..1.0).contains(&w), "p={p} w={w}");
        }
        assert!((wrap_phase01(1.25) - 0.25).abs() < 1e-6);
        assert!((wrap_phase01(-0.25) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn sine_matches_reference() {
        for i in 0..64 {
            let x = -TAU + (i as f32) * (2.0 * TAU / 64.0);
            assert!((sine(x) - x.sin()).abs() < 1e-3, "x={x}");
        }
    }

    #[test]
    fn zero_time_constant_is_instant() {
        assert_eq!(one_pole_coeff_ms(0.0, 48_000.0), 0.0);
        let a = one_pole_coeff_ms(15.0, 48_000.0);
        assert!(a > 0.99 && a < 1.0, "a={a}");
    }
}
