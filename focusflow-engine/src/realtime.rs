//! CPAL-backed host: one persistent output stream per context.
//!
//! The stream callback owns a [`Destination`] and picks up graph renderers
//! through a channel. Renderers that get replaced or detached are sent back
//! so they are dropped on the control thread, not inside the callback.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use focusflow_core::dsp::lerp;

use crate::context::{AudioContext, AudioHost, ContextState, ResumeOutcome};
use crate::error::{EngineError, EngineResult};
use crate::graph::{Destination, GraphRenderer};

/// Attach/detach messages to the stream callback.
enum DestinationCommand {
    Attach(Box<GraphRenderer>),
    Detach,
}

/// Output device selection for [`CpalHost`].
#[derive(Clone, Debug, Default)]
pub struct CpalHost {
    pub device_name: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

impl CpalHost {
    pub fn new() -> Self { Self::default() }

    /// Names of all output devices on the default host.
    pub fn output_device_names() -> EngineResult<Vec<String>> {
        let host = cpal::default_host();
        let mut names = Vec::new();
        for dev in host.output_devices().map_err(|e| EngineError::AudioUnavailable(e.to_string()))? {
            match dev.name() {
                Ok(name) => names.push(name),
                Err(e) => log::warn!(target: "context", "skipping unnamed device: {e}"),
            }
        }
        Ok(names)
    }

    fn pick_device(&self) -> EngineResult<cpal::Device> {
        let host = cpal::default_host();
        if let Some(name) = &self.device_name {
            let devices = host.output_devices().map_err(|e| EngineError::AudioUnavailable(e.to_string()))?;
            for d in devices {
                if d.name().map(|n| n == *name).unwrap_or(false) {
                    return Ok(d);
                }
            }
            return Err(EngineError::AudioUnavailable(format!("requested device not found: {name}")));
        }
        host.default_output_device()
            .ok_or_else(|| EngineError::AudioUnavailable("no default output device".into()))
    }

    fn choose_config(&self, device: &cpal::Device) -> EngineResult<cpal::SupportedStreamConfig> {
        let unavailable = |e: &dyn std::fmt::Display| EngineError::AudioUnavailable(e.to_string());

        // Stereo by default: the two tones need separate ears.
        let req_ch = self.channels.or(Some(2));
        let req_sr = self.sample_rate;

        let mut best: Option<(u64, cpal::SupportedStreamConfigRange)> = None;
        for range in device.supported_output_configs().map_err(|e| unavailable(&e))? {
            let ch     = range.channels();
            let sr_min = range.min_sample_rate().0;
            let sr_max = range.max_sample_rate().0;

            let ch_pen = match req_ch { Some(c) => u64::from(ch.abs_diff(c)), None => 0 };
            let sr_pen = match req_sr {
                Some(sr) => if (sr_min..=sr_max).contains(&sr) { 0 } else { u64::from(sr_min.abs_diff(sr).min(sr_max.abs_diff(sr))) },
                None => 0,
            };

            let score = sr_pen.saturating_mul(1000) + ch_pen;
            if best.as_ref().map_or(true, |(s, _)| score < *s) {
                best = Some((score, range));
            }
        }

        let Some((_, range)) = best else {
            return device.default_output_config().map_err(|e| unavailable(&e));
        };

        let lo = range.min_sample_rate().0;
        let hi = range.max_sample_rate().0;
        let pick_sr = match req_sr {
            Some(sr) => sr.clamp(lo, hi),
            None => 48_000u32.clamp(lo, hi),
        };
        Ok(range.with_sample_rate(cpal::SampleRate(pick_sr)))
    }
}

impl AudioHost for CpalHost {
    type Context = CpalContext;

    fn open_context(&mut self) -> EngineResult<CpalContext> {
        let device = self.pick_device()?;
        let supported = self.choose_config(&device)?;
        let sample_format = supported.sample_format();
        let config = supported.config();

        log::info!(
            target: "context",
            "output device {:?}, {:?} ({:?})",
            device.name().unwrap_or_default(),
            config,
            sample_format
        );

        let sr = config.sample_rate.0 as f32;
        let destination = Destination::new(sr);
        let clock = destination.clock();
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (ret_tx, ret_rx) = crossbeam_channel::unbounded();
        let faulted = Arc::new(AtomicBool::new(false));

        let parts = CallbackParts { destination, commands: cmd_rx, returns: ret_tx, channels: usize::from(config.channels) };
        let fault_flag = Arc::clone(&faulted);
        let err_fn = move |e: cpal::StreamError| {
            log::error!(target: "context", "stream error: {e}");
            fault_flag.store(true, Ordering::Relaxed);
        };

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, parts, err_fn)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, parts, err_fn)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, parts, err_fn)?,
            other => return Err(EngineError::AudioUnavailable(format!("unsupported device sample format: {other:?}"))),
        };

        let mut ctx = CpalContext { stream, sr, clock, commands: cmd_tx, returns: ret_rx, faulted, playing: false };
        // Like a fresh browser context: try to run right away, stay suspended if refused.
        if let Err(e) = ctx.play() {
            log::warn!(target: "context", "stream did not start, context suspended: {e}");
        }
        Ok(ctx)
    }
}

struct CallbackParts {
    destination: Destination<Box<GraphRenderer>>,
    commands: Receiver<DestinationCommand>,
    returns: Sender<Box<GraphRenderer>>,
    channels: usize,
}

fn build_stream<T>(
    device: &cpal::Device,
    cfg: &cpal::StreamConfig,
    parts: CallbackParts,
    err_fn: impl FnMut(cpal::StreamError) + Send + 'static,
) -> EngineResult<cpal::Stream>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    let CallbackParts { mut destination, commands, returns, channels } = parts;
    let channels = channels.max(1);

    let stream = device
        .build_output_stream(
            cfg,
            move |output: &mut [T], _| {
                while let Ok(cmd) = commands.try_recv() {
                    let released = match cmd {
                        DestinationCommand::Attach(r) => destination.attach(r),
                        DestinationCommand::Detach => destination.detach(),
                    };
                    if let Some(old) = released {
                        let _ = returns.send(old);
                    }
                }

                let n = output.len() / channels;
                let mut frames = output.chunks_exact_mut(channels);
                destination.render_frames(n, |[l, r]| {
                    if let Some(frame) = frames.next() {
                        write_frame(frame, l, r);
                    }
                });
            },
            err_fn,
            None,
        )
        .map_err(|e| EngineError::Stream(e.to_string()))?;

    Ok(stream)
}

/// Left/right onto the device layout: mono devices get the average, extra
/// channels get silence.
#[inline]
fn write_frame<T: cpal::Sample + cpal::FromSample<f32>>(frame: &mut [T], l: f32, r: f32) {
    match frame.len() {
        0 => {}
        1 => frame[0] = T::from_sample(lerp(l, r, 0.5)),
        _ => {
            frame[0] = T::from_sample(l);
            frame[1] = T::from_sample(r);
            for ch in frame.iter_mut().skip(2) {
                *ch = T::from_sample(0.0f32);
            }
        }
    }
}

pub struct CpalContext {
    stream: cpal::Stream,
    sr: f32,
    clock: Arc<AtomicU64>,
    commands: Sender<DestinationCommand>,
    returns: Receiver<Box<GraphRenderer>>,
    faulted: Arc<AtomicBool>,
    playing: bool,
}

impl CpalContext {
    fn play(&mut self) -> EngineResult {
        self.stream.play().map_err(|e| EngineError::Stream(e.to_string()))?;
        self.faulted.store(false, Ordering::Relaxed);
        self.playing = true;
        Ok(())
    }

    /// Drop renderers the callback has let go of.
    fn collect_released(&self) {
        while let Ok(old) = self.returns.try_recv() {
            drop(old);
        }
    }
}

impl AudioContext for CpalContext {
    fn state(&self) -> ContextState {
        if self.playing && !self.faulted.load(Ordering::Relaxed) {
            ContextState::Running
        } else {
            ContextState::Suspended
        }
    }

    fn resume(&mut self) -> EngineResult<ResumeOutcome> {
        if self.state() != ContextState::Running {
            self.play()?;
            log::info!(target: "context", "output stream resumed");
        }
        Ok(ResumeOutcome::Settled)
    }

    fn sample_rate(&self) -> f32 { self.sr }

    fn current_time(&self) -> f64 {
        self.clock.load(Ordering::Relaxed) as f64 / f64::from(self.sr)
    }

    fn attach(&mut self, renderer: Box<GraphRenderer>) -> EngineResult {
        self.collect_released();
        self.commands
            .send(DestinationCommand::Attach(renderer))
            .map_err(|_| EngineError::Stream("output callback is gone".into()))
    }

    fn detach(&mut self) {
        let _ = self.commands.send(DestinationCommand::Detach);
        self.collect_released();
    }
}

impl Drop for CpalContext {
    fn drop(&mut self) {
        if let Err(e) = self.stream.pause() {
            log::debug!(target: "context", "pause on drop failed: {e}");
        }
    }
}
