//! Audio output seam and a PCM rendering backend.
//!
//! # Responsibility
//! - Abstract the platform audio context behind `AudioBackend`/`AudioContext`.
//! - Render scheduled tones into a mono f32 buffer for hosts that own the
//!   actual output device.
//!
//! # Invariants
//! - Tones scheduled before a drain are mixed into the same timeline.
//! - Rendered samples stay within [-1.0, 1.0].

use crate::sound::pattern::Tone;
use std::error::Error;
use std::f32::consts::TAU;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const ENVELOPE_MS: f32 = 5.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// Platform refused to create an output context.
    ContextUnavailable(String),
    /// Context exists but rejected the request.
    Playback(String),
}

impl Display for AudioError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContextUnavailable(message) => {
                write!(f, "audio context unavailable: {message}")
            }
            Self::Playback(message) => write!(f, "audio playback failed: {message}"),
        }
    }
}

impl Error for AudioError {}

/// Live audio output context.
pub trait AudioContext: Send + Sync {
    /// Schedules one tone relative to the context's current time.
    fn schedule(&self, tone: &Tone) -> Result<(), AudioError>;
}

/// Factory for the (single) audio context of a synthesizer.
pub trait AudioBackend: Send + Sync {
    fn create_context(&self) -> Result<Arc<dyn AudioContext>, AudioError>;
}

/// Context that mixes tones into an in-memory sample buffer.
///
/// The context has no running clock: its current time is the first sample
/// not yet drained. Tone offsets count from there, so cues scheduled between
/// two drains overlap and are mixed.
#[derive(Debug)]
pub struct PcmContext {
    sample_rate: u32,
    samples: Mutex<Vec<f32>>,
}

impl PcmContext {
    fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Mutex::new(Vec::new()),
        }
    }

    /// Takes every sample rendered since the last drain.
    fn drain(&self) -> Vec<f32> {
        self.samples
            .lock()
            .map(|mut samples| std::mem::take(&mut *samples))
            .unwrap_or_default()
    }
}

impl AudioContext for PcmContext {
    fn schedule(&self, tone: &Tone) -> Result<(), AudioError> {
        let valid_frequency = tone.frequency_hz.is_finite() && tone.frequency_hz > 0.0;
        let valid_volume = tone.volume > 0.0 && tone.volume <= 1.0;
        if !valid_frequency || !valid_volume {
            return Err(AudioError::Playback(format!(
                "invalid tone frequency={} volume={}",
                tone.frequency_hz, tone.volume
            )));
        }

        let rate = self.sample_rate as f32;
        let start = (tone.start_offset.as_secs_f32() * rate) as usize;
        let length = (tone.duration.as_secs_f32() * rate) as usize;
        let ramp = ((ENVELOPE_MS / 1000.0) * rate).max(1.0);

        let mut samples = self
            .samples
            .lock()
            .map_err(|_| AudioError::Playback("sample buffer poisoned".to_string()))?;
        if samples.len() < start + length {
            samples.resize(start + length, 0.0);
        }
        for index in 0..length {
            let t = index as f32 / rate;
            let attack = (index as f32 / ramp).min(1.0);
            let release = ((length - index) as f32 / ramp).min(1.0);
            let value = tone.volume * attack.min(release) * (TAU * tone.frequency_hz * t).sin();
            let slot = &mut samples[start + index];
            *slot = (*slot + value).clamp(-1.0, 1.0);
        }
        Ok(())
    }
}

/// Backend producing `PcmContext`s. Hosts pull audio with `drain_samples`.
///
/// Playback position only advances on drain. A host that wants back-to-back
/// cues to play one after another drains between them; without a drain the
/// second cue starts at the same instant as the first.
#[derive(Debug)]
pub struct PcmAudioBackend {
    sample_rate: u32,
    context: Mutex<Option<Arc<PcmContext>>>,
    contexts_created: AtomicUsize,
}

impl PcmAudioBackend {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            context: Mutex::new(None),
            contexts_created: AtomicUsize::new(0),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of contexts created so far.
    pub fn contexts_created(&self) -> usize {
        self.contexts_created.load(Ordering::SeqCst)
    }

    /// Takes pending samples of the most recent context.
    pub fn drain_samples(&self) -> Vec<f32> {
        self.context
            .lock()
            .ok()
            .and_then(|context| context.as_ref().map(|context| context.drain()))
            .unwrap_or_default()
    }
}

impl Default for PcmAudioBackend {
    fn default() -> Self {
        Self::new(44_100)
    }
}

impl AudioBackend for PcmAudioBackend {
    fn create_context(&self) -> Result<Arc<dyn AudioContext>, AudioError> {
        if self.sample_rate == 0 {
            return Err(AudioError::ContextUnavailable(
                "sample rate must be positive".to_string(),
            ));
        }
        let context = Arc::new(PcmContext::new(self.sample_rate));
        let mut slot = self
            .context
            .lock()
            .map_err(|_| AudioError::ContextUnavailable("backend poisoned".to_string()))?;
        *slot = Some(context.clone());
        self.contexts_created.fetch_add(1, Ordering::SeqCst);
        Ok(context)
    }
}
