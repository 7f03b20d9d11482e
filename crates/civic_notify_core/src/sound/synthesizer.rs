//! Injectable sound service.
//!
//! # Responsibility
//! - Gate every playback on the persisted sound preference.
//! - Create the audio context lazily, once, after a user gesture.
//!
//! # Invariants
//! - A disabled preference means no context is ever created by playback.
//! - Before `initialize()` (user gesture) playback is a silent no-op,
//!   mirroring browser autoplay restrictions.
//! - Errors are logged and swallowed; callers only see a `played` flag.

use crate::model::notification::{NotificationType, Priority};
use crate::prefs::{PreferenceStore, SOUND_ENABLED_KEY};
use crate::sound::backend::{AudioBackend, AudioContext, AudioError};
use crate::sound::pattern::{cue_for, SoundCue};
use log::{debug, warn};
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const DEFAULT_VOLUME: f32 = 0.1;

/// Sound service shared by the toast manager and settings screens.
pub struct SoundSynthesizer {
    backend: Arc<dyn AudioBackend>,
    preferences: Arc<dyn PreferenceStore>,
    volume: f32,
    default_enabled: bool,
    gesture_seen: AtomicBool,
    context: OnceCell<Arc<dyn AudioContext>>,
}

impl SoundSynthesizer {
    pub fn new(backend: Arc<dyn AudioBackend>, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self {
            backend,
            preferences,
            volume: DEFAULT_VOLUME,
            default_enabled: true,
            gesture_seen: AtomicBool::new(false),
            context: OnceCell::new(),
        }
    }

    /// Overrides tone gain. Values outside (0, 1] fall back to the default.
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = if volume > 0.0 && volume <= 1.0 {
            volume
        } else {
            DEFAULT_VOLUME
        };
        self
    }

    /// Value used when no preference has been persisted yet.
    pub fn with_default_enabled(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    /// Reads the persisted toggle; storage failures fall back to the default.
    pub fn is_enabled(&self) -> bool {
        match self.preferences.get_bool(SOUND_ENABLED_KEY) {
            Ok(Some(enabled)) => enabled,
            Ok(None) => self.default_enabled,
            Err(err) => {
                debug!("event=sound_pref_read module=sound status=fallback error={err}");
                self.default_enabled
            }
        }
    }

    /// Persists the toggle. Returns `false` when storage refused the write.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        match self.preferences.set_bool(SOUND_ENABLED_KEY, enabled) {
            Ok(()) => true,
            Err(err) => {
                warn!("event=sound_pref_write module=sound status=error error={err}");
                false
            }
        }
    }

    /// Records a user gesture and creates the audio context if enabled.
    ///
    /// Idempotent: once the context exists further calls do nothing.
    /// Returns whether a context is ready.
    pub fn initialize(&self) -> bool {
        self.gesture_seen.store(true, Ordering::SeqCst);
        if !self.is_enabled() {
            return false;
        }
        self.context().is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.context.get().is_some()
    }

    pub fn play_by_priority(&self, priority: Priority) -> bool {
        self.play_cue(cue_for(None, Some(priority)))
    }

    /// Plays the cue for `kind`; a HIGH/URGENT `priority` overrides the type.
    pub fn play_by_type(&self, kind: &NotificationType, priority: Option<Priority>) -> bool {
        self.play_cue(cue_for(Some(kind), priority))
    }

    /// Schedules every tone of `cue`. Returns whether all tones were accepted.
    pub fn play_cue(&self, cue: SoundCue) -> bool {
        if !self.is_enabled() {
            return false;
        }
        if !self.gesture_seen.load(Ordering::SeqCst) {
            debug!("event=sound_play module=sound status=blocked reason=no_user_gesture");
            return false;
        }
        let Some(context) = self.context() else {
            return false;
        };

        let result: Result<(), AudioError> = cue
            .tones(self.volume)
            .iter()
            .try_for_each(|tone| context.schedule(tone));
        match result {
            Ok(()) => {
                debug!("event=sound_play module=sound status=ok cue={cue:?}");
                true
            }
            Err(err) => {
                debug!("event=sound_play module=sound status=error cue={cue:?} error={err}");
                false
            }
        }
    }

    fn context(&self) -> Option<&Arc<dyn AudioContext>> {
        match self
            .context
            .get_or_try_init(|| self.backend.create_context())
        {
            Ok(context) => Some(context),
            Err(err) => {
                debug!("event=sound_context_init module=sound status=error error={err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SoundSynthesizer;
    use crate::model::notification::{NotificationType, Priority};
    use crate::prefs::{MemoryPreferenceStore, PreferenceStore, SOUND_ENABLED_KEY};
    use crate::sound::backend::{AudioBackend, AudioContext, AudioError, PcmAudioBackend};
    use std::sync::Arc;

    struct BrokenBackend;

    impl AudioBackend for BrokenBackend {
        fn create_context(&self) -> Result<Arc<dyn AudioContext>, AudioError> {
            Err(AudioError::ContextUnavailable("no device".to_string()))
        }
    }

    fn synth(backend: Arc<PcmAudioBackend>) -> (SoundSynthesizer, Arc<MemoryPreferenceStore>) {
        let prefs = Arc::new(MemoryPreferenceStore::new());
        (SoundSynthesizer::new(backend, prefs.clone()), prefs)
    }

    #[test]
    fn initialize_is_idempotent() {
        let backend = Arc::new(PcmAudioBackend::new(8_000));
        let (synth, _) = synth(backend.clone());
        assert!(synth.initialize());
        assert!(synth.initialize());
        assert_eq!(backend.contexts_created(), 1);
    }

    #[test]
    fn playback_before_gesture_is_silent() {
        let backend = Arc::new(PcmAudioBackend::new(8_000));
        let (synth, _) = synth(backend.clone());
        assert!(!synth.play_by_priority(Priority::Normal));
        assert_eq!(backend.contexts_created(), 0);
    }

    #[test]
    fn disabled_preference_skips_context_creation() {
        let backend = Arc::new(PcmAudioBackend::new(8_000));
        let (synth, prefs) = synth(backend.clone());
        prefs.set_bool(SOUND_ENABLED_KEY, false).expect("write");
        assert!(!synth.initialize());
        assert!(!synth.play_by_priority(Priority::Urgent));
        assert_eq!(backend.contexts_created(), 0);
    }

    #[test]
    fn enabling_after_gesture_creates_context_lazily() {
        let backend = Arc::new(PcmAudioBackend::new(8_000));
        let (synth, _) = synth(backend.clone());
        assert!(synth.set_enabled(false));
        synth.initialize();
        assert!(!synth.is_initialized());

        assert!(synth.set_enabled(true));
        assert!(synth.play_by_type(&NotificationType::RewardEarned, None));
        assert_eq!(backend.contexts_created(), 1);
        assert!(!backend.drain_samples().is_empty());
    }

    #[test]
    fn backend_failure_degrades_to_silence() {
        let prefs = Arc::new(MemoryPreferenceStore::new());
        let synth = SoundSynthesizer::new(Arc::new(BrokenBackend), prefs);
        assert!(!synth.initialize());
        assert!(!synth.play_by_priority(Priority::Urgent));
    }
}
