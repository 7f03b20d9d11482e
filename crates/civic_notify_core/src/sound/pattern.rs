//! Tone patterns encoding notification severity.

use crate::model::notification::{NotificationType, Priority};
use std::time::Duration;

/// One sine tone scheduled relative to the start of its pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration: Duration,
    pub start_offset: Duration,
    /// Linear gain in (0, 1].
    pub volume: f32,
}

/// Audible cue selected for one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Three alternating tones for HIGH/URGENT.
    Attention,
    /// One short tone.
    Single,
    /// Two descending tones for errors.
    Descending,
    /// Two ascending tones for approvals and rewards.
    Ascending,
}

// (frequency Hz, duration ms, start offset ms)
const ATTENTION_TONES: &[(f32, u64, u64)] = &[(880.0, 150, 0), (660.0, 150, 200), (880.0, 200, 400)];
const SINGLE_TONES: &[(f32, u64, u64)] = &[(800.0, 150, 0)];
const DESCENDING_TONES: &[(f32, u64, u64)] = &[(440.0, 150, 0), (330.0, 200, 180)];
const ASCENDING_TONES: &[(f32, u64, u64)] = &[(523.25, 120, 0), (783.99, 180, 150)];

impl SoundCue {
    /// Expands the cue into scheduled tones at the given gain.
    pub fn tones(self, volume: f32) -> Vec<Tone> {
        let table = match self {
            Self::Attention => ATTENTION_TONES,
            Self::Single => SINGLE_TONES,
            Self::Descending => DESCENDING_TONES,
            Self::Ascending => ASCENDING_TONES,
        };
        table
            .iter()
            .map(|&(frequency_hz, duration_ms, offset_ms)| Tone {
                frequency_hz,
                duration: Duration::from_millis(duration_ms),
                start_offset: Duration::from_millis(offset_ms),
                volume,
            })
            .collect()
    }

    /// Time from the first tone start to the last tone end.
    pub fn total_duration(self) -> Duration {
        self.tones(1.0)
            .iter()
            .map(|tone| tone.start_offset + tone.duration)
            .max()
            .unwrap_or_default()
    }
}

/// Selects the cue for a notification.
///
/// HIGH/URGENT priority wins over type. Below that, ERROR descends,
/// approvals/rewards ascend and everything else is a single tone.
pub fn cue_for(kind: Option<&NotificationType>, priority: Option<Priority>) -> SoundCue {
    if priority.is_some_and(Priority::demands_attention) {
        return SoundCue::Attention;
    }
    match kind {
        Some(kind) if kind.is_error() => SoundCue::Descending,
        Some(kind) if kind.is_success_like() => SoundCue::Ascending,
        _ => SoundCue::Single,
    }
}

#[cfg(test)]
mod tests {
    use super::{cue_for, SoundCue};
    use crate::model::notification::{NotificationType, Priority};
    use std::time::Duration;

    #[test]
    fn priority_takes_precedence_over_type() {
        assert_eq!(
            cue_for(Some(&NotificationType::Error), Some(Priority::Urgent)),
            SoundCue::Attention
        );
        assert_eq!(
            cue_for(Some(&NotificationType::RewardEarned), Some(Priority::High)),
            SoundCue::Attention
        );
    }

    #[test]
    fn type_decides_below_high_priority() {
        assert_eq!(
            cue_for(Some(&NotificationType::Error), Some(Priority::Normal)),
            SoundCue::Descending
        );
        assert_eq!(
            cue_for(Some(&NotificationType::AppealApproved), None),
            SoundCue::Ascending
        );
        assert_eq!(
            cue_for(Some(&NotificationType::PaymentReceived), Some(Priority::Low)),
            SoundCue::Single
        );
        assert_eq!(cue_for(None, None), SoundCue::Single);
    }

    #[test]
    fn attention_pattern_has_three_tones() {
        let tones = SoundCue::Attention.tones(0.1);
        assert_eq!(tones.len(), 3);
        assert!(tones.iter().all(|tone| (tone.volume - 0.1).abs() < f32::EPSILON));
        assert_eq!(SoundCue::Attention.total_duration(), Duration::from_millis(600));
    }

    #[test]
    fn two_tone_patterns_move_in_the_named_direction() {
        let down = SoundCue::Descending.tones(0.1);
        assert!(down[0].frequency_hz > down[1].frequency_hz);
        let up = SoundCue::Ascending.tones(0.1);
        assert!(up[0].frequency_hz < up[1].frequency_hz);
    }
}
