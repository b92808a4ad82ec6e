//! Interview state machine — tracks which step the candidate is in.

use serde::{Deserialize, Serialize};

/// The steps of an interview session.
///
/// Progresses: Idle → NameEntered → FieldSelected → ModeSelected →
/// AwaitingAnswer ⇄ CollectingAnswer → Finished. Any step may return to Idle
/// through a reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStep {
    #[default]
    Idle,
    NameEntered,
    FieldSelected,
    ModeSelected,
    AwaitingAnswer,
    CollectingAnswer,
    Finished,
}

impl InterviewStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: InterviewStep) -> bool {
        use InterviewStep::*;
        matches!(
            (self, target),
            (Idle, NameEntered)
                | (NameEntered, FieldSelected)
                // Field may be re-selected until the mode is locked
                | (FieldSelected, FieldSelected)
                | (FieldSelected, ModeSelected)
                | (ModeSelected, AwaitingAnswer)
                | (AwaitingAnswer, CollectingAnswer)
                | (CollectingAnswer, AwaitingAnswer)
                | (CollectingAnswer, Finished)
                | (ModeSelected, Finished)
                | (AwaitingAnswer, Finished)
                | (_, Idle)
        )
    }

    /// Whether this step is terminal (the interview is over).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Whether the question loop has started (mode locked, not yet finished).
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Self::ModeSelected | Self::AwaitingAnswer | Self::CollectingAnswer
        )
    }
}

impl std::fmt::Display for InterviewStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::NameEntered => "name_entered",
            Self::FieldSelected => "field_selected",
            Self::ModeSelected => "mode_selected",
            Self::AwaitingAnswer => "awaiting_answer",
            Self::CollectingAnswer => "collecting_answer",
            Self::Finished => "finished",
        };
        write!(f, "{s}")
    }
}

/// Recording sub-state, nested inside answer collection for Audio/Video.
///
/// NotRecording → Countdown(3) → Countdown(2) → Countdown(1) → Listening →
/// Stopped. Only `Listening` accepts live transcript and metric updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "remaining")]
pub enum RecordingState {
    #[default]
    NotRecording,
    Countdown(u8),
    Listening,
    Stopped,
}

impl RecordingState {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: RecordingState) -> bool {
        use RecordingState::*;
        match (self, target) {
            (NotRecording, Countdown(n)) => n == crate::config::COUNTDOWN_START,
            (Countdown(from), Countdown(to)) => to >= 1 && *from == to.saturating_add(1),
            (Countdown(1), Listening) => true,
            (Listening, Stopped) => true,
            // New question, or cancellation
            (_, NotRecording) => true,
            _ => false,
        }
    }

    /// Whether live updates are accepted.
    pub fn accepts_updates(&self) -> bool {
        matches!(self, Self::Listening)
    }
}

impl std::fmt::Display for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRecording => write!(f, "not_recording"),
            Self::Countdown(n) => write!(f, "countdown({n})"),
            Self::Listening => write!(f, "listening"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use InterviewStep::*;
        let transitions = [
            (Idle, NameEntered),
            (NameEntered, FieldSelected),
            (FieldSelected, FieldSelected),
            (FieldSelected, ModeSelected),
            (ModeSelected, AwaitingAnswer),
            (AwaitingAnswer, CollectingAnswer),
            (CollectingAnswer, AwaitingAnswer),
            (CollectingAnswer, Finished),
            (AwaitingAnswer, Finished),
            (Finished, Idle),
            (CollectingAnswer, Idle),
        ];
        for (from, to) in transitions {
            assert!(
                from.can_transition_to(to),
                "{from} should transition to {to}"
            );
        }
    }

    #[test]
    fn invalid_transitions() {
        use InterviewStep::*;
        // Skip steps
        assert!(!Idle.can_transition_to(FieldSelected));
        assert!(!NameEntered.can_transition_to(ModeSelected));
        assert!(!FieldSelected.can_transition_to(AwaitingAnswer));
        // Early end before the mode is locked
        assert!(!FieldSelected.can_transition_to(Finished));
        // Re-selecting field after mode lock
        assert!(!AwaitingAnswer.can_transition_to(FieldSelected));
        // Terminal only leaves through reset
        assert!(!Finished.can_transition_to(AwaitingAnswer));
        assert!(!Finished.can_transition_to(Finished));
    }

    #[test]
    fn terminal_and_progress_flags() {
        use InterviewStep::*;
        assert!(Finished.is_terminal());
        assert!(!CollectingAnswer.is_terminal());
        assert!(AwaitingAnswer.is_in_progress());
        assert!(CollectingAnswer.is_in_progress());
        assert!(!FieldSelected.is_in_progress());
        assert!(!Finished.is_in_progress());
    }

    #[test]
    fn display_matches_serde() {
        use InterviewStep::*;
        let steps = [
            Idle,
            NameEntered,
            FieldSelected,
            ModeSelected,
            AwaitingAnswer,
            CollectingAnswer,
            Finished,
        ];
        for step in steps {
            let display = format!("{step}");
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(
                format!("\"{display}\""),
                json,
                "Display and serde should match for {step:?}"
            );
        }
    }

    #[test]
    fn countdown_walks_three_two_one() {
        use RecordingState::*;
        let path = [Countdown(3), Countdown(2), Countdown(1), Listening, Stopped];
        let mut current = NotRecording;
        for next in path {
            assert!(current.can_transition_to(next), "{current} -> {next}");
            current = next;
        }
        assert!(current.can_transition_to(NotRecording));
    }

    #[test]
    fn countdown_cannot_skip() {
        use RecordingState::*;
        assert!(!NotRecording.can_transition_to(Countdown(2)));
        assert!(!NotRecording.can_transition_to(Listening));
        assert!(!Countdown(3).can_transition_to(Countdown(1)));
        assert!(!Countdown(2).can_transition_to(Listening));
        assert!(!Stopped.can_transition_to(Listening));
        assert!(!Countdown(1).can_transition_to(Countdown(0)));
    }

    #[test]
    fn only_listening_accepts_updates() {
        use RecordingState::*;
        assert!(Listening.accepts_updates());
        assert!(!Countdown(2).accepts_updates());
        assert!(!Stopped.accepts_updates());
        assert!(!NotRecording.accepts_updates());
    }
}
