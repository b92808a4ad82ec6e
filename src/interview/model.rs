//! Session and feedback data models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::{InterviewStep, RecordingState};

/// How the candidate answers questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewMode {
    Text,
    Audio,
    Video,
}

impl InterviewMode {
    pub const ALL: [InterviewMode; 3] = [Self::Text, Self::Audio, Self::Video];

    /// Human-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "Text Chat",
            Self::Audio => "Audio Chat",
            Self::Video => "Video Chat",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Text => "Answer questions by typing your responses.",
            Self::Audio => "Answer questions by speaking. Your voice will be analyzed.",
            Self::Video => {
                "Full interview experience with video, audio and behavioral analysis."
            }
        }
    }

    /// Whether answers come from a capture device rather than typed text.
    pub fn uses_capture(&self) -> bool {
        !matches!(self, Self::Text)
    }

    /// Permission notice shown before the mode is chosen, if any.
    pub fn permission_notice(&self) -> Option<&'static str> {
        match self {
            Self::Text => None,
            Self::Audio => Some("Microphone access required"),
            Self::Video => Some("Camera and microphone access required"),
        }
    }

    /// Answering tip shown under the current question.
    pub fn tip(&self) -> &'static str {
        match self {
            Self::Text => "Take your time to structure your answer before submitting.",
            Self::Audio => "Speak clearly and at a moderate pace for best results.",
            Self::Video => {
                "Maintain eye contact with the camera and minimize background distractions."
            }
        }
    }

    /// Metrics sampled during answer collection in this mode.
    pub fn recorded_metrics(&self) -> &'static [Metric] {
        match self {
            Self::Text => &[],
            Self::Audio => &[Metric::Clarity, Metric::Confidence, Metric::Engagement],
            Self::Video => &Metric::ALL,
        }
    }

    /// Metrics shown on the results summary for this mode.
    pub fn visible_metrics(&self) -> &'static [Metric] {
        match self {
            Self::Text => &[Metric::Clarity, Metric::Engagement],
            Self::Audio => &[Metric::Clarity, Metric::Confidence, Metric::Engagement],
            Self::Video => &Metric::ALL,
        }
    }

    pub fn records(&self, metric: Metric) -> bool {
        self.recorded_metrics().contains(&metric)
    }
}

impl std::fmt::Display for InterviewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

impl std::str::FromStr for InterviewMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            _ => Err(format!("Unknown interview mode: {}", s)),
        }
    }
}

/// A named behavioural score sampled while the candidate answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    EyeContact,
    Confidence,
    Clarity,
    Engagement,
    Attentiveness,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Self::EyeContact,
        Self::Confidence,
        Self::Clarity,
        Self::Engagement,
        Self::Attentiveness,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::EyeContact => "Eye Contact",
            Self::Confidence => "Confidence",
            Self::Clarity => "Clarity",
            Self::Engagement => "Engagement",
            Self::Attentiveness => "Attentiveness",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::EyeContact => "eyeContact",
            Self::Confidence => "confidence",
            Self::Clarity => "clarity",
            Self::Engagement => "engagement",
            Self::Attentiveness => "attentiveness",
        };
        write!(f, "{s}")
    }
}

/// One best-effort reading from a capture device. May hold any subset of metrics.
pub type MetricSample = BTreeMap<Metric, f64>;

/// Latest value per metric, each clamped to [0, 100].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BehaviorMetrics(BTreeMap<Metric, f64>);

impl BehaviorMetrics {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0.get(&metric).copied()
    }

    /// Overwrite a metric. Non-finite values are ignored.
    pub fn record(&mut self, metric: Metric, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        self.0.insert(metric, value.clamp(0.0, 100.0));
        true
    }

    /// Merge a sample, keeping only metrics `mode` records. Last write wins.
    /// Returns the number of metrics written.
    pub fn merge(&mut self, sample: &MetricSample, mode: InterviewMode) -> usize {
        let mut written = 0;
        for (&metric, &value) in sample {
            if mode.records(metric) && self.record(metric, value) {
                written += 1;
            }
        }
        written
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.0.iter().map(|(m, v)| (*m, *v))
    }
}

/// The five named sub-scores of the final feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackCriteria {
    pub technical_knowledge: u8,
    pub communication: u8,
    pub problem_solving: u8,
    pub cultural_fit: u8,
    pub experience: u8,
}

impl FeedbackCriteria {
    /// Label/score pairs in display order.
    pub fn entries(&self) -> [(&'static str, u8); 5] {
        [
            ("Technical Knowledge", self.technical_knowledge),
            ("Communication", self.communication),
            ("Problem Solving", self.problem_solving),
            ("Cultural Fit", self.cultural_fit),
            ("Experience", self.experience),
        ]
    }
}

/// Final synthesized result, written once when the session finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub overall_score: u8,
    pub passed: bool,
    pub criteria: FeedbackCriteria,
    pub detailed_review: String,
}

/// A user-registered field. Lives for the process, not the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub id: String,
    pub label: String,
}

/// A selectable field, built-in or custom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub id: String,
    pub label: String,
    pub custom: bool,
}

/// The mutable record of one interview attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<InterviewMode>,
    pub questions: Vec<String>,
    pub current_index: usize,
    pub answers: Vec<String>,
    pub metrics: BehaviorMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate_name: None,
            field_id: None,
            mode: None,
            questions: Vec::new(),
            current_index: 0,
            answers: Vec::new(),
            metrics: BehaviorMetrics::default(),
            feedback: None,
            started_at: None,
            finished_at: None,
        }
    }
}

impl Session {
    /// The question at `current_index`, if one remains.
    pub fn current_question(&self) -> Option<&str> {
        self.questions.get(self.current_index).map(String::as_str)
    }

    /// Share of questions answered, 0-100.
    pub fn progress_percent(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        self.current_index as f64 / self.questions.len() as f64 * 100.0
    }
}

/// Snapshot of the controller emitted after every transition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewStatus {
    pub step: InterviewStep,
    pub recording: RecordingState,
    pub session: Session,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_label: Option<String>,
    pub live_transcript: String,
    pub capture_available: bool,
    pub audio_enabled: bool,
    pub speaking: bool,
    pub attention_warning: bool,
    pub progress_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_serde_and_parse() {
        let mode: InterviewMode = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(mode, InterviewMode::Video);
        assert_eq!("Audio".parse::<InterviewMode>().unwrap(), InterviewMode::Audio);
        assert!("telepathy".parse::<InterviewMode>().is_err());
        for mode in InterviewMode::ALL {
            assert_eq!(mode.to_string().parse::<InterviewMode>().unwrap(), mode);
        }
    }

    #[test]
    fn mode_metric_sets() {
        assert!(InterviewMode::Text.recorded_metrics().is_empty());
        assert!(InterviewMode::Audio.records(Metric::Clarity));
        assert!(!InterviewMode::Audio.records(Metric::EyeContact));
        assert!(!InterviewMode::Audio.records(Metric::Attentiveness));
        assert_eq!(InterviewMode::Video.recorded_metrics().len(), 5);
        assert!(!InterviewMode::Text.uses_capture());
        assert!(InterviewMode::Video.permission_notice().is_some());
    }

    #[test]
    fn metric_serializes_camel_case() {
        assert_eq!(
            serde_json::to_string(&Metric::EyeContact).unwrap(),
            "\"eyeContact\""
        );
        for metric in Metric::ALL {
            let json = serde_json::to_string(&metric).unwrap();
            assert_eq!(json, format!("\"{metric}\""));
        }
    }

    #[test]
    fn merge_is_last_write_wins_and_mode_filtered() {
        let mut metrics = BehaviorMetrics::default();
        let mut sample = MetricSample::new();
        sample.insert(Metric::Clarity, 40.0);
        sample.insert(Metric::EyeContact, 90.0);

        assert_eq!(metrics.merge(&sample, InterviewMode::Audio), 1);
        assert_eq!(metrics.get(Metric::Clarity), Some(40.0));
        assert_eq!(metrics.get(Metric::EyeContact), None);

        sample.insert(Metric::Clarity, 10.0);
        metrics.merge(&sample, InterviewMode::Audio);
        assert_eq!(metrics.get(Metric::Clarity), Some(10.0), "no averaging");

        assert_eq!(metrics.merge(&sample, InterviewMode::Text), 0);
    }

    #[test]
    fn record_clamps_and_skips_non_finite() {
        let mut metrics = BehaviorMetrics::default();
        assert!(metrics.record(Metric::Confidence, 140.0));
        assert_eq!(metrics.get(Metric::Confidence), Some(100.0));
        assert!(metrics.record(Metric::Confidence, -3.0));
        assert_eq!(metrics.get(Metric::Confidence), Some(0.0));
        assert!(!metrics.record(Metric::Confidence, f64::NAN));
        assert_eq!(metrics.get(Metric::Confidence), Some(0.0));
    }

    #[test]
    fn criteria_has_five_entries() {
        let criteria = FeedbackCriteria {
            technical_knowledge: 61,
            communication: 70,
            problem_solving: 80,
            cultural_fit: 90,
            experience: 99,
        };
        let entries = criteria.entries();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0], ("Technical Knowledge", 61));
        let json = serde_json::to_value(criteria).unwrap();
        assert_eq!(json["culturalFit"], 90);
    }

    #[test]
    fn session_defaults_and_progress() {
        let mut session = Session::default();
        assert!(session.candidate_name.is_none());
        assert_eq!(session.current_index, 0);
        assert_eq!(session.progress_percent(), 0.0);
        assert!(session.current_question().is_none());

        session.questions = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        session.current_index = 1;
        assert_eq!(session.progress_percent(), 25.0);
        assert_eq!(session.current_question(), Some("b"));
    }

    #[test]
    fn session_serde_skips_unset() {
        let session = Session::default();
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("candidateName").is_none());
        assert!(json.get("feedback").is_none());
        assert_eq!(json["currentIndex"], 0);
    }

    #[test]
    fn status_keys_are_camel_case() {
        let mut session = Session {
            candidate_name: Some("Ava".into()),
            ..Default::default()
        };
        session.metrics.record(Metric::EyeContact, 50.0);
        let status = InterviewStatus {
            step: InterviewStep::Idle,
            recording: RecordingState::NotRecording,
            progress_percent: session.progress_percent(),
            session,
            field_label: None,
            live_transcript: String::new(),
            capture_available: false,
            audio_enabled: true,
            speaking: false,
            attention_warning: false,
        };

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["session"]["candidateName"], "Ava");
        assert_eq!(json["session"]["metrics"]["eyeContact"], 50.0);
        assert_eq!(json["progressPercent"], 0.0);
        assert_eq!(json["audioEnabled"], true);
        assert!(json.get("attention_warning").is_none());
        assert!(json["session"].get("current_index").is_none());
    }
}
