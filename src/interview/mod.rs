//! Interview flow — the simulated job interview.
//!
//! A candidate enters a name, picks a field and an answer mode, then works
//! through a fixed list of questions. Answers are typed (Text) or captured
//! from a device (Audio/Video) while behavioural metrics are sampled. When
//! the last answer is in, or the candidate ends early, randomized feedback is
//! synthesized and the session is finished.

pub mod capture;
pub mod controller;
pub mod feedback;
pub mod model;
pub mod questions;
pub mod state;
pub mod summary;
pub mod timers;

pub use capture::{
    CaptureDevice, NullCaptureDevice, Permission, SimulatedCaptureDevice, SpeechOutcome,
};
pub use controller::{InterviewController, InterviewEvent, Notice, fallback_answer};
pub use feedback::{FeedbackCatalog, PASS_THRESHOLD};
pub use model::{
    BehaviorMetrics, CustomField, Feedback, FeedbackCriteria, FieldInfo, InterviewMode,
    InterviewStatus, Metric, MetricSample, Session,
};
pub use questions::{QuestionBank, QuestionCatalog, QuestionProvider, derive_field_id};
pub use state::{InterviewStep, RecordingState};
pub use summary::{render_summary, score_band};
pub use timers::{TimerKind, TimerRegistry};
