//! InterviewController — owns the session and drives the interview flow.
//!
//! Every operation is a discrete event; deferred work (countdown ticks, metric
//! sampling, attention checks, question presentation) runs in timer tasks
//! registered with a [`TimerRegistry`]. Each timer captures the session
//! generation when spawned and does nothing once a reset has moved past it.

use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::config::{COUNTDOWN_START, InterviewConfig};
use crate::error::{CaptureError, InterviewError};

use super::capture::{CaptureDevice, Permission};
use super::feedback::FeedbackCatalog;
use super::model::{
    CustomField, FieldInfo, InterviewMode, InterviewStatus, MetricSample, Session,
};
use super::questions::{QuestionBank, QuestionProvider};
use super::state::{InterviewStep, RecordingState};
use super::timers::{TimerKind, TimerRegistry};

/// Default broadcast channel capacity.
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Non-blocking notices for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    PermissionGranted { mode: InterviewMode },
    /// Live capture is degraded; answers fall back to placeholder text.
    CaptureUnavailable { reason: String },
    RecordingStarted,
    /// Spoken playback failed for one question.
    SynthesisFailed { reason: String },
    /// Cosmetic video-mode prompt to look at the camera.
    AttentionWarning,
    AudioToggled { enabled: bool },
}

/// Events fanned out to subscribers.
#[derive(Debug, Clone)]
pub enum InterviewEvent {
    /// Emitted after every state transition.
    StateChanged(Box<InterviewStatus>),
    /// A question is being put to the candidate.
    QuestionPresented {
        index: usize,
        total: usize,
        question: String,
    },
    Notice(Notice),
}

/// Answer recorded when an Audio/Video session produced no transcript.
pub fn fallback_answer(mode: InterviewMode) -> String {
    format!(
        "This is a simulated answer for the {mode} interview mode. In a real app, this would \
be the transcribed speech or video analysis."
    )
}

#[derive(Debug)]
struct ControllerState {
    step: InterviewStep,
    recording: RecordingState,
    session: Session,
    field_label: Option<String>,
    /// Bumped by every reset; timers compare against their captured value.
    generation: u64,
    capture_available: bool,
    audio_enabled: bool,
    speaking: bool,
    attention_warning: bool,
    live_transcript: String,
}

impl ControllerState {
    fn new(generation: u64, audio_enabled: bool) -> Self {
        Self {
            step: InterviewStep::Idle,
            recording: RecordingState::NotRecording,
            session: Session::default(),
            field_label: None,
            generation,
            capture_available: false,
            audio_enabled,
            speaking: false,
            attention_warning: false,
            live_transcript: String::new(),
        }
    }

    fn snapshot(&self) -> InterviewStatus {
        InterviewStatus {
            step: self.step,
            recording: self.recording,
            session: self.session.clone(),
            field_label: self.field_label.clone(),
            live_transcript: self.live_transcript.clone(),
            capture_available: self.capture_available,
            audio_enabled: self.audio_enabled,
            speaking: self.speaking,
            attention_warning: self.attention_warning,
            progress_percent: self.session.progress_percent(),
        }
    }

    fn require(&self, target: InterviewStep, operation: &str) -> Result<(), InterviewError> {
        if self.step.can_transition_to(target) {
            Ok(())
        } else {
            Err(InterviewError::invalid_transition(operation, self.step))
        }
    }

    fn is_listening(&self, generation: u64) -> bool {
        self.generation == generation && self.recording.accepts_updates()
    }
}

struct Shared {
    state: Mutex<ControllerState>,
    questions: RwLock<Box<dyn QuestionProvider>>,
    capture: Arc<dyn CaptureDevice>,
    feedback: FeedbackCatalog,
    config: InterviewConfig,
    timers: TimerRegistry,
    events: broadcast::Sender<InterviewEvent>,
    rng: std::sync::Mutex<StdRng>,
}

impl Shared {
    fn send(&self, event: InterviewEvent) {
        // Ok if nobody is subscribed
        let _ = self.events.send(event);
    }

    fn emit_state(&self, state: &ControllerState) {
        self.send(InterviewEvent::StateChanged(Box::new(state.snapshot())));
    }

    fn notify(&self, notice: Notice) {
        self.send(InterviewEvent::Notice(notice));
    }

    fn roll(&self, probability: f64) -> bool {
        if probability.is_nan() || probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.rng
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .gen_bool(probability)
    }

    /// Ask the capture device for access and record whether live capture works.
    async fn request_capture(&self, mode: InterviewMode, generation: u64) -> bool {
        let outcome = match self.capture.request_permission(mode).await {
            Ok(Permission::Granted) => Ok(()),
            Ok(Permission::Denied) => Err(CaptureError::PermissionDenied { mode }),
            Err(e) => Err(e),
        };

        let mut state = self.state.lock().await;
        if state.generation != generation {
            return false;
        }

        match outcome {
            Ok(()) => {
                state.capture_available = true;
                info!(device = self.capture.name(), %mode, "Capture permission granted");
                self.notify(Notice::PermissionGranted { mode });
            }
            Err(e) => {
                state.capture_available = false;
                warn!(device = self.capture.name(), %mode, error = %e, "Live capture unavailable");
                self.notify(Notice::CaptureUnavailable {
                    reason: e.to_string(),
                });
            }
        }
        self.emit_state(&state);
        state.capture_available
    }

    /// Synthesize feedback and enter `Finished`. Runs at most once per session.
    fn finish(&self, state: &mut ControllerState) {
        if state.session.feedback.is_some() {
            return;
        }
        self.timers.cancel_all();

        let feedback = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            self.feedback.synthesize(&mut *rng)
        };

        info!(
            session_id = %state.session.id,
            answered = state.session.answers.len(),
            total = state.session.questions.len(),
            score = feedback.overall_score,
            passed = feedback.passed,
            "Interview finished"
        );

        state.session.feedback = Some(feedback);
        state.session.finished_at = Some(Utc::now());
        state.recording = RecordingState::NotRecording;
        state.speaking = false;
        state.attention_warning = false;
        state.live_transcript.clear();
        state.step = InterviewStep::Finished;
        self.emit_state(state);
    }
}

/// Cancels deferred work once the last controller handle is gone.
///
/// Timer tasks hold their own `Arc<Shared>`, so dropping `Shared` alone
/// never reaches the registry.
struct Lifetime {
    shared: Arc<Shared>,
}

impl Drop for Lifetime {
    fn drop(&mut self) {
        let cancelled = self.shared.timers.cancel_all();
        if let Ok(mut state) = self.shared.state.try_lock() {
            state.generation += 1;
        }
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let shared = Arc::clone(&self.shared);
            runtime.spawn(async move {
                shared.capture.cancel().await;
            });
        }
        debug!(cancelled, "Interview controller dropped");
    }
}

/// Drives one interview session at a time.
///
/// Cheap to clone; clones share the same session. Dropping the last clone
/// cancels every pending timer and releases the capture device.
#[derive(Clone)]
pub struct InterviewController {
    shared: Arc<Shared>,
    _lifetime: Arc<Lifetime>,
}

impl InterviewController {
    pub fn new(
        config: InterviewConfig,
        capture: Arc<dyn CaptureDevice>,
        questions: Box<dyn QuestionProvider>,
        feedback: FeedbackCatalog,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (events, _rx) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        let state = ControllerState::new(0, config.audio_enabled);

        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            questions: RwLock::new(questions),
            capture,
            feedback,
            config,
            timers: TimerRegistry::new(),
            events,
            rng: std::sync::Mutex::new(rng),
        });

        Self {
            _lifetime: Arc::new(Lifetime {
                shared: Arc::clone(&shared),
            }),
            shared,
        }
    }

    /// Controller with the built-in question bank and feedback wording.
    pub fn with_defaults(config: InterviewConfig, capture: Arc<dyn CaptureDevice>) -> Self {
        Self::new(
            config,
            capture,
            Box::new(QuestionBank::default()),
            FeedbackCatalog::default(),
        )
    }

    /// Subscribe to state updates, presented questions and notices.
    pub fn subscribe(&self) -> broadcast::Receiver<InterviewEvent> {
        self.shared.events.subscribe()
    }

    /// Current snapshot.
    pub async fn status(&self) -> InterviewStatus {
        self.shared.state.lock().await.snapshot()
    }

    pub async fn step(&self) -> InterviewStep {
        self.shared.state.lock().await.step
    }

    /// Selectable fields, built-in and custom.
    pub async fn fields(&self) -> Vec<FieldInfo> {
        self.shared.questions.read().await.fields()
    }

    pub fn feedback_catalog(&self) -> &FeedbackCatalog {
        &self.shared.feedback
    }

    /// Timers that have not yet fired or been cancelled.
    pub fn pending_timers(&self) -> usize {
        self.shared.timers.pending_total()
    }

    /// Idle → NameEntered.
    pub async fn submit_name(&self, name: &str) -> Result<(), InterviewError> {
        let mut state = self.shared.state.lock().await;
        state.require(InterviewStep::NameEntered, "submit name")?;

        let name = name.trim();
        if name.is_empty() {
            return Err(InterviewError::validation("name", "must not be empty"));
        }

        state.session.candidate_name = Some(name.to_string());
        state.step = InterviewStep::NameEntered;
        info!(session_id = %state.session.id, "Candidate name entered");
        self.shared.emit_state(&state);
        Ok(())
    }

    /// NameEntered/FieldSelected → FieldSelected. Resolves the question list
    /// and clears any progress.
    pub async fn select_field(&self, field_id: &str) -> Result<(), InterviewError> {
        let mut state = self.shared.state.lock().await;
        state.require(InterviewStep::FieldSelected, "select field")?;

        let field_id = field_id.trim();
        let (questions, label) = {
            let provider = self.shared.questions.read().await;
            (provider.resolve(field_id), provider.label_for(field_id))
        };

        info!(
            session_id = %state.session.id,
            field_id,
            questions = questions.len(),
            "Field selected"
        );

        state.session.field_id = Some(field_id.to_string());
        state.session.questions = questions;
        state.session.current_index = 0;
        state.session.answers.clear();
        state.field_label = label;
        state.step = InterviewStep::FieldSelected;
        self.shared.emit_state(&state);
        Ok(())
    }

    /// Add a custom field to the process-wide registry.
    pub async fn register_custom_field(&self, label: &str) -> Result<CustomField, InterviewError> {
        self.shared
            .questions
            .write()
            .await
            .register_custom_field(label)
    }

    /// FieldSelected → ModeSelected → AwaitingAnswer. Requests capture
    /// permission for Audio/Video; a denial only disables live capture.
    pub async fn select_mode(&self, mode: InterviewMode) -> Result<(), InterviewError> {
        let generation = {
            let mut state = self.shared.state.lock().await;
            state.require(InterviewStep::ModeSelected, "select mode")?;

            state.session.mode = Some(mode);
            state.session.started_at = Some(Utc::now());
            state.step = InterviewStep::ModeSelected;
            info!(session_id = %state.session.id, %mode, "Mode selected");
            self.shared.emit_state(&state);

            state.step = InterviewStep::AwaitingAnswer;
            self.shared.emit_state(&state);
            state.generation
        };

        schedule_question(&self.shared, generation, 0);

        if mode.uses_capture() {
            self.shared.request_capture(mode, generation).await;
        }
        Ok(())
    }

    /// Ask for capture permission again. Returns whether live capture is now
    /// available.
    pub async fn retry_permission(&self) -> Result<bool, InterviewError> {
        let (mode, generation) = {
            let state = self.shared.state.lock().await;
            match state.session.mode {
                Some(mode) if mode.uses_capture() && state.step.is_in_progress() => {
                    (mode, state.generation)
                }
                _ => {
                    return Err(InterviewError::invalid_transition(
                        "retry permission",
                        state.step,
                    ));
                }
            }
        };
        Ok(self.shared.request_capture(mode, generation).await)
    }

    /// AwaitingAnswer → CollectingAnswer. Text mode switches immediately;
    /// Audio/Video run the 3-2-1 countdown first.
    pub async fn begin_answer(&self) -> Result<(), InterviewError> {
        let mut state = self.shared.state.lock().await;
        let mode = match state.session.mode {
            Some(mode)
                if state.step == InterviewStep::AwaitingAnswer
                    && state.recording == RecordingState::NotRecording =>
            {
                mode
            }
            _ => {
                return Err(InterviewError::invalid_transition(
                    "begin answer",
                    state.step,
                ));
            }
        };

        state.live_transcript.clear();

        if !mode.uses_capture() {
            state.step = InterviewStep::CollectingAnswer;
            debug!(index = state.session.current_index, "Collecting typed answer");
            self.shared.emit_state(&state);
            return Ok(());
        }

        state.recording = RecordingState::Countdown(COUNTDOWN_START);
        debug!(index = state.session.current_index, "Countdown started");
        self.shared.emit_state(&state);

        let generation = state.generation;
        drop(state);

        let shared = Arc::clone(&self.shared);
        self.shared
            .timers
            .spawn(TimerKind::Countdown, run_countdown(shared, generation));
        Ok(())
    }

    /// Finalize the current answer. Text mode needs a non-empty `value`;
    /// Audio/Video take the device transcript and never block on silence.
    pub async fn submit_answer(&self, value: Option<&str>) -> Result<(), InterviewError> {
        let (mode, generation, capture_available) = {
            let mut state = self.shared.state.lock().await;
            let mode = match state.session.mode {
                Some(mode) if state.step == InterviewStep::CollectingAnswer => mode,
                _ => {
                    return Err(InterviewError::invalid_transition(
                        "submit answer",
                        state.step,
                    ));
                }
            };

            if !mode.uses_capture() {
                let text = value.map(str::trim).unwrap_or_default();
                if text.is_empty() {
                    return Err(InterviewError::validation("answer", "must not be empty"));
                }
                record_answer(&self.shared, &mut state, text.to_string());
                return Ok(());
            }

            state.recording = RecordingState::Stopped;
            state.attention_warning = false;
            self.shared.emit_state(&state);
            (mode, state.generation, state.capture_available)
        };

        self.shared.timers.cancel(TimerKind::Sampling);
        self.shared.timers.cancel(TimerKind::Attention);

        let transcript = if capture_available {
            match self.shared.capture.stop_session().await {
                Ok(transcript) => transcript,
                Err(e) => {
                    warn!(error = %e, "Could not finalize transcript");
                    self.shared.notify(Notice::CaptureUnavailable {
                        reason: e.to_string(),
                    });
                    String::new()
                }
            }
        } else {
            String::new()
        };

        let mut state = self.shared.state.lock().await;
        if state.generation != generation || state.step != InterviewStep::CollectingAnswer {
            return Err(InterviewError::invalid_transition(
                "submit answer",
                state.step,
            ));
        }

        let transcript = transcript.trim();
        let answer = if transcript.is_empty() {
            debug!(%mode, "Empty transcript, using fallback answer");
            fallback_answer(mode)
        } else {
            transcript.to_string()
        };
        record_answer(&self.shared, &mut state, answer);
        Ok(())
    }

    /// Finish now with whatever has been collected.
    pub async fn end_interview_early(&self) -> Result<(), InterviewError> {
        let generation = {
            let state = self.shared.state.lock().await;
            if !state.step.is_in_progress() {
                return Err(InterviewError::invalid_transition(
                    "end interview",
                    state.step,
                ));
            }
            state.generation
        };

        self.shared.timers.cancel_all();
        self.shared.capture.cancel().await;

        let mut state = self.shared.state.lock().await;
        if state.generation != generation || !state.step.is_in_progress() {
            return Err(InterviewError::invalid_transition(
                "end interview",
                state.step,
            ));
        }
        info!(
            session_id = %state.session.id,
            answered = state.session.answers.len(),
            "Interview ended early"
        );
        self.shared.finish(&mut state);
        Ok(())
    }

    /// Abandon the session and return to Idle. Pending timers and capture are
    /// cancelled before the state is cleared. Custom fields survive.
    pub async fn reset(&self) {
        self.shared.timers.cancel_all();
        self.shared.capture.cancel().await;

        let mut state = self.shared.state.lock().await;
        let generation = state.generation + 1;
        *state = ControllerState::new(generation, self.shared.config.audio_enabled);
        info!(generation, "Session reset");
        self.shared.emit_state(&state);
    }

    /// Cancel all deferred work and release the capture device.
    pub async fn shutdown(&self) {
        self.shared.timers.cancel_all();
        self.shared.capture.cancel().await;
        let mut state = self.shared.state.lock().await;
        // Orphan any task that slipped past the abort
        state.generation += 1;
        debug!("Interview controller shut down");
    }

    /// Flip spoken questions on or off. Turning speech off while a question is
    /// being spoken cuts playback short. Returns the new setting.
    pub async fn toggle_audio(&self) -> bool {
        let (enabled, interrupt) = {
            let mut state = self.shared.state.lock().await;
            state.audio_enabled = !state.audio_enabled;
            let interrupt = !state.audio_enabled && state.speaking;
            if interrupt {
                state.speaking = false;
            }
            info!(enabled = state.audio_enabled, "Spoken questions toggled");
            self.shared.notify(Notice::AudioToggled {
                enabled: state.audio_enabled,
            });
            self.shared.emit_state(&state);
            (state.audio_enabled, interrupt)
        };

        if interrupt {
            self.shared.capture.cancel_speech().await;
        }
        enabled
    }
}

/// Append the answer at `current_index`, then advance or finish.
fn record_answer(shared: &Arc<Shared>, state: &mut ControllerState, answer: String) {
    debug_assert_eq!(state.session.answers.len(), state.session.current_index);

    let index = state.session.current_index;
    state.session.answers.push(answer);
    state.session.current_index += 1;
    state.recording = RecordingState::NotRecording;
    state.live_transcript.clear();
    info!(session_id = %state.session.id, index, "Answer recorded");

    if state.session.current_index < state.session.questions.len() {
        state.step = InterviewStep::AwaitingAnswer;
        shared.emit_state(state);
        schedule_question(shared, state.generation, state.session.current_index);
    } else {
        shared.finish(state);
    }
}

fn schedule_question(shared: &Arc<Shared>, generation: u64, index: usize) {
    let task_shared = Arc::clone(shared);
    shared.timers.spawn(
        TimerKind::Speech,
        present_question(task_shared, generation, index),
    );
}

async fn present_question(shared: Arc<Shared>, generation: u64, index: usize) {
    tokio::time::sleep(shared.config.speak_delay).await;

    let (question, enabled) = {
        let mut state = shared.state.lock().await;
        if state.generation != generation
            || state.session.current_index != index
            || state.step.is_terminal()
        {
            return;
        }
        let Some(question) = state.session.current_question().map(str::to_string) else {
            return;
        };
        let enabled =
            state.audio_enabled && state.session.mode.is_some_and(|m| m.uses_capture());

        shared.send(InterviewEvent::QuestionPresented {
            index,
            total: state.session.questions.len(),
            question: question.clone(),
        });
        if enabled {
            state.speaking = true;
            shared.emit_state(&state);
        }
        (question, enabled)
    };

    let result = shared.capture.speak(&question, enabled).await;

    let mut state = shared.state.lock().await;
    if state.generation != generation {
        return;
    }
    match result {
        Ok(outcome) => debug!(index, ?outcome, "Question presented"),
        Err(e) => {
            warn!(index, error = %e, "Speech playback failed");
            shared.notify(Notice::SynthesisFailed {
                reason: e.to_string(),
            });
        }
    }
    if state.speaking {
        state.speaking = false;
        shared.emit_state(&state);
    }
}

async fn run_countdown(shared: Arc<Shared>, generation: u64) {
    let tick = shared.config.countdown_tick;

    for remaining in (1..COUNTDOWN_START).rev() {
        tokio::time::sleep(tick).await;
        let mut state = shared.state.lock().await;
        let next = RecordingState::Countdown(remaining);
        if state.generation != generation || !state.recording.can_transition_to(next) {
            return;
        }
        state.recording = next;
        debug!(remaining, "Countdown tick");
        shared.emit_state(&state);
    }

    tokio::time::sleep(tick).await;
    start_listening(shared, generation).await;
}

async fn start_listening(shared: Arc<Shared>, generation: u64) {
    let (mode, capture_available) = {
        let state = shared.state.lock().await;
        if state.generation != generation
            || !state.recording.can_transition_to(RecordingState::Listening)
        {
            return;
        }
        match state.session.mode {
            Some(mode) => (mode, state.capture_available),
            None => return,
        }
    };

    let live = if capture_available {
        match shared.capture.start_session().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Could not start capture session");
                shared.notify(Notice::CaptureUnavailable {
                    reason: e.to_string(),
                });
                false
            }
        }
    } else {
        false
    };

    {
        let mut state = shared.state.lock().await;
        if state.generation != generation
            || !state.recording.can_transition_to(RecordingState::Listening)
        {
            return;
        }
        state.recording = RecordingState::Listening;
        state.step = InterviewStep::CollectingAnswer;
        info!(
            session_id = %state.session.id,
            index = state.session.current_index,
            %mode,
            live,
            "Listening for answer"
        );
        if live {
            shared.notify(Notice::RecordingStarted);
        }
        shared.emit_state(&state);
    }

    if live {
        let task_shared = Arc::clone(&shared);
        shared
            .timers
            .spawn(TimerKind::Sampling, run_sampling(task_shared, generation));
    }
    if mode == InterviewMode::Video {
        let task_shared = Arc::clone(&shared);
        shared.timers.spawn(
            TimerKind::Attention,
            run_attention_checks(task_shared, generation),
        );
    }
}

async fn run_sampling(shared: Arc<Shared>, generation: u64) {
    loop {
        tokio::time::sleep(shared.config.sample_interval).await;
        if !shared.state.lock().await.is_listening(generation) {
            return;
        }

        let sample = match shared.capture.sample_metrics().await {
            Ok(sample) => sample,
            Err(e) => {
                debug!(error = %e, "Metric sample unavailable");
                MetricSample::new()
            }
        };
        let transcript = shared.capture.live_transcript().await;

        let mut state = shared.state.lock().await;
        if !state.is_listening(generation) {
            return;
        }
        let Some(mode) = state.session.mode else {
            return;
        };
        let written = state.session.metrics.merge(&sample, mode);
        state.live_transcript = transcript;
        debug!(written, "Merged metric sample");
        shared.emit_state(&state);
    }
}

async fn run_attention_checks(shared: Arc<Shared>, generation: u64) {
    loop {
        tokio::time::sleep(shared.config.attention_interval).await;

        let mut state = shared.state.lock().await;
        if !state.is_listening(generation) {
            return;
        }
        if state.attention_warning || !shared.roll(shared.config.attention_probability) {
            continue;
        }

        state.attention_warning = true;
        debug!("Attention warning raised");
        shared.notify(Notice::AttentionWarning);
        shared.emit_state(&state);
        drop(state);

        let clear = Arc::clone(&shared);
        shared.timers.spawn(TimerKind::Attention, async move {
            tokio::time::sleep(clear.config.attention_warning_duration).await;
            let mut state = clear.state.lock().await;
            if state.generation == generation && state.attention_warning {
                state.attention_warning = false;
                clear.emit_state(&state);
            }
        });
    }
}
