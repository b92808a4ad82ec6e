//! Capture device abstraction — microphone/camera access, transcripts,
//! behavioural samples and spoken questions.
//!
//! Two implementations ship with the crate:
//! - [`NullCaptureDevice`]: no hardware, every capability unavailable.
//! - [`SimulatedCaptureDevice`]: interactive terminal use; transcript text is
//!   pushed by the caller and metric samples are random.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, info};

use crate::error::CaptureError;

use super::model::{InterviewMode, MetricSample};

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Outcome of a speak request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Playback started and ran to completion.
    Spoken,
    /// Playback disabled; nothing was played.
    Skipped,
}

/// Capture backend consumed by the interview controller.
///
/// Every failure is treated as non-fatal by the caller.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Ask for microphone (Audio) or camera and microphone (Video) access.
    async fn request_permission(&self, mode: InterviewMode) -> Result<Permission, CaptureError>;

    /// Start listening for one answer.
    async fn start_session(&self) -> Result<(), CaptureError>;

    /// Stop listening and return the final transcript (may be empty).
    async fn stop_session(&self) -> Result<String, CaptureError>;

    /// Interim transcript of the session in progress.
    async fn live_transcript(&self) -> String;

    /// Best-effort behavioural reading; may hold a subset of metrics or none.
    async fn sample_metrics(&self) -> Result<MetricSample, CaptureError>;

    /// Speak `text`. Resolves once playback has ended.
    async fn speak(&self, text: &str, enabled: bool) -> Result<SpeechOutcome, CaptureError>;

    /// Stop any speech in progress.
    async fn cancel_speech(&self);

    /// Stop recognition and speech, and release device handles.
    async fn cancel(&self);
}

/// Capture device for environments without any hardware.
#[derive(Debug, Default)]
pub struct NullCaptureDevice;

impl NullCaptureDevice {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CaptureDevice for NullCaptureDevice {
    fn name(&self) -> &str {
        "null"
    }

    async fn request_permission(&self, _mode: InterviewMode) -> Result<Permission, CaptureError> {
        Ok(Permission::Denied)
    }

    async fn start_session(&self) -> Result<(), CaptureError> {
        Err(CaptureError::Unavailable {
            reason: "no capture hardware".to_string(),
        })
    }

    async fn stop_session(&self) -> Result<String, CaptureError> {
        Ok(String::new())
    }

    async fn live_transcript(&self) -> String {
        String::new()
    }

    async fn sample_metrics(&self) -> Result<MetricSample, CaptureError> {
        Ok(MetricSample::new())
    }

    async fn speak(&self, _text: &str, enabled: bool) -> Result<SpeechOutcome, CaptureError> {
        if !enabled {
            return Ok(SpeechOutcome::Skipped);
        }
        Err(CaptureError::Synthesis {
            reason: "speech synthesis not supported".to_string(),
        })
    }

    async fn cancel_speech(&self) {}

    async fn cancel(&self) {}
}

#[derive(Debug, Default)]
struct SimulatedState {
    mode: Option<InterviewMode>,
    listening: bool,
    transcript: Vec<String>,
}

/// Terminal-friendly capture device.
///
/// Transcript fragments arrive through [`SimulatedCaptureDevice::push_transcript`];
/// metric samples are uniform random values for the metrics the granted
/// mode records.
#[derive(Debug)]
pub struct SimulatedCaptureDevice {
    grant: bool,
    state: Mutex<SimulatedState>,
}

impl SimulatedCaptureDevice {
    pub fn new() -> Self {
        Self::with_permission(true)
    }

    /// A device that answers permission requests with `grant`.
    pub fn with_permission(grant: bool) -> Self {
        Self {
            grant,
            state: Mutex::new(SimulatedState::default()),
        }
    }

    /// Append a transcript fragment. Ignored unless a session is listening.
    pub fn push_transcript(&self, text: &str) -> bool {
        let mut state = self.lock();
        if !state.listening {
            return false;
        }
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        state.transcript.push(text.to_string());
        true
    }

    pub fn is_listening(&self) -> bool {
        self.lock().listening
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimulatedState> {
        // A poisoned lock only means a panic elsewhere; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SimulatedCaptureDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureDevice for SimulatedCaptureDevice {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn request_permission(&self, mode: InterviewMode) -> Result<Permission, CaptureError> {
        if !self.grant {
            return Ok(Permission::Denied);
        }
        self.lock().mode = Some(mode);
        info!(%mode, "Simulated capture permission granted");
        Ok(Permission::Granted)
    }

    async fn start_session(&self) -> Result<(), CaptureError> {
        let mut state = self.lock();
        if state.mode.is_none() {
            return Err(CaptureError::Unavailable {
                reason: "permission not granted".to_string(),
            });
        }
        state.listening = true;
        state.transcript.clear();
        debug!("Simulated capture session started");
        Ok(())
    }

    async fn stop_session(&self) -> Result<String, CaptureError> {
        let mut state = self.lock();
        state.listening = false;
        let transcript = state.transcript.join(" ");
        state.transcript.clear();
        debug!(chars = transcript.len(), "Simulated capture session stopped");
        Ok(transcript)
    }

    async fn live_transcript(&self) -> String {
        self.lock().transcript.join(" ")
    }

    async fn sample_metrics(&self) -> Result<MetricSample, CaptureError> {
        let mode = {
            let state = self.lock();
            if !state.listening {
                return Ok(MetricSample::new());
            }
            state.mode
        };
        let Some(mode) = mode else {
            return Ok(MetricSample::new());
        };

        let mut rng = rand::thread_rng();
        Ok(mode
            .recorded_metrics()
            .iter()
            .map(|metric| (*metric, rng.gen_range(0.0..100.0)))
            .collect())
    }

    async fn speak(&self, text: &str, enabled: bool) -> Result<SpeechOutcome, CaptureError> {
        if !enabled {
            return Ok(SpeechOutcome::Skipped);
        }
        debug!(chars = text.len(), "Simulated speech playback");
        Ok(SpeechOutcome::Spoken)
    }

    async fn cancel_speech(&self) {}

    async fn cancel(&self) {
        let mut state = self.lock();
        state.listening = false;
        state.transcript.clear();
        debug!("Simulated capture cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::model::Metric;

    #[tokio::test]
    async fn null_device_degrades_everything() {
        let device = NullCaptureDevice::new();
        assert_eq!(
            device.request_permission(InterviewMode::Audio).await.unwrap(),
            Permission::Denied
        );
        assert!(device.start_session().await.is_err());
        assert_eq!(device.stop_session().await.unwrap(), "");
        assert!(device.sample_metrics().await.unwrap().is_empty());
        assert!(matches!(
            device.speak("hi", true).await,
            Err(CaptureError::Synthesis { .. })
        ));
        assert_eq!(device.speak("hi", false).await.unwrap(), SpeechOutcome::Skipped);
    }

    #[tokio::test]
    async fn simulated_transcript_only_while_listening() {
        let device = SimulatedCaptureDevice::new();
        assert!(device.start_session().await.is_err(), "no permission yet");

        device.request_permission(InterviewMode::Audio).await.unwrap();
        assert!(!device.push_transcript("too early"));

        device.start_session().await.unwrap();
        assert!(device.push_transcript("I led a team"));
        assert!(device.push_transcript(" of five "));
        assert!(!device.push_transcript("   "));
        assert_eq!(device.live_transcript().await, "I led a team of five");

        let transcript = device.stop_session().await.unwrap();
        assert_eq!(transcript, "I led a team of five");
        assert!(!device.is_listening());
        assert!(!device.push_transcript("late"));
    }

    #[tokio::test]
    async fn simulated_samples_follow_mode() {
        let device = SimulatedCaptureDevice::new();
        device.request_permission(InterviewMode::Audio).await.unwrap();
        assert!(device.sample_metrics().await.unwrap().is_empty(), "not listening");

        device.start_session().await.unwrap();
        let sample = device.sample_metrics().await.unwrap();
        assert_eq!(sample.len(), 3);
        assert!(!sample.contains_key(&Metric::EyeContact));
        for value in sample.values() {
            assert!((0.0..100.0).contains(value));
        }
    }

    #[tokio::test]
    async fn simulated_denied_permission() {
        let device = SimulatedCaptureDevice::with_permission(false);
        assert_eq!(
            device.request_permission(InterviewMode::Video).await.unwrap(),
            Permission::Denied
        );
        assert!(device.start_session().await.is_err());
    }

    #[tokio::test]
    async fn cancel_stops_listening() {
        let device = SimulatedCaptureDevice::new();
        device.request_permission(InterviewMode::Video).await.unwrap();
        device.start_session().await.unwrap();
        device.push_transcript("partial");
        device.cancel().await;
        assert!(!device.is_listening());
        assert_eq!(device.live_transcript().await, "");
    }
}
