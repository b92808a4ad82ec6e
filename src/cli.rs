//! Terminal front end — stdin/stdout REPL that drives an interview.
//!
//! Transcript-style output (questions, countdown, summary) goes to stdout;
//! prompts and notices go to stderr next to the log output.

use std::sync::Arc;

use futures::{Stream, StreamExt, stream};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::{self, InterviewError};
use crate::interview::{
    FeedbackCatalog, InterviewController, InterviewEvent, InterviewMode, InterviewStatus,
    InterviewStep, Notice, RecordingState, SimulatedCaptureDevice, render_summary,
};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/end`: finish now.
    End,
    /// `/audio`: toggle spoken questions.
    ToggleAudio,
    /// `/retry`: request capture permission again.
    RetryPermission,
    /// `/new`: abandon the session.
    New,
    /// `/quit`
    Quit,
    /// `/done`: submit a spoken answer.
    Done,
    /// `/fields`: list selectable fields.
    Fields,
    /// `/status`: dump the session snapshot as JSON.
    Status,
    /// `/custom <label>`: register a custom field.
    Custom(String),
    /// `/help`
    Help,
    /// A bare line: name, field, mode or answer text. May be empty.
    Input(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        Self::parse_with(line, false)
    }

    /// Parse a line. With `free_text`, an unknown `/word` is answer text
    /// rather than an error.
    pub fn parse_with(line: &str, free_text: bool) -> Result<Self, String> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Input(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "end" => Ok(Self::End),
            "audio" => Ok(Self::ToggleAudio),
            "retry" => Ok(Self::RetryPermission),
            "new" | "reset" => Ok(Self::New),
            "quit" | "exit" => Ok(Self::Quit),
            "done" => Ok(Self::Done),
            "fields" => Ok(Self::Fields),
            "status" => Ok(Self::Status),
            "help" => Ok(Self::Help),
            "custom" if arg.is_empty() => Err("Usage: /custom <field label>".to_string()),
            "custom" => Ok(Self::Custom(arg.to_string())),
            _ if free_text => Ok(Self::Input(line.to_string())),
            other => Err(format!("Unknown command: /{other}")),
        }
    }
}

const HELP: &str = "\
Commands:
  /end            end the interview now
  /audio          toggle spoken questions
  /retry          ask for capture permission again
  /new            start over
  /custom <label> add a custom field
  /fields         list fields
  /status         show the session as JSON
  /done           submit a spoken answer
  /quit           exit";

enum Flow {
    Continue,
    Quit,
}

/// Interactive interview over the terminal.
pub struct InterviewCli {
    controller: InterviewController,
    device: Arc<SimulatedCaptureDevice>,
}

impl InterviewCli {
    /// `device` must be the capture device the controller was built with.
    pub fn new(controller: InterviewController, device: Arc<SimulatedCaptureDevice>) -> Self {
        Self { controller, device }
    }

    /// Run until `/quit` or end of input.
    pub async fn run(&self) -> error::Result<()> {
        let printer = tokio::spawn(print_events(
            self.controller.subscribe(),
            self.controller.feedback_catalog().clone(),
        ));

        eprintln!("Welcome to the interview simulator. /help lists commands.");
        self.prompt().await;

        let lines = stdin_lines();
        futures::pin_mut!(lines);

        while let Some(line) = lines.next().await {
            let line = line?;
            let free_text = self.accepts_free_text().await;
            let command = match Command::parse_with(&line, free_text) {
                Ok(command) => command,
                Err(message) => {
                    eprintln!("{message}");
                    continue;
                }
            };

            match self.handle(command).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => eprintln!("{e}"),
            }
        }

        printer.abort();
        self.controller.shutdown().await;
        Ok(())
    }

    async fn handle(&self, command: Command) -> Result<Flow, InterviewError> {
        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => eprintln!("{HELP}"),
            Command::End => self.controller.end_interview_early().await?,
            Command::New => {
                self.controller.reset().await;
                self.prompt().await;
            }
            Command::ToggleAudio => {
                let enabled = self.controller.toggle_audio().await;
                eprintln!("Spoken questions {}", if enabled { "on" } else { "off" });
            }
            Command::RetryPermission => {
                self.controller.retry_permission().await?;
            }
            Command::Fields => self.list_fields().await,
            Command::Status => {
                let status = self.controller.status().await;
                match serde_json::to_string_pretty(&status) {
                    Ok(json) => println!("{json}"),
                    Err(e) => warn!(error = %e, "Could not serialize status"),
                }
            }
            Command::Custom(label) => {
                let field = self.controller.register_custom_field(&label).await?;
                eprintln!("Added field {} ({})", field.label, field.id);
            }
            Command::Done => self.finish_spoken_answer().await?,
            Command::Input(text) => self.handle_input(&text).await?,
        }
        Ok(Flow::Continue)
    }

    async fn handle_input(&self, text: &str) -> Result<(), InterviewError> {
        let status = self.controller.status().await;
        let mode = status.session.mode;

        match status.step {
            InterviewStep::Idle => {
                self.controller.submit_name(text).await?;
                self.prompt().await;
            }
            InterviewStep::NameEntered => {
                self.select_field(text).await?;
            }
            InterviewStep::FieldSelected => match parse_mode(text) {
                Some(mode) => {
                    self.controller.select_mode(mode).await?;
                    self.prompt().await;
                }
                None => self.select_field(text).await?,
            },
            InterviewStep::ModeSelected | InterviewStep::AwaitingAnswer => match mode {
                Some(InterviewMode::Text) => {
                    if text.is_empty() {
                        return Ok(());
                    }
                    self.controller.begin_answer().await?;
                    self.controller.submit_answer(Some(text)).await?;
                }
                Some(_) if status.recording != RecordingState::NotRecording => {
                    eprintln!("Recording starts after the countdown.");
                }
                Some(_) if text.is_empty() => self.controller.begin_answer().await?,
                Some(_) => eprintln!("Press Enter to start recording your answer."),
                None => {}
            },
            InterviewStep::CollectingAnswer => match mode {
                Some(InterviewMode::Text) => self.controller.submit_answer(Some(text)).await?,
                _ => {
                    if !text.is_empty() && !self.device.push_transcript(text) {
                        debug!("Transcript fragment dropped, device not listening");
                    }
                }
            },
            InterviewStep::Finished => {
                eprintln!("Interview finished. /new to start again, /quit to exit.");
            }
        }
        Ok(())
    }

    /// Whether the next line is a typed answer.
    async fn accepts_free_text(&self) -> bool {
        let status = self.controller.status().await;
        status.session.mode == Some(InterviewMode::Text)
            && matches!(
                status.step,
                InterviewStep::AwaitingAnswer | InterviewStep::CollectingAnswer
            )
    }

    async fn finish_spoken_answer(&self) -> Result<(), InterviewError> {
        let status = self.controller.status().await;
        if status.session.mode == Some(InterviewMode::Text) {
            eprintln!("Type your answer and press Enter.");
            return Ok(());
        }
        self.controller.submit_answer(None).await
    }

    /// Accept a field by list number or id.
    async fn select_field(&self, text: &str) -> Result<(), InterviewError> {
        let fields = self.controller.fields().await;
        let field_id = match text.parse::<usize>() {
            Ok(n) if (1..=fields.len()).contains(&n) => fields[n - 1].id.clone(),
            _ => text.to_string(),
        };
        if field_id.is_empty() {
            return Err(InterviewError::validation("field", "must not be empty"));
        }
        self.controller.select_field(&field_id).await?;
        self.prompt().await;
        Ok(())
    }

    async fn list_fields(&self) {
        for (i, field) in self.controller.fields().await.iter().enumerate() {
            let marker = if field.custom { " (custom)" } else { "" };
            eprintln!("  {}. {}{}", i + 1, field.label, marker);
        }
    }

    /// Tell the user what the current step expects.
    async fn prompt(&self) {
        let status = self.controller.status().await;
        match status.step {
            InterviewStep::Idle => eprintln!("What is your name?"),
            InterviewStep::NameEntered => {
                eprintln!("Choose a field (number or id), or /custom <label>:");
                self.list_fields().await;
            }
            InterviewStep::FieldSelected => {
                if let Some(label) = &status.field_label {
                    eprintln!("Field: {label}");
                }
                eprintln!("Choose how to answer:");
                for (i, mode) in InterviewMode::ALL.iter().enumerate() {
                    let notice = mode
                        .permission_notice()
                        .map(|n| format!(" [{n}]"))
                        .unwrap_or_default();
                    eprintln!("  {}. {} - {}{}", i + 1, mode.label(), mode.description(), notice);
                }
            }
            InterviewStep::ModeSelected | InterviewStep::AwaitingAnswer => {
                if let Some(mode) = status.session.mode {
                    eprintln!("Tip: {}", mode.tip());
                    if mode.uses_capture() {
                        eprintln!("Press Enter to start recording each answer, /done to submit.");
                    } else {
                        eprintln!("Type each answer and press Enter.");
                    }
                }
            }
            InterviewStep::CollectingAnswer | InterviewStep::Finished => {}
        }
    }
}

/// Mode by name or list number.
fn parse_mode(text: &str) -> Option<InterviewMode> {
    match text.trim().parse::<usize>() {
        Ok(n) if (1..=InterviewMode::ALL.len()).contains(&n) => Some(InterviewMode::ALL[n - 1]),
        _ => text.parse().ok(),
    }
}

fn stdin_lines() -> impl Stream<Item = std::io::Result<String>> {
    let reader = BufReader::new(tokio::io::stdin());
    stream::unfold(reader.lines(), |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((Ok(line), lines)),
            Ok(None) => None,
            Err(e) => Some((Err(e), lines)),
        }
    })
}

async fn print_events(mut rx: broadcast::Receiver<InterviewEvent>, catalog: FeedbackCatalog) {
    let mut last: Option<InterviewStatus> = None;

    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "Event printer lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            InterviewEvent::QuestionPresented {
                index,
                total,
                question,
            } => {
                println!("\nQuestion {} of {}: {}", index + 1, total, question);
            }
            InterviewEvent::Notice(notice) => print_notice(&notice),
            InterviewEvent::StateChanged(status) => {
                print_transition(last.as_ref(), &status, &catalog);
                last = Some(*status);
            }
        }
    }
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::PermissionGranted { mode } => eprintln!("{} capture ready.", mode.label()),
        Notice::CaptureUnavailable { reason } => eprintln!(
            "Live capture unavailable ({reason}). Answers will use placeholder text; /retry to try again."
        ),
        Notice::RecordingStarted => {}
        Notice::SynthesisFailed { reason } => eprintln!("Could not speak the question: {reason}"),
        Notice::AttentionWarning => println!("(Please look at the camera.)"),
        Notice::AudioToggled { .. } => {}
    }
}

fn print_transition(prev: Option<&InterviewStatus>, status: &InterviewStatus, catalog: &FeedbackCatalog) {
    let recording_changed = prev.is_none_or(|p| p.recording != status.recording);
    let step_changed = prev.is_none_or(|p| p.step != status.step);

    if recording_changed {
        match status.recording {
            RecordingState::Countdown(remaining) => println!("Recording in {remaining}..."),
            RecordingState::Listening => {
                println!("Listening. Type what you say, /done when finished.")
            }
            RecordingState::NotRecording | RecordingState::Stopped => {}
        }
    }

    if step_changed && status.step == InterviewStep::Finished {
        match render_summary(status, catalog) {
            Some(summary) => println!("\n{summary}\n"),
            None => warn!("Finished session has no feedback"),
        }
        eprintln!("/new to start again, /quit to exit.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("/end").unwrap(), Command::End);
        assert_eq!(Command::parse(" /AUDIO ").unwrap(), Command::ToggleAudio);
        assert_eq!(Command::parse("/new").unwrap(), Command::New);
        assert_eq!(Command::parse("/quit").unwrap(), Command::Quit);
        assert_eq!(Command::parse("/status").unwrap(), Command::Status);
        assert_eq!(
            Command::parse("/custom  Cloud   Security ").unwrap(),
            Command::Custom("Cloud   Security".into())
        );
        assert!(Command::parse("/custom").is_err());
        assert!(Command::parse("/dance").is_err());
    }

    #[test]
    fn unknown_slash_word_is_answer_text_when_typing() {
        assert!(Command::parse_with("/etc is where configs live", false).is_err());
        assert_eq!(
            Command::parse_with(" /etc is where configs live ", true).unwrap(),
            Command::Input("/etc is where configs live".into())
        );
        // Known commands still win
        assert_eq!(Command::parse_with("/end", true).unwrap(), Command::End);
    }

    #[test]
    fn bare_lines_are_input() {
        assert_eq!(Command::parse("  Ava ").unwrap(), Command::Input("Ava".into()));
        assert_eq!(Command::parse("").unwrap(), Command::Input(String::new()));
    }

    #[test]
    fn modes_by_number_or_name() {
        assert_eq!(parse_mode("1"), Some(InterviewMode::Text));
        assert_eq!(parse_mode("3"), Some(InterviewMode::Video));
        assert_eq!(parse_mode("Audio"), Some(InterviewMode::Audio));
        assert_eq!(parse_mode("4"), None);
        assert_eq!(parse_mode("marketing"), None);
    }
}
