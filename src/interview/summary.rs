//! Results summary rendering.

use super::feedback::FeedbackCatalog;
use super::model::{Feedback, InterviewMode, InterviewStatus, Metric};

const BAR_WIDTH: usize = 20;

/// One-line verdict for an overall score.
pub fn score_band(score: u8) -> &'static str {
    match score {
        90.. => "Excellent! Top-tier performance.",
        75..=89 => "Great job! Strong performance overall.",
        60..=74 => "Good effort with room for improvement.",
        _ => "Needs significant improvement.",
    }
}

/// Render the finished session as markdown. `None` until feedback exists.
pub fn render_summary(status: &InterviewStatus, catalog: &FeedbackCatalog) -> Option<String> {
    let session = &status.session;
    let feedback = session.feedback.as_ref()?;
    let mode = session.mode.unwrap_or(InterviewMode::Text);

    let mut parts = vec!["# Interview Results".to_string()];

    if feedback.passed {
        parts.push("**Congratulations! You passed the interview.**".to_string());
    } else {
        parts.push("**Needs improvement. Keep practicing!**".to_string());
    }

    parts.push(format!(
        "- **Candidate:** {}",
        session.candidate_name.as_deref().unwrap_or("Unknown")
    ));
    let field = status
        .field_label
        .as_deref()
        .or(session.field_id.as_deref())
        .unwrap_or("General");
    parts.push(format!("- **Field:** {field}"));
    parts.push(format!("- **Mode:** {}", mode.label()));
    parts.push(format!(
        "- **Overall score:** {}% ({})",
        feedback.overall_score,
        score_band(feedback.overall_score)
    ));
    parts.push(format!(
        "- **Answered:** {} of {}",
        session.answers.len(),
        session.questions.len()
    ));

    parts.push(criteria_section(feedback));
    parts.push(list_section("## Strengths", &feedback.strengths));
    parts.push(list_section("## Areas for Improvement", &feedback.improvements));
    parts.push(behavior_section(status, mode));

    parts.push(format!(
        "## Interviewer Notes\n{}",
        catalog.notes_for(feedback.passed)
    ));
    parts.push(format!("## Detailed Review\n{}", feedback.detailed_review));

    let mut review = vec!["## Question Review".to_string()];
    for (i, question) in session.questions.iter().enumerate() {
        let answer = session
            .answers
            .get(i)
            .map(String::as_str)
            .unwrap_or("No answer provided");
        review.push(format!("{}. **{}**\n   {}", i + 1, question, answer));
    }
    parts.push(review.join("\n"));

    Some(parts.join("\n\n"))
}

fn criteria_section(feedback: &Feedback) -> String {
    let mut lines = vec!["## Evaluation Criteria".to_string()];
    for (label, score) in feedback.criteria.entries() {
        lines.push(format!("- {label}: {score}%"));
    }
    lines.join("\n")
}

fn list_section(heading: &str, items: &[String]) -> String {
    let mut lines = vec![heading.to_string()];
    lines.extend(items.iter().map(|item| format!("- {item}")));
    lines.join("\n")
}

fn behavior_section(status: &InterviewStatus, mode: InterviewMode) -> String {
    let mut lines = vec!["## Behavioral Analysis".to_string()];
    for &metric in mode.visible_metrics() {
        lines.push(metric_line(metric, status.session.metrics.get(metric)));
    }
    lines.join("\n")
}

fn metric_line(metric: Metric, value: Option<f64>) -> String {
    match value {
        Some(value) => {
            let filled = ((value / 100.0) * BAR_WIDTH as f64).round() as usize;
            let filled = filled.min(BAR_WIDTH);
            format!(
                "- {:<14} {}{} {:>3.0}%",
                metric.label(),
                "#".repeat(filled),
                ".".repeat(BAR_WIDTH - filled),
                value
            )
        }
        None => format!("- {:<14} not recorded", metric.label()),
    }
}
