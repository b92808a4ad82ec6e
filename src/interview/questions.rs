//! Question bank — built-in fields, custom-field registry, and prompt resolution.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::InterviewError;

use super::model::{CustomField, FieldInfo};

/// Placeholder replaced with a custom field's label in templates.
pub const LABEL_PLACEHOLDER: &str = "{label}";

/// Maps a field identifier to its ordered prompt list.
pub trait QuestionProvider: Send + Sync {
    /// Resolve prompts for `field_id`. Deterministic and never empty.
    fn resolve(&self, field_id: &str) -> Vec<String>;

    /// Register a custom field by label and return its entry.
    fn register_custom_field(&mut self, label: &str) -> Result<CustomField, InterviewError>;

    /// Every selectable field: built-ins first, then custom fields in
    /// registration order.
    fn fields(&self) -> Vec<FieldInfo>;

    /// Label for a field id, if it is known.
    fn label_for(&self, field_id: &str) -> Option<String> {
        self.fields()
            .into_iter()
            .find(|f| f.id == field_id)
            .map(|f| f.label)
    }
}

/// A built-in field and its fixed prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinField {
    pub id: String,
    pub label: String,
    pub questions: Vec<String>,
}

impl BuiltinField {
    fn new(id: &str, label: &str, questions: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            questions: questions.iter().map(|q| q.to_string()).collect(),
        }
    }
}

/// Immutable question wording injected into a [`QuestionBank`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionCatalog {
    pub builtin: Vec<BuiltinField>,
    /// Templates for custom fields; each contains [`LABEL_PLACEHOLDER`].
    pub custom_templates: Vec<String>,
    /// Prompts for a field id nobody knows.
    pub fallback: Vec<String>,
}

impl Default for QuestionCatalog {
    fn default() -> Self {
        let builtin = vec![
            BuiltinField::new(
                "software-engineering",
                "Software Engineering",
                &[
                    "Tell me about your experience with software development?",
                    "How do you approach debugging a complex issue?",
                    "Explain a challenging project you've worked on and how you overcame obstacles.",
                    "How do you stay updated with the latest technologies?",
                    "Describe your ideal development environment and team structure.",
                ],
            ),
            BuiltinField::new(
                "data-science",
                "Data Science",
                &[
                    "Explain your approach to a data analysis project from start to finish.",
                    "How do you handle missing or incomplete data?",
                    "Describe a complex data problem you solved and the impact it had.",
                    "What statistical methods do you commonly use and why?",
                    "How do you communicate technical findings to non-technical stakeholders?",
                ],
            ),
            BuiltinField::new(
                "marketing",
                "Marketing",
                &[
                    "Describe a successful marketing campaign you've led.",
                    "How do you measure the success of marketing initiatives?",
                    "How do you identify and target key customer segments?",
                    "What's your approach to digital marketing and social media?",
                    "How do you stay on top of marketing trends and changes?",
                ],
            ),
            BuiltinField::new(
                "sales",
                "Sales",
                &[
                    "Describe your sales methodology.",
                    "How do you handle objections from potential clients?",
                    "Tell me about a difficult sale you closed successfully.",
                    "How do you build relationships with clients?",
                    "What CRM systems have you used and how did they improve your process?",
                ],
            ),
            BuiltinField::new(
                "design",
                "Design",
                &[
                    "Walk me through your design process from concept to delivery.",
                    "How do you incorporate user feedback into your designs?",
                    "Describe a project where you had to balance aesthetics with functionality.",
                    "How do you stay inspired and generate new ideas?",
                    "How do you collaborate with developers and other team members?",
                ],
            ),
            BuiltinField::new(
                "product-management",
                "Product Management",
                &[
                    "How do you prioritize features for a product roadmap?",
                    "Describe how you gather and incorporate user feedback.",
                    "Tell me about a product launch you managed and any challenges you faced.",
                    "How do you balance business goals with user needs?",
                    "How do you work with engineering, design, and other departments?",
                ],
            ),
        ];

        let custom_templates = [
            "What drew you to a career in {label}?",
            "Walk me through a recent {label} project you are proud of.",
            "What skills do you consider most important for success in {label}?",
            "Describe a difficult problem you faced in {label} and how you solved it.",
            "How do you keep your {label} knowledge current?",
            "Tell me about a time you disagreed with a colleague on a {label} decision.",
            "How do you measure the quality of your work in {label}?",
            "Where do you see the field of {label} heading in the next few years?",
        ]
        .iter()
        .map(|t| t.to_string())
        .collect();

        let fallback = [
            "Tell me about yourself and your professional background.",
            "What interests you about this role?",
            "Describe a challenging situation at work and how you handled it.",
            "What do you consider your greatest professional strength?",
            "Tell me about an area you are actively working to improve.",
            "Describe a time you worked as part of a team to reach a goal.",
            "How do you prioritize when you have several deadlines at once?",
            "Where do you see yourself in five years?",
        ]
        .iter()
        .map(|q| q.to_string())
        .collect();

        Self {
            builtin,
            custom_templates,
            fallback,
        }
    }
}

/// Derive a field id from a label: lower-cased, whitespace runs become `-`.
pub fn derive_field_id(label: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static regex is valid"));
    re.replace_all(label.trim(), "-").to_lowercase()
}

/// Default [`QuestionProvider`]: a catalog plus an append-only custom registry.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    catalog: QuestionCatalog,
    custom: Vec<CustomField>,
}

impl QuestionBank {
    pub fn new(catalog: QuestionCatalog) -> Self {
        Self {
            catalog,
            custom: Vec::new(),
        }
    }

    /// Registered custom fields in registration order.
    pub fn custom_fields(&self) -> &[CustomField] {
        &self.custom
    }

    fn is_taken(&self, id: &str) -> bool {
        self.catalog.builtin.iter().any(|f| f.id == id) || self.custom.iter().any(|f| f.id == id)
    }
}

impl QuestionProvider for QuestionBank {
    fn resolve(&self, field_id: &str) -> Vec<String> {
        if let Some(field) = self.catalog.builtin.iter().find(|f| f.id == field_id) {
            debug!(field_id, "Resolved built-in questions");
            return field.questions.clone();
        }

        if let Some(custom) = self.custom.iter().find(|f| f.id == field_id) {
            debug!(field_id, label = %custom.label, "Resolved custom-field questions");
            return self
                .catalog
                .custom_templates
                .iter()
                .map(|t| t.replace(LABEL_PLACEHOLDER, &custom.label))
                .collect();
        }

        debug!(field_id, "Unknown field, using fallback questions");
        self.catalog.fallback.clone()
    }

    fn register_custom_field(&mut self, label: &str) -> Result<CustomField, InterviewError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(InterviewError::validation("field label", "must not be empty"));
        }

        let id = derive_field_id(label);
        if self.is_taken(&id) {
            return Err(InterviewError::Duplicate { id });
        }

        let field = CustomField {
            id,
            label: label.to_string(),
        };
        info!(field_id = %field.id, label = %field.label, "Registered custom field");
        self.custom.push(field.clone());
        Ok(field)
    }

    fn fields(&self) -> Vec<FieldInfo> {
        let builtin = self.catalog.builtin.iter().map(|f| FieldInfo {
            id: f.id.clone(),
            label: f.label.clone(),
            custom: false,
        });
        let custom = self.custom.iter().map(|f| FieldInfo {
            id: f.id.clone(),
            label: f.label.clone(),
            custom: true,
        });
        builtin.chain(custom).collect()
    }
}
