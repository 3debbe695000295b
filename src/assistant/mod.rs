//! AI assistant pipelines
//!
//! Two independent flows share one [`Provider`]: debounced per-function
//! explanations (Teacher/Reviewer) and the Vibe edit loop. Each keeps its own
//! status slot; neither queues work.

mod edit;
mod explain;
mod gemini;
mod panel;
mod parse;
mod prompts;
mod provider;
mod status;

pub use edit::{
    EditPipeline, APPLY_FAILED, EMPTY_PROMPT, GENERATING, NO_ACTIVE_FILE, NO_APPLICABLE_EDIT,
};
pub use explain::{render_explanations, ExplainPipeline, NO_FUNCTIONS, UNABLE_TO_PARSE};
pub use gemini::GeminiProvider;
pub use panel::AssistantPanel;
pub use parse::{
    parse_edit, parse_explanations, parse_response, strip_code_fences, EditResult,
    ExplanationEntry, MalformedResponse, ParsedResponse, ResponseShape,
};
pub use prompts::{edit_prompt, explain_prompt};
pub use provider::{Provider, ProviderError};
pub use status::{PipelineKind, PipelineStatus};

use serde::{Deserialize, Serialize};

/// Framing used when asking for explanations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainMode {
    Teacher,
    Reviewer,
}

/// What the assistant panel is currently doing with the active file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantMode {
    #[default]
    Teacher,
    Reviewer,
    Vibe,
}

impl AssistantMode {
    /// The explanation framing for this mode; Vibe does not explain
    pub fn explain_mode(self) -> Option<ExplainMode> {
        match self {
            AssistantMode::Teacher => Some(ExplainMode::Teacher),
            AssistantMode::Reviewer => Some(ExplainMode::Reviewer),
            AssistantMode::Vibe => None,
        }
    }
}
