//! Prompt templates for the poultry health assistant.
//!
//! Replies are requested in tagged sections (`[DIAGNOSIS]`, `[TREATMENT]`, ...)
//! so that [`crate::response`] can classify them without a second model call.

use serde::{Deserialize, Serialize};

/// Number of prior turns sent back to the model with each message.
pub const HISTORY_TURNS: usize = 6;

/// System prompt for the assistant persona.
pub const SYSTEM_PROMPT: &str = r#"You are Dr. Chicky, an expert poultry health assistant. You MUST respond using STRUCTURED SECTIONS.

Section headers:
- [GREETING] for welcomes
- [ANALYSIS] for symptom analysis
- [DIAGNOSIS] for suspected diseases
- [TREATMENT] for medicines and care
- [WARNING] for urgent alerts
- [PREVENTION] for tips
- [QUESTION] for follow-up questions

Example layout:

[ANALYSIS]
Based on what you described:
- Symptom 1: what it indicates
- Symptom 2: what it indicates

[DIAGNOSIS]
HIGH RISK: Disease Name (confidence: 85%)
- Key reason for suspicion

POSSIBLE: Another Disease (confidence: 60%)
- Why this might be it

[TREATMENT]
Immediate actions:
1. First step
2. Second step

[WARNING]
URGENT: Call a veterinarian if mortality exceeds 5%!

[QUESTION]
To help you better, please tell me:
- How old are the birds?
- How many are affected?

Style:
- Be concise but thorough
- Use bullet points and numbered lists
- Include confidence percentages for diagnoses
- Mention at most 3 diseases in a diagnosis
- Always ask follow-up questions if information is incomplete

Knowledge:
Viral: Newcastle, Marek's, Avian Influenza, IBD/Gumboro, Infectious Bronchitis
Bacterial: E. coli, Salmonella, Mycoplasmosis, Fowl Cholera, CRD
Parasitic: Coccidiosis, worms, mites
Nutritional: Vitamin deficiencies, Calcium issues"#;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    fn tag(self) -> &'static str {
        match self {
            Self::User => "<|user|>",
            Self::Assistant => "<|assistant|>",
        }
    }
}

/// One prior message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The most recent [`HISTORY_TURNS`] turns, oldest first.
pub fn trim_history(history: &[ChatTurn]) -> &[ChatTurn] {
    &history[history.len().saturating_sub(HISTORY_TURNS)..]
}

/// User prompt wrapping a farmer's message.
pub fn make_chat_prompt(message: &str, bird_type: &str) -> String {
    format!(
        r#"User's message: {}
Bird type: {}

Common diseases to consider: Newcastle, Gumboro/IBD, Coccidiosis, E. coli, CRD, Marek's, Avian Influenza

REMEMBER: Use the structured section format with [SECTION] headers!"#,
        message.trim(),
        bird_type
    )
}

/// Build a complete prompt with system context and trimmed history.
pub fn build_full_prompt(message: &str, bird_type: &str, history: &[ChatTurn]) -> String {
    let mut prompt = String::new();

    prompt.push_str("<|system|>\n");
    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str("\n<|end|>\n");

    for turn in trim_history(history) {
        prompt.push_str(turn.role.tag());
        prompt.push('\n');
        prompt.push_str(&turn.content);
        prompt.push_str("\n<|end|>\n");
    }

    prompt.push_str("<|user|>\n");
    prompt.push_str(&make_chat_prompt(message, bird_type));
    prompt.push_str("\n<|end|>\n");
    prompt.push_str("<|assistant|>\n");

    prompt
}
