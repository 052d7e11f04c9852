//! Post-processing of sectioned assistant replies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chat errors.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Model error: {0}")]
    Model(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Model returned an empty reply")]
    EmptyReply,
}

impl ChatError {
    /// Quota exhaustion is sometimes only visible in the provider's message.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Model(message) => {
                let lower = message.to_lowercase();
                lower.contains("quota") || lower.contains("429")
            }
            Self::EmptyReply => false,
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

/// Words that open a conversation.
pub const GREETINGS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "good morning",
    "good afternoon",
    "namaste",
    "help",
];

/// Messages longer than this are never treated as greetings.
pub const MAX_GREETING_WORDS: usize = 5;

const ERROR_DETAIL_CHARS: usize = 200;

/// Coarse classification of a reply, taken from its section headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Diagnosis,
    Treatment,
    Warning,
    Greeting,
    Info,
    Error,
}

/// Disease the reply talks about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseRef {
    pub id: String,
    pub name: String,
    pub severity: String,
}

/// Reply handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub suggestions: Vec<String>,
    pub disease_detected: Option<DiseaseRef>,
    pub response_type: ResponseType,
}

/// A `[TAG]` headed block of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub tag: String,
    pub body: String,
}

fn header_tag(line: &str) -> Option<&str> {
    let tag = line.trim().strip_prefix('[')?.strip_suffix(']')?;
    let valid = !tag.is_empty() && tag.chars().all(|c| c.is_ascii_uppercase() || c == '_');
    valid.then_some(tag)
}

/// Split a reply into its tagged sections.
///
/// Text before the first header is kept as an `INFO` section. Sections with
/// empty bodies are dropped.
pub fn parse_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut tag = String::from("INFO");
    let mut body: Vec<&str> = Vec::new();

    let mut flush = |tag: &str, body: &mut Vec<&str>| {
        let joined = body.join("\n").trim().to_string();
        if !joined.is_empty() {
            sections.push(Section {
                tag: tag.to_string(),
                body: joined,
            });
        }
        body.clear();
    };

    for line in text.lines() {
        match header_tag(line) {
            Some(next) => {
                flush(&tag, &mut body);
                tag = next.to_string();
            }
            None => body.push(line),
        }
    }
    flush(&tag, &mut body);

    sections
}

fn has_section(lower: &str, tag: &str) -> bool {
    lower.contains(&format!("[{}]", tag))
}

/// Classify a reply by the first matching header in priority order.
pub fn detect_response_type(text: &str) -> ResponseType {
    let lower = text.to_lowercase();
    if has_section(&lower, "diagnosis") {
        ResponseType::Diagnosis
    } else if has_section(&lower, "treatment") {
        ResponseType::Treatment
    } else if has_section(&lower, "warning") {
        ResponseType::Warning
    } else if has_section(&lower, "greeting") {
        ResponseType::Greeting
    } else {
        ResponseType::Info
    }
}

/// Short message containing a greeting word or phrase.
pub fn is_greeting(message: &str) -> bool {
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() || words.len() > MAX_GREETING_WORDS {
        return false;
    }

    GREETINGS.iter().any(|greeting| {
        let phrase: Vec<&str> = greeting.split_whitespace().collect();
        words.windows(phrase.len()).any(|window| window == phrase.as_slice())
    })
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Canned welcome, sent without calling the model.
pub fn greeting_reply() -> ChatReply {
    let response = r#"[GREETING]
Hello! I'm Dr. Chicky, your poultry health assistant!

[INFO]
I can help you with:
- Disease diagnosis: describe symptoms and I'll identify likely causes
- Treatment plans: medicine recommendations and dosages
- Prevention tips: keeping your flock healthy
- Emergency guidance: knowing when to call a vet

[QUESTION]
How can I help you today? You can:
- Describe any symptoms you're seeing
- Ask about a specific disease
- Ask for a vaccination schedule"#;

    ChatReply {
        response: response.to_string(),
        suggestions: strings(&[
            "My birds have respiratory problems",
            "There's blood in droppings",
            "Birds are dying suddenly",
        ]),
        disease_detected: None,
        response_type: ResponseType::Greeting,
    }
}

/// Quick replies offered after the assistant's message.
///
/// Follow-up questions are answered first; otherwise the offer depends on
/// whether the reply diagnosed or treated something.
pub fn generate_suggestions(text: &str) -> Vec<String> {
    let questions: Vec<String> = parse_sections(text)
        .into_iter()
        .filter(|s| s.tag == "QUESTION")
        .map(|s| s.body.to_lowercase())
        .collect();

    for question in &questions {
        if question.contains("how old") || question.contains("age") {
            return strings(&["Less than 2 weeks old", "2-4 weeks old", "Over a month old"]);
        }
        if question.contains("how many") || question.contains("affected") {
            return strings(&["Just 1-2 birds", "About 10% of flock", "More than half affected"]);
        }
        if question.contains("mortality") || question.contains("died") {
            return strings(&["No deaths yet", "1-2 deaths", "Multiple deaths daily"]);
        }
    }

    let lower = text.to_lowercase();
    if has_section(&lower, "diagnosis") {
        return strings(&[
            "What treatment do you recommend?",
            "How to prevent this?",
            "Should I call a vet?",
        ]);
    }
    if has_section(&lower, "treatment") {
        return strings(&["What's the dosage?", "How long to treat?", "Any withdrawal period?"]);
    }

    strings(&["Tell me more about symptoms", "How to prevent diseases?", "Vaccination schedule"])
}

/// First catalogue disease whose name appears in the reply.
pub fn detect_disease_mention<'a>(
    text: &str,
    diseases: &'a [DiseaseRef],
) -> Option<&'a DiseaseRef> {
    let lower = text.to_lowercase();
    diseases
        .iter()
        .find(|d| !d.name.is_empty() && lower.contains(&d.name.to_lowercase()))
}

/// Friendly reply for a failed model call.
pub fn error_reply(error: &ChatError) -> ChatReply {
    if error.is_rate_limit() {
        let response = r#"[WARNING]
I'm experiencing high demand right now.

[INFO]
Please try again in a moment. Meanwhile, you can:
- Use the Predict tab for symptom-based diagnosis
- Check Tools for vaccination schedules
- View biosecurity checklists"#;

        return ChatReply {
            response: response.to_string(),
            suggestions: strings(&["Try again", "Go to Predict tab", "Check Tools"]),
            disease_detected: None,
            response_type: ResponseType::Error,
        };
    }

    let detail: String = error.to_string().chars().take(ERROR_DETAIL_CHARS).collect();
    let response = format!(
        "[WARNING]\nI encountered an error processing your request.\n\n\
         [INFO]\nError details: {}\n\n\
         [QUESTION]\nCould you please rephrase your question or provide more details \
         about what you're observing?",
        detail
    );

    ChatReply {
        response,
        suggestions: strings(&["Describe symptoms again", "Start fresh"]),
        disease_detected: None,
        response_type: ResponseType::Error,
    }
}
