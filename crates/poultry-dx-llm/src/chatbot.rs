//! Conversation driver around a pluggable language model.

use tracing::{debug, warn};

use crate::prompts::{build_full_prompt, ChatTurn};
use crate::response::{
    detect_disease_mention, detect_response_type, error_reply, generate_suggestions,
    greeting_reply, is_greeting, ChatError, ChatReply, ChatResult, DiseaseRef,
};

/// Text completion backend.
pub trait ChatModel {
    /// Complete a fully rendered prompt.
    fn complete(&self, prompt: &str) -> ChatResult<String>;
}

/// Poultry health assistant.
pub struct Chatbot<M> {
    model: M,
    diseases: Vec<DiseaseRef>,
}

impl<M: ChatModel> Chatbot<M> {
    /// `diseases` is the catalogue used to spot disease names in replies.
    pub fn new(model: M, diseases: Vec<DiseaseRef>) -> Self {
        Self { model, diseases }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Answer one message. Model failures become friendly error replies.
    pub fn process_message(
        &self,
        message: &str,
        bird_type: &str,
        history: &[ChatTurn],
    ) -> ChatReply {
        if history.is_empty() && is_greeting(message) {
            debug!("Answering greeting without model call");
            return greeting_reply();
        }

        match self.ask(message, bird_type, history) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Chat model call failed");
                error_reply(&e)
            }
        }
    }

    fn ask(&self, message: &str, bird_type: &str, history: &[ChatTurn]) -> ChatResult<ChatReply> {
        let prompt = build_full_prompt(message, bird_type, history);
        let text = self.model.complete(&prompt)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyReply);
        }

        let response_type = detect_response_type(text);
        debug!(?response_type, "Model replied");

        Ok(ChatReply {
            response: text.to_string(),
            suggestions: generate_suggestions(text),
            disease_detected: detect_disease_mention(text, &self.diseases).cloned(),
            response_type,
        })
    }
}

/// Mock model for testing without actual inference.
///
/// Replies with a canned sectioned answer keyed on words in the user message
/// and records every prompt it receives.
#[derive(Default)]
pub struct MockChatModel {
    prompts: std::sync::Mutex<Vec<String>>,
    failure: Option<String>,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            prompts: Default::default(),
            failure: Some(message.into()),
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl ChatModel for MockChatModel {
    fn complete(&self, prompt: &str) -> ChatResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(message) = &self.failure {
            return Err(ChatError::Model(message.clone()));
        }

        // Only the final user block is the new message
        let message = prompt
            .rsplit("<|user|>")
            .next()
            .unwrap_or_default()
            .to_lowercase();

        let reply = if message.contains("blood") {
            "[ANALYSIS]\nBloody droppings suggest an intestinal parasite.\n\n\
             [DIAGNOSIS]\nHIGH RISK: Coccidiosis (confidence: 80%)\n\n\
             [QUESTION]\nHow old are the birds?"
        } else if message.contains("treat") {
            "[TREATMENT]\n1. Amprolium in drinking water for 5 days\n2. Keep litter dry"
        } else if message.contains("silent") {
            "   "
        } else {
            "[INFO]\nKeep feeders clean and litter dry."
        };

        Ok(reply.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseType;

    fn chatbot(model: MockChatModel) -> Chatbot<MockChatModel> {
        let diseases = vec![
            DiseaseRef {
                id: "coccidiosis".into(),
                name: "Coccidiosis".into(),
                severity: "severe".into(),
            },
            DiseaseRef {
                id: "fowl_pox".into(),
                name: "Fowl Pox".into(),
                severity: "moderate".into(),
            },
        ];
        Chatbot::new(model, diseases)
    }

    #[test]
    fn test_greeting_skips_model() {
        let bot = chatbot(MockChatModel::new());
        let reply = bot.process_message("Hello!", "broiler", &[]);
        assert_eq!(reply.response_type, ResponseType::Greeting);
        assert!(bot.model().prompts().is_empty());
    }

    #[test]
    fn test_greeting_mid_conversation_goes_to_model() {
        let bot = chatbot(MockChatModel::new());
        let history = vec![
            ChatTurn::user("my birds are sick"),
            ChatTurn::assistant("[QUESTION]\nWhat do you see?"),
        ];
        let reply = bot.process_message("hi", "broiler", &history);
        assert_eq!(reply.response_type, ResponseType::Info);
        assert_eq!(bot.model().prompts().len(), 1);
    }

    #[test]
    fn test_diagnosis_reply() {
        let bot = chatbot(MockChatModel::new());
        let reply = bot.process_message("There is blood in the droppings", "broiler", &[]);

        assert_eq!(reply.response_type, ResponseType::Diagnosis);
        assert_eq!(reply.suggestions[0], "Less than 2 weeks old");
        assert_eq!(reply.disease_detected.unwrap().id, "coccidiosis");

        let prompts = bot.model().prompts();
        assert!(prompts[0].contains("Bird type: broiler"));
    }

    #[test]
    fn test_treatment_reply() {
        let bot = chatbot(MockChatModel::new());
        let history = [ChatTurn::user("blood in droppings")];
        let reply = bot.process_message("How do I treat it?", "layer", &history);
        assert_eq!(reply.response_type, ResponseType::Treatment);
        assert_eq!(reply.suggestions[0], "What's the dosage?");
        assert!(reply.disease_detected.is_none());
    }

    #[test]
    fn test_empty_model_reply_is_an_error() {
        let bot = chatbot(MockChatModel::new());
        let reply = bot.process_message("the birds went silent overnight", "broiler", &[]);
        assert_eq!(reply.response_type, ResponseType::Error);
        assert_eq!(reply.suggestions, vec!["Describe symptoms again", "Start fresh"]);
    }

    #[test]
    fn test_quota_failure() {
        let bot = chatbot(MockChatModel::failing("RESOURCE_EXHAUSTED: quota exceeded"));
        let reply = bot.process_message("my hens stopped laying eggs", "layer", &[]);
        assert_eq!(reply.response_type, ResponseType::Error);
        assert_eq!(reply.suggestions[0], "Try again");
    }
}
