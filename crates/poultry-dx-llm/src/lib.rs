//! Chat assistant plumbing for poultry health questions.
//!
//! The language model itself lives behind the [`ChatModel`] trait. This crate
//! owns everything around it: the structured system prompt, conversation
//! history trimming, greeting short-circuits and post-processing of the
//! model's sectioned replies into suggestions and disease mentions.

pub mod chatbot;
pub mod prompts;
pub mod response;

pub use chatbot::*;
pub use prompts::*;
pub use response::*;
