//! Answer synthesis from retrieved transcript chunks.

pub mod context;
mod response;

pub use context::format_context;
pub use response::{AnswerGenerator, LanguageModel, OpenAIChatModel};

#[cfg(test)]
pub(crate) use response::tests::ScriptedModel;
