//! Services layer
//!
//! Stateless helpers used by the application layer.

pub mod prompt_builder;

pub use prompt_builder::PromptBuilder;
