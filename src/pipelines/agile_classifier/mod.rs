//! A few-shot "agile" classifier: an LLM plus a label token set, scored
//! via restricted softmax and fine-tuned from prompt-encoded examples.

pub mod builder;
pub mod pipeline;
pub mod text_processing;

pub use builder::{
    AgileClassifierBuilder, DEFAULT_END_OF_TEXT_TOKEN, DEFAULT_INSTRUCTIONS,
    DEFAULT_SEPARATOR_TOKEN,
};
pub use pipeline::AgileClassifierPipeline;
