//! Safety scoring with ShieldGemma harm-policy prompts.

mod pipeline;
pub mod text_processing;

pub use pipeline::ShieldGemmaPipeline;
pub use text_processing::{build_prompt, harm_definition, HarmType, SafetyRecord, UseCase};
