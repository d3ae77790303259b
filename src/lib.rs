pub mod core;
pub mod loaders;
pub mod models;
pub mod pipelines;

// Re-export core types
pub use core::{ClassifierError, TextRecord, TrainingRecord};

// Re-export model types for easier access
pub use models::{CausalLm, GemmaModel, GemmaPreset, PaddedBatch, TrainingConfig, TrainingHistory};

// Re-export the pipelines and their builders
pub use pipelines::agile_classifier::{AgileClassifierBuilder, AgileClassifierPipeline};
pub use pipelines::shield_gemma::{HarmType, SafetyRecord, ShieldGemmaPipeline};
pub use pipelines::token_probability::{CandidateTokenSet, ScoreVector};
