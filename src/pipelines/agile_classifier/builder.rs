use crate::models::CausalLm;
use crate::pipelines::token_probability::CandidateTokenSet;

use super::pipeline::AgileClassifierPipeline;

pub const DEFAULT_INSTRUCTIONS: &str =
    "Classify the following text into one of the following classes";
pub const DEFAULT_SEPARATOR_TOKEN: &str = "<separator>";
pub const DEFAULT_END_OF_TEXT_TOKEN: &str = "<eos>";
const DEFAULT_SCORE_BATCH_SIZE: usize = 8;

pub struct AgileClassifierBuilder {
    labels: Vec<String>,
    instructions: String,
    separator_token: String,
    end_of_text_token: String,
    score_batch_size: usize,
}

impl AgileClassifierBuilder {
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Self {
        Self {
            labels: labels.iter().map(|l| l.as_ref().to_string()).collect(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            separator_token: DEFAULT_SEPARATOR_TOKEN.to_string(),
            end_of_text_token: DEFAULT_END_OF_TEXT_TOKEN.to_string(),
            score_batch_size: DEFAULT_SCORE_BATCH_SIZE,
        }
    }

    pub fn instructions(mut self, instructions: &str) -> Self {
        self.instructions = instructions.to_string();
        self
    }

    pub fn separator_token(mut self, separator_token: &str) -> Self {
        self.separator_token = separator_token.to_string();
        self
    }

    pub fn end_of_text_token(mut self, end_of_text_token: &str) -> Self {
        self.end_of_text_token = end_of_text_token.to_string();
        self
    }

    /// How many prompts are pushed through the model per forward pass.
    pub fn score_batch_size(mut self, score_batch_size: usize) -> Self {
        self.score_batch_size = score_batch_size;
        self
    }

    /// Resolves the label set against the model vocabulary and assembles
    /// the pipeline. A label missing from the vocabulary is a
    /// configuration error, raised here before anything is scored.
    pub fn build<M: CausalLm>(self, model: M) -> anyhow::Result<AgileClassifierPipeline<M>> {
        anyhow::ensure!(!self.labels.is_empty(), "at least one label is required");
        let labels = CandidateTokenSet::resolve(&self.labels, |token| model.token_to_id(token))?;
        Ok(AgileClassifierPipeline {
            model,
            labels,
            instructions: self.instructions,
            separator_token: self.separator_token,
            end_of_text_token: self.end_of_text_token,
            score_batch_size: self.score_batch_size,
        })
    }
}
