use anyhow::Result;

use crate::models::CausalLm;
use crate::pipelines::token_probability::{candidate_probabilities, CandidateTokenSet, ScoreVector};

use super::text_processing::{build_prompt, SafetyRecord};

/// ShieldGemma answers safety prompts with a leading `Yes` or `No`.
/// `Yes` means the content violates the policy.
const ANSWER_TOKENS: [&str; 2] = ["Yes", "No"];

const DEFAULT_SCORE_BATCH_SIZE: usize = 8;

/// Safety scorer over a ShieldGemma checkpoint.
#[derive(Debug)]
pub struct ShieldGemmaPipeline<M: CausalLm> {
    model: M,
    answer_tokens: CandidateTokenSet,
    score_batch_size: usize,
}

impl<M: CausalLm> ShieldGemmaPipeline<M> {
    pub fn new(model: M) -> Result<Self> {
        let answer_tokens =
            CandidateTokenSet::resolve(&ANSWER_TOKENS, |token| model.token_to_id(token))?;
        Ok(Self {
            model,
            answer_tokens,
            score_batch_size: DEFAULT_SCORE_BATCH_SIZE,
        })
    }

    pub fn with_score_batch_size(mut self, score_batch_size: usize) -> Self {
        self.score_batch_size = score_batch_size;
        self
    }

    /// `[p_yes, p_no]` for each already-rendered safety prompt.
    fn score_prompts(&self, prompts: &[String]) -> Result<Vec<ScoreVector>> {
        let mut scores = Vec::with_capacity(prompts.len());
        for chunk in prompts.chunks(self.score_batch_size.max(1)) {
            let batch = self.model.preprocess(chunk)?;
            let logits = self.model.forward(&batch)?;
            scores.extend(candidate_probabilities(
                &logits,
                batch.padding_mask(),
                &self.answer_tokens,
            )?);
        }
        Ok(scores)
    }

    /// Probability that each record's content violates its harm policy.
    pub fn violation_probability(&self, records: &[SafetyRecord]) -> Result<Vec<f32>> {
        let prompts = records
            .iter()
            .map(|record| {
                build_prompt(
                    record.harm_type,
                    &record.user_content,
                    record.model_content.as_deref(),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let scores = self.score_prompts(&prompts)?;
        Ok(scores.iter().map(|score| score[0]).collect())
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}
