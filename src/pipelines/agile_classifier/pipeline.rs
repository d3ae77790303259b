use crate::core::ClassifierError;
use crate::models::{CausalLm, TrainingConfig, TrainingHistory};
use crate::pipelines::token_probability::{
    argmax, candidate_probabilities, CandidateTokenSet, ScoreVector,
};

use super::text_processing;

/// A labelled text classifier wrapped around a causal language model.
///
/// The class labels double as the candidate token set: the model's
/// next-token preference among them, restricted-softmaxed, is the class
/// distribution. Labels, instructions and token conventions are fixed at
/// build time; only the model's parameters change (during [`fit`]).
///
/// [`fit`]: AgileClassifierPipeline::fit
#[derive(Debug)]
pub struct AgileClassifierPipeline<M: CausalLm> {
    pub(crate) model: M,
    pub(crate) labels: CandidateTokenSet,
    pub(crate) instructions: String,
    pub(crate) separator_token: String,
    pub(crate) end_of_text_token: String,
    pub(crate) score_batch_size: usize,
}

impl<M: CausalLm> AgileClassifierPipeline<M> {
    fn encode_for_prediction(&self, text: &str) -> String {
        text_processing::build_prompt(
            text,
            self.labels.tokens(),
            &self.instructions,
            &self.separator_token,
        )
    }

    fn encode_for_training(&self, text: &str, label: &str) -> String {
        text_processing::build_training_example(
            text,
            label,
            self.labels.tokens(),
            &self.instructions,
            &self.separator_token,
            &self.end_of_text_token,
        )
    }

    /// Scores every text against the label set. One distribution per
    /// text, input order preserved, no deduplication.
    pub fn score(&self, texts: &[String]) -> anyhow::Result<Vec<ScoreVector>> {
        let prompts: Vec<String> = texts
            .iter()
            .map(|text| self.encode_for_prediction(text))
            .collect();

        let mut scores = Vec::with_capacity(prompts.len());
        for chunk in prompts.chunks(self.score_batch_size.max(1)) {
            tracing::debug!(prompts = chunk.len(), "scoring batch");
            let batch = self.model.preprocess(chunk)?;
            let logits = self.model.forward(&batch)?;
            scores.extend(candidate_probabilities(
                &logits,
                batch.padding_mask(),
                &self.labels,
            )?);
        }
        Ok(scores)
    }

    /// Arg-max label per text; exact ties go to the first label.
    pub fn predict(&self, texts: &[String]) -> anyhow::Result<Vec<String>> {
        Ok(self
            .score(texts)?
            .iter()
            .map(|scores| self.labels.tokens()[argmax(scores)].clone())
            .collect())
    }

    /// Fine-tunes the underlying model on `(text, label)` pairs.
    ///
    /// This owns the training-example encoding (prompt + gold label +
    /// end-of-text token) and delegates batching and optimization to the
    /// model. Mismatched text/label lengths fail fast.
    pub fn fit(
        &mut self,
        texts: &[String],
        labels: &[String],
        config: &TrainingConfig,
    ) -> anyhow::Result<TrainingHistory> {
        if texts.len() != labels.len() {
            return Err(ClassifierError::LengthMismatch {
                texts: texts.len(),
                labels: labels.len(),
            }
            .into());
        }

        let examples: Vec<String> = texts
            .iter()
            .zip(labels)
            .map(|(text, label)| self.encode_for_training(text, label))
            .collect();
        tracing::info!(
            examples = examples.len(),
            epochs = config.epochs,
            "starting fine-tuning"
        );
        self.model.fit(&examples, config)
    }

    /// The class labels, in score-vector order.
    pub fn labels(&self) -> &[String] {
        self.labels.tokens()
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}
