//! An in-memory causal LM for exercising the pipelines without weights.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use candle_core::{Device, Tensor};

use llm_classifiers::models::{CausalLm, PaddedBatch, TrainingConfig, TrainingHistory};

/// A fake model with a fixed vocabulary and stubbed next-token logits.
///
/// `preprocess` produces deliberately ragged rows (lengths cycling 1, 2, 3)
/// so the batch is genuinely right-padded, and `forward` places each
/// prompt's stubbed logit row at that prompt's last real position only.
/// Everything else is zero, so gathering from the wrong position shows up
/// as a wrong score instead of passing by accident.
#[derive(Debug)]
pub struct FakeCausalLm {
    vocab: HashMap<String, u32>,
    vocab_size: usize,
    prompt_logits: HashMap<String, Vec<f32>>,
    last_batch: RefCell<Vec<String>>,
    pub fit_calls: Vec<(Vec<String>, TrainingConfig)>,
    saved_adapters: RefCell<Vec<PathBuf>>,
    device: Device,
}

impl FakeCausalLm {
    pub fn new(vocab: &[(&str, u32)], vocab_size: usize) -> Self {
        Self {
            vocab: vocab
                .iter()
                .map(|(token, id)| (token.to_string(), *id))
                .collect(),
            vocab_size,
            prompt_logits: HashMap::new(),
            last_batch: RefCell::new(Vec::new()),
            fit_calls: Vec::new(),
            saved_adapters: RefCell::new(Vec::new()),
            device: Device::Cpu,
        }
    }

    /// Stubs the full-vocabulary logit row returned at `prompt`'s last
    /// real token position.
    pub fn with_logits(mut self, prompt: &str, logits: Vec<f32>) -> Self {
        assert_eq!(logits.len(), self.vocab_size, "logit row must cover the vocab");
        self.prompt_logits.insert(prompt.to_string(), logits);
        self
    }

    /// The prompts passed to the most recent `preprocess` call.
    pub fn last_batch(&self) -> Vec<String> {
        self.last_batch.borrow().clone()
    }

    /// The paths `save_adapter` was asked to write.
    pub fn saved_adapters(&self) -> Vec<PathBuf> {
        self.saved_adapters.borrow().clone()
    }
}

impl CausalLm for FakeCausalLm {
    fn token_to_id(&self, token: &str) -> Option<u32> {
        self.vocab.get(token).copied()
    }

    fn preprocess(&self, prompts: &[String]) -> anyhow::Result<PaddedBatch> {
        *self.last_batch.borrow_mut() = prompts.to_vec();
        let rows: Vec<Vec<u32>> = prompts
            .iter()
            .enumerate()
            .map(|(i, _)| vec![1u32; i % 3 + 1])
            .collect();
        PaddedBatch::from_rows(&rows, 0, &self.device)
    }

    fn forward(&self, batch: &PaddedBatch) -> anyhow::Result<Tensor> {
        let prompts = self.last_batch.borrow();
        let mask = batch.padding_mask().to_vec2::<u32>()?;
        anyhow::ensure!(
            prompts.len() == mask.len(),
            "forward called with a batch that was not preprocessed last"
        );

        let (batch_size, seq_len) = (batch.batch_size(), batch.seq_len());
        let mut flat = vec![0f32; batch_size * seq_len * self.vocab_size];
        for (row, prompt) in prompts.iter().enumerate() {
            let real: usize = mask[row].iter().map(|&f| f as usize).sum();
            let last = real - 1;
            let logits = self
                .prompt_logits
                .get(prompt)
                .ok_or_else(|| anyhow::anyhow!("no stubbed logits for prompt {prompt:?}"))?;
            let offset = (row * seq_len + last) * self.vocab_size;
            flat[offset..offset + self.vocab_size].copy_from_slice(logits);
        }
        Ok(Tensor::from_vec(
            flat,
            (batch_size, seq_len, self.vocab_size),
            &self.device,
        )?)
    }

    fn fit(
        &mut self,
        examples: &[String],
        config: &TrainingConfig,
    ) -> anyhow::Result<TrainingHistory> {
        self.fit_calls.push((examples.to_vec(), config.clone()));
        Ok(TrainingHistory {
            epoch_losses: vec![0.5; config.epochs],
        })
    }

    fn save_adapter(&self, path: &Path) -> anyhow::Result<()> {
        self.saved_adapters.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn device(&self) -> &Device {
        &self.device
    }
}
