//! The model capability seam the classifier pipelines are written against.

pub mod gemma;

pub use gemma::{GemmaModel, GemmaPreset};

use std::path::Path;

use candle_core::{Device, Tensor};

/// The capability surface the pipelines need from a causal language model:
/// a tokenizer lookup, batched preprocessing, a forward pass producing
/// next-token logits, and an opaque training entry point.
///
/// Keeping this a trait lets the core be exercised against an in-memory
/// fake with no weights on disk.
pub trait CausalLm {
    /// Resolves a token string to its vocabulary id. `None` means the
    /// token is unknown; callers treat that as a configuration error.
    fn token_to_id(&self, token: &str) -> Option<u32>;

    /// Tokenizes a batch of prompts into a right-padded rectangle.
    fn preprocess(&self, prompts: &[String]) -> anyhow::Result<PaddedBatch>;

    /// Next-token logits for the batch, shape `[batch, seq_len, vocab]`,
    /// leading dimensions equal to the batch's padding mask.
    fn forward(&self, batch: &PaddedBatch) -> anyhow::Result<Tensor>;

    /// Fine-tunes on pre-built training strings. Prompt encoding is the
    /// caller's concern; batching and optimization are the model's.
    fn fit(
        &mut self,
        examples: &[String],
        config: &TrainingConfig,
    ) -> anyhow::Result<TrainingHistory>;

    /// Persists the adapter weights produced by [`fit`](CausalLm::fit).
    /// Inference-only backends fail here the same way they fail `fit`.
    fn save_adapter(&self, path: &Path) -> anyhow::Result<()>;

    fn device(&self) -> &Device;
}

/// A rectangular tokenized batch: token ids and a parallel 0/1 padding
/// mask of identical shape, real tokens first in every row.
#[derive(Debug, Clone)]
pub struct PaddedBatch {
    token_ids: Tensor,
    padding_mask: Tensor,
}

impl PaddedBatch {
    pub fn new(token_ids: Tensor, padding_mask: Tensor) -> anyhow::Result<Self> {
        anyhow::ensure!(
            token_ids.dims2()? == padding_mask.dims2()?,
            "token ids shape {:?} does not match padding mask shape {:?}",
            token_ids.shape(),
            padding_mask.shape()
        );
        Ok(Self {
            token_ids,
            padding_mask,
        })
    }

    /// Right-pads variable-length rows into a rectangle.
    pub fn from_rows(rows: &[Vec<u32>], pad_id: u32, device: &Device) -> anyhow::Result<Self> {
        let batch = rows.len();
        let seq_len = rows.iter().map(Vec::len).max().unwrap_or(0);

        let mut ids = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);
        for row in rows {
            ids.extend_from_slice(row);
            ids.extend(std::iter::repeat(pad_id).take(seq_len - row.len()));
            mask.extend(std::iter::repeat(1u32).take(row.len()));
            mask.extend(std::iter::repeat(0u32).take(seq_len - row.len()));
        }

        let token_ids = Tensor::from_vec(ids, (batch, seq_len), device)?;
        let padding_mask = Tensor::from_vec(mask, (batch, seq_len), device)?;
        Ok(Self {
            token_ids,
            padding_mask,
        })
    }

    pub fn token_ids(&self) -> &Tensor {
        &self.token_ids
    }

    pub fn padding_mask(&self) -> &Tensor {
        &self.padding_mask
    }

    pub fn batch_size(&self) -> usize {
        self.token_ids.dims()[0]
    }

    pub fn seq_len(&self) -> usize {
        self.token_ids.dims()[1]
    }
}

/// Epoch and batch configuration forwarded to the model's training entry
/// point.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 1,
            batch_size: 1,
        }
    }
}

/// Opaque record of a completed training run.
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub epoch_losses: Vec<f32>,
}

/// Uses CUDA when available, falling back to CPU.
pub fn load_device() -> anyhow::Result<Device> {
    match Device::new_cuda(0) {
        Ok(device) => Ok(device),
        Err(err) => {
            tracing::info!(%err, "CUDA not available, using CPU");
            Ok(Device::Cpu)
        }
    }
}
