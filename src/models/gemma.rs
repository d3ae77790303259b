//! Quantized Gemma backend for batched prompt scoring.
//!
//! Loads GGUF checkpoints in the gemma2 or gemma3 metadata layout, which
//! covers the `gemma-3-*-it` instruct models as well as `shieldgemma-2b`.
//! There is no KV cache and no generation loop: a batch is scored in one
//! forward pass and the language-model head is applied to every position,
//! so callers get `[batch, seq_len, vocab]` next-token logits aligned with
//! the batch's padding mask.

use std::io::{Read, Seek};
use std::path::Path;
use std::sync::Arc;

use candle_core::quantized::{gguf_file, QMatMul, QTensor};
use candle_core::{DType, Device, Result, Tensor};
use candle_nn::{Embedding, Module};
use tokenizers::Tokenizer;

use crate::core::ClassifierError;
use crate::loaders::{GgufModelLoader, TokenizerLoader};
use crate::models::{CausalLm, PaddedBatch, TrainingConfig, TrainingHistory};

/// GGUF metadata layouts this backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arch {
    Gemma2,
    Gemma3,
}

impl Arch {
    fn from_content(content: &gguf_file::Content) -> anyhow::Result<Self> {
        let arch = content
            .metadata
            .get("general.architecture")
            .ok_or_else(|| anyhow::anyhow!("GGUF file is missing general.architecture"))?
            .to_string()?;
        match arch.as_str() {
            "gemma2" => Ok(Arch::Gemma2),
            "gemma3" => Ok(Arch::Gemma3),
            other => anyhow::bail!("unsupported GGUF architecture: {other}"),
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Arch::Gemma2 => "gemma2",
            Arch::Gemma3 => "gemma3",
        }
    }

    fn default_rope_frequency(self) -> f32 {
        match self {
            Arch::Gemma2 => 10_000.,
            Arch::Gemma3 => 1_000_000.,
        }
    }

    fn default_rope_frequency_sliding(self) -> f32 {
        10_000.
    }

    /// Every n-th layer uses global attention, the rest slide.
    fn default_sliding_window_pattern(self) -> usize {
        match self {
            Arch::Gemma2 => 2,
            Arch::Gemma3 => 6,
        }
    }
}

/// Repeats key/value tensors for Grouped Query Attention.
fn repeat_kv(xs: Tensor, n_rep: usize) -> Result<Tensor> {
    if n_rep == 1 {
        return Ok(xs);
    }

    let (batch, num_kv_heads, seq_len, head_dim) = xs.dims4()?;
    Tensor::cat(&vec![&xs; n_rep], 2)?.reshape((batch, num_kv_heads * n_rep, seq_len, head_dim))
}

#[derive(Debug, Clone)]
struct RmsNorm {
    weight: Tensor,
    eps: f64,
}

impl RmsNorm {
    fn from_qtensor(weight: QTensor, eps: f64) -> Result<Self> {
        let weight = weight.dequantize(&weight.device())?;
        Ok(Self { weight, eps })
    }
}

impl Module for RmsNorm {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        candle_nn::ops::rms_norm(x, &self.weight, self.eps as f32)
    }
}

/// Rotary Position Embedding tables, precomputed up to the maximum
/// sequence length.
#[derive(Debug, Clone)]
struct RoPE {
    cos: Tensor,
    sin: Tensor,
}

impl RoPE {
    fn new(
        head_dim: usize,
        rope_frequency: f32,
        max_seq_len: usize,
        device: &Device,
    ) -> Result<Self> {
        let theta: Vec<_> = (0..head_dim)
            .step_by(2)
            .map(|i| 1f32 / rope_frequency.powf(i as f32 / head_dim as f32))
            .collect();
        let theta = Tensor::new(theta.as_slice(), device)?;
        let idx_theta = Tensor::arange(0f32, max_seq_len as f32, device)?
            .reshape((max_seq_len, 1))?
            .matmul(&theta.reshape((1, theta.elem_count()))?)?;
        let cos = idx_theta.cos()?;
        let sin = idx_theta.sin()?;
        Ok(Self { sin, cos })
    }

    fn apply(&self, q: &Tensor, k: &Tensor) -> Result<(Tensor, Tensor)> {
        let (_b_sz, _h, seq_len, _n_embd) = q.dims4()?;
        let cos = self.cos.narrow(0, 0, seq_len)?;
        let sin = self.sin.narrow(0, 0, seq_len)?;
        let q_embed = candle_nn::rotary_emb::rope(&q.contiguous()?, &cos, &sin)?;
        let k_embed = candle_nn::rotary_emb::rope(&k.contiguous()?, &cos, &sin)?;
        Ok((q_embed, k_embed))
    }
}

/// Feed-forward network with SwiGLU activation.
#[derive(Debug, Clone)]
struct FeedForward {
    gate_proj: QMatMul,
    up_proj: QMatMul,
    down_proj: QMatMul,
}

impl FeedForward {
    fn load<R: Read + Seek>(
        content: &gguf_file::Content,
        reader: &mut R,
        layer_prefix: &str,
        device: &Device,
    ) -> Result<Self> {
        let gate_proj = QMatMul::from_qtensor(content.tensor(
            reader,
            &format!("{layer_prefix}.ffn_gate.weight"),
            device,
        )?)?;
        let up_proj = QMatMul::from_qtensor(content.tensor(
            reader,
            &format!("{layer_prefix}.ffn_up.weight"),
            device,
        )?)?;
        let down_proj = QMatMul::from_qtensor(content.tensor(
            reader,
            &format!("{layer_prefix}.ffn_down.weight"),
            device,
        )?)?;

        Ok(Self {
            gate_proj,
            up_proj,
            down_proj,
        })
    }
}

impl Module for FeedForward {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let gate = self.gate_proj.forward(x)?;
        let up = self.up_proj.forward(x)?;
        let silu = candle_nn::ops::silu(&gate)?;
        let gated = (silu * up)?;
        self.down_proj.forward(&gated)
    }
}

/// Multi-head attention with Grouped Query Attention, optional Q/K
/// normalization (gemma3) and optional logit soft-capping (gemma2).
#[derive(Debug, Clone)]
struct Attention {
    q_proj: QMatMul,
    k_proj: QMatMul,
    v_proj: QMatMul,
    o_proj: QMatMul,
    q_norm: Option<RmsNorm>,
    k_norm: Option<RmsNorm>,
    num_heads: usize,
    num_kv_heads: usize,
    head_dim: usize,
    sliding_window_size: Option<usize>,
    attn_logit_softcap: Option<f64>,
    rope: Arc<RoPE>,
}

impl Attention {
    #[allow(clippy::too_many_arguments)]
    fn load<R: Read + Seek>(
        content: &gguf_file::Content,
        reader: &mut R,
        layer_prefix: &str,
        num_heads: usize,
        num_kv_heads: usize,
        head_dim: usize,
        sliding_window_size: Option<usize>,
        attn_logit_softcap: Option<f64>,
        rope: Arc<RoPE>,
        rms_eps: f64,
        device: &Device,
    ) -> Result<Self> {
        let q_proj = QMatMul::from_qtensor(content.tensor(
            reader,
            &format!("{layer_prefix}.attn_q.weight"),
            device,
        )?)?;
        let k_proj = QMatMul::from_qtensor(content.tensor(
            reader,
            &format!("{layer_prefix}.attn_k.weight"),
            device,
        )?)?;
        let v_proj = QMatMul::from_qtensor(content.tensor(
            reader,
            &format!("{layer_prefix}.attn_v.weight"),
            device,
        )?)?;
        let o_proj = QMatMul::from_qtensor(content.tensor(
            reader,
            &format!("{layer_prefix}.attn_output.weight"),
            device,
        )?)?;

        // Q/K norms exist in gemma3 checkpoints only.
        let q_norm_name = format!("{layer_prefix}.attn_q_norm.weight");
        let q_norm = if content.tensor_infos.contains_key(&q_norm_name) {
            Some(RmsNorm::from_qtensor(
                content.tensor(reader, &q_norm_name, device)?,
                rms_eps,
            )?)
        } else {
            None
        };
        let k_norm_name = format!("{layer_prefix}.attn_k_norm.weight");
        let k_norm = if content.tensor_infos.contains_key(&k_norm_name) {
            Some(RmsNorm::from_qtensor(
                content.tensor(reader, &k_norm_name, device)?,
                rms_eps,
            )?)
        } else {
            None
        };

        Ok(Self {
            q_proj,
            k_proj,
            v_proj,
            o_proj,
            q_norm,
            k_norm,
            num_heads,
            num_kv_heads,
            head_dim,
            sliding_window_size,
            attn_logit_softcap,
            rope,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: Option<&Tensor>) -> Result<Tensor> {
        let (batch, seq_len, _) = hidden_states.dims3()?;

        let queries = self
            .q_proj
            .forward(hidden_states)?
            .reshape((batch, seq_len, self.num_heads, self.head_dim))?
            .transpose(1, 2)?;

        let keys = self
            .k_proj
            .forward(hidden_states)?
            .reshape((batch, seq_len, self.num_kv_heads, self.head_dim))?
            .transpose(1, 2)?;

        let values = self
            .v_proj
            .forward(hidden_states)?
            .reshape((batch, seq_len, self.num_kv_heads, self.head_dim))?
            .transpose(1, 2)?;

        let queries = match &self.q_norm {
            Some(norm) => {
                let flat = queries.flatten(0, 2)?;
                norm.forward(&flat)?.reshape(queries.shape())?
            }
            None => queries,
        };
        let keys = match &self.k_norm {
            Some(norm) => {
                let flat = keys.flatten(0, 2)?;
                norm.forward(&flat)?.reshape(keys.shape())?
            }
            None => keys,
        };

        let (queries, keys) = self.rope.apply(&queries, &keys)?;

        // Expand KV for Grouped Query Attention
        let num_groups = self.num_heads / self.num_kv_heads;
        let keys = repeat_kv(keys, num_groups)?.contiguous()?;
        let values = repeat_kv(values.contiguous()?, num_groups)?.contiguous()?;

        let scale = (self.head_dim as f64).sqrt().recip();
        let mut attention_scores = (queries.contiguous()?.matmul(&keys.transpose(2, 3)?)? * scale)?;

        if let Some(cap) = self.attn_logit_softcap {
            attention_scores = ((attention_scores / cap)?.tanh()? * cap)?;
        }
        if let Some(mask) = attention_mask {
            attention_scores = attention_scores.broadcast_add(mask)?;
        }

        let attention_probs = candle_nn::ops::softmax_last_dim(&attention_scores)?;
        let context = attention_probs.matmul(&values)?;

        let output =
            context
                .transpose(1, 2)?
                .reshape((batch, seq_len, self.num_heads * self.head_dim))?;

        self.o_proj.forward(&output)
    }
}

/// Single transformer layer with pre- and post-normalization.
#[derive(Debug, Clone)]
struct TransformerLayer {
    attention: Attention,
    feed_forward: FeedForward,
    attention_norm: RmsNorm,
    post_attention_norm: RmsNorm,
    ffn_norm: RmsNorm,
    post_ffn_norm: RmsNorm,
}

impl TransformerLayer {
    #[allow(clippy::too_many_arguments)]
    fn load<R: Read + Seek>(
        content: &gguf_file::Content,
        reader: &mut R,
        layer_idx: usize,
        num_heads: usize,
        num_kv_heads: usize,
        head_dim: usize,
        sliding_window_size: Option<usize>,
        attn_logit_softcap: Option<f64>,
        rope: Arc<RoPE>,
        rms_eps: f64,
        device: &Device,
    ) -> Result<Self> {
        let prefix = format!("blk.{layer_idx}");

        let attention = Attention::load(
            content,
            reader,
            &prefix,
            num_heads,
            num_kv_heads,
            head_dim,
            sliding_window_size,
            attn_logit_softcap,
            rope,
            rms_eps,
            device,
        )?;
        let feed_forward = FeedForward::load(content, reader, &prefix, device)?;

        let attention_norm = RmsNorm::from_qtensor(
            content.tensor(reader, &format!("{prefix}.attn_norm.weight"), device)?,
            rms_eps,
        )?;
        let post_attention_norm = RmsNorm::from_qtensor(
            content.tensor(
                reader,
                &format!("{prefix}.post_attention_norm.weight"),
                device,
            )?,
            rms_eps,
        )?;
        let ffn_norm = RmsNorm::from_qtensor(
            content.tensor(reader, &format!("{prefix}.ffn_norm.weight"), device)?,
            rms_eps,
        )?;
        let post_ffn_norm = RmsNorm::from_qtensor(
            content.tensor(reader, &format!("{prefix}.post_ffw_norm.weight"), device)?,
            rms_eps,
        )?;

        Ok(Self {
            attention,
            feed_forward,
            attention_norm,
            post_attention_norm,
            ffn_norm,
            post_ffn_norm,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: Option<&Tensor>) -> Result<Tensor> {
        // Attention block
        let residual = hidden_states;
        let hidden_states = self.attention_norm.forward(hidden_states)?;
        let attention_out = self.attention.forward(&hidden_states, attention_mask)?;
        let hidden_states = self.post_attention_norm.forward(&attention_out)?;
        let hidden_states = (hidden_states + residual)?;

        // Feed-forward block
        let residual = &hidden_states;
        let hidden_states = self.ffn_norm.forward(&hidden_states)?;
        let ffn_out = self.feed_forward.forward(&hidden_states)?;
        let hidden_states = self.post_ffn_norm.forward(&ffn_out)?;
        hidden_states + residual
    }
}

/// Well-known checkpoints for the bundled pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GemmaPreset {
    Gemma3_1BInstruct,
    Gemma3_4BInstruct,
    ShieldGemma2B,
}

impl GemmaPreset {
    pub fn model_repo(&self) -> &'static str {
        match self {
            GemmaPreset::Gemma3_1BInstruct => "unsloth/gemma-3-1b-it-GGUF",
            GemmaPreset::Gemma3_4BInstruct => "unsloth/gemma-3-4b-it-GGUF",
            GemmaPreset::ShieldGemma2B => "bartowski/shieldgemma-2b-GGUF",
        }
    }

    pub fn model_file(&self) -> &'static str {
        match self {
            GemmaPreset::Gemma3_1BInstruct => "gemma-3-1b-it-Q4_K_M.gguf",
            GemmaPreset::Gemma3_4BInstruct => "gemma-3-4b-it-Q4_K_M.gguf",
            GemmaPreset::ShieldGemma2B => "shieldgemma-2b-Q4_K_M.gguf",
        }
    }

    pub fn tokenizer_repo(&self) -> &'static str {
        match self {
            GemmaPreset::Gemma3_1BInstruct => "google/gemma-3-1b-it",
            GemmaPreset::Gemma3_4BInstruct => "google/gemma-3-4b-it",
            GemmaPreset::ShieldGemma2B => "google/shieldgemma-2b",
        }
    }
}

/// Quantized Gemma model wired up for batch scoring.
pub struct GemmaModel {
    embeddings: Embedding,
    embedding_length: usize,
    layers: Vec<TransformerLayer>,
    final_norm: RmsNorm,
    output_projection: QMatMul,
    final_logit_softcap: Option<f64>,
    tokenizer: Tokenizer,
    pad_id: u32,
    max_seq_len: usize,
    device: Device,
}

impl GemmaModel {
    /// Downloads and loads one of the well-known checkpoints.
    pub fn from_preset(
        preset: GemmaPreset,
        max_seq_len: usize,
        device: &Device,
    ) -> anyhow::Result<Self> {
        Self::from_files(
            preset.model_repo(),
            preset.model_file(),
            preset.tokenizer_repo(),
            max_seq_len,
            device,
        )
    }

    /// Downloads and loads an arbitrary gemma2/gemma3 GGUF checkpoint.
    pub fn from_files(
        model_repo: &str,
        model_file: &str,
        tokenizer_repo: &str,
        max_seq_len: usize,
        device: &Device,
    ) -> anyhow::Result<Self> {
        let (mut file, content) = GgufModelLoader::new(model_repo, model_file).load()?;
        let tokenizer = TokenizerLoader::new(tokenizer_repo, "tokenizer.json").load()?;
        Self::from_gguf(content, &mut file, tokenizer, max_seq_len, device)
    }

    /// Loads model weights from an already-open GGUF file.
    pub fn from_gguf<R: Read + Seek>(
        content: gguf_file::Content,
        reader: &mut R,
        tokenizer: Tokenizer,
        max_seq_len: usize,
        device: &Device,
    ) -> anyhow::Result<Self> {
        let arch = Arch::from_content(&content)?;
        let prefix = arch.prefix();

        let get_metadata = |key: String| -> Result<&gguf_file::Value> {
            content
                .metadata
                .get(&key)
                .ok_or_else(|| candle_core::Error::Msg(format!("Missing metadata key: {key}")))
        };

        let num_heads = get_metadata(format!("{prefix}.attention.head_count"))?.to_u32()? as usize;
        let num_kv_heads =
            get_metadata(format!("{prefix}.attention.head_count_kv"))?.to_u32()? as usize;
        let num_layers = get_metadata(format!("{prefix}.block_count"))?.to_u32()? as usize;
        let embedding_length = get_metadata(format!("{prefix}.embedding_length"))?.to_u32()? as usize;
        let head_dim = match content.metadata.get(&format!("{prefix}.attention.key_length")) {
            Some(value) => value.to_u32()? as usize,
            None => embedding_length / num_heads,
        };
        let rms_eps =
            get_metadata(format!("{prefix}.attention.layer_norm_rms_epsilon"))?.to_f32()? as f64;
        let sliding_window_size =
            get_metadata(format!("{prefix}.attention.sliding_window"))?.to_u32()? as usize;

        let sliding_window_pattern = content
            .metadata
            .get(&format!("{prefix}.attention.sliding_window_type"))
            .and_then(|m| m.to_u32().ok())
            .map(|m| m as usize)
            .unwrap_or_else(|| arch.default_sliding_window_pattern());

        let rope_freq_base = content
            .metadata
            .get(&format!("{prefix}.rope.freq_base"))
            .and_then(|m| m.to_f32().ok())
            .unwrap_or_else(|| arch.default_rope_frequency());

        let rope_freq_base_sliding = content
            .metadata
            .get(&format!("{prefix}.rope.local_freq_base"))
            .and_then(|m| m.to_f32().ok())
            .unwrap_or_else(|| arch.default_rope_frequency_sliding());

        let attn_logit_softcap = content
            .metadata
            .get(&format!("{prefix}.attn_logit_softcapping"))
            .and_then(|m| m.to_f32().ok())
            .map(|c| c as f64);
        let final_logit_softcap = content
            .metadata
            .get(&format!("{prefix}.final_logit_softcapping"))
            .and_then(|m| m.to_f32().ok())
            .map(|c| c as f64);

        let embed_tensor = content.tensor(reader, "token_embd.weight", device)?;
        let embeddings = Embedding::new(embed_tensor.dequantize(device)?, embedding_length);

        let final_norm = RmsNorm::from_qtensor(
            content.tensor(reader, "output_norm.weight", device)?,
            rms_eps,
        )?;

        // The output head is tied to the embeddings in most checkpoints.
        let output_tensor = content
            .tensor(reader, "output.weight", device)
            .or_else(|_| content.tensor(reader, "token_embd.weight", device))?;
        let output_projection = QMatMul::from_qtensor(output_tensor)?;

        let mut layers = Vec::with_capacity(num_layers);
        for layer_idx in 0..num_layers {
            let is_sliding = (layer_idx + 1) % sliding_window_pattern > 0;
            let layer_sliding_window = is_sliding.then_some(sliding_window_size);
            let layer_rope_frequency = if is_sliding {
                rope_freq_base_sliding
            } else {
                rope_freq_base
            };

            let rope = Arc::new(RoPE::new(
                head_dim,
                layer_rope_frequency,
                max_seq_len,
                device,
            )?);

            layers.push(TransformerLayer::load(
                &content,
                reader,
                layer_idx,
                num_heads,
                num_kv_heads,
                head_dim,
                layer_sliding_window,
                attn_logit_softcap,
                rope,
                rms_eps,
                device,
            )?);
        }

        let pad_id = tokenizer.token_to_id("<pad>").unwrap_or(0);

        tracing::info!(
            arch = prefix,
            num_layers,
            num_heads,
            embedding_length,
            max_seq_len,
            "loaded gemma model"
        );

        Ok(Self {
            embeddings,
            embedding_length,
            layers,
            final_norm,
            output_projection,
            final_logit_softcap,
            tokenizer,
            pad_id,
            max_seq_len,
            device: device.clone(),
        })
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Additive attention mask, `0` where attention is allowed and `-inf`
    /// where it is not, with optional sliding window.
    fn causal_mask(&self, seq_len: usize, sliding_window_size: Option<usize>) -> Result<Tensor> {
        let row_ids = Tensor::arange(0f32, seq_len as f32, &self.device)?.reshape((seq_len, 1))?;
        let col_ids = Tensor::arange(0f32, seq_len as f32, &self.device)?.reshape((1, seq_len))?;

        let neg_inf = Tensor::full(f32::NEG_INFINITY, (seq_len, seq_len), &self.device)?;
        let zeros = Tensor::zeros((seq_len, seq_len), DType::F32, &self.device)?;

        let causal_condition = col_ids.broadcast_gt(&row_ids)?;
        let mut mask = causal_condition.where_cond(&neg_inf, &zeros)?;

        if let Some(window_size) = sliding_window_size {
            let reach = (&col_ids + window_size as f64)?;
            let sliding_condition = row_ids.broadcast_gt(&reach)?;
            let sliding_mask = sliding_condition.where_cond(&neg_inf, &zeros)?;
            mask = mask.maximum(&sliding_mask)?;
        }

        mask.unsqueeze(0)?.unsqueeze(0)
    }

    /// Next-token logits for every position, `[batch, seq_len, vocab]`.
    ///
    /// Rows are right-padded; the causal mask already keeps real positions
    /// from attending to trailing padding, so no padding term is needed.
    fn logits(&self, token_ids: &Tensor) -> Result<Tensor> {
        let (_batch, seq_len) = token_ids.dims2()?;

        let mut hidden_states = self.embeddings.forward(token_ids)?;
        hidden_states = (hidden_states * (self.embedding_length as f64).sqrt())?;

        let global_mask = if seq_len > 1 {
            Some(self.causal_mask(seq_len, None)?)
        } else {
            None
        };
        let mut sliding_mask: Option<Tensor> = None;

        for layer in &self.layers {
            let mask = match layer.attention.sliding_window_size {
                Some(window) if seq_len > 1 => {
                    if sliding_mask.is_none() {
                        sliding_mask = Some(self.causal_mask(seq_len, Some(window))?);
                    }
                    sliding_mask.as_ref()
                }
                _ => global_mask.as_ref(),
            };
            hidden_states = layer.forward(&hidden_states, mask)?;
        }

        hidden_states = self.final_norm.forward(&hidden_states)?;
        let mut logits = self.output_projection.forward(&hidden_states)?;
        if let Some(cap) = self.final_logit_softcap {
            logits = ((logits / cap)?.tanh()? * cap)?;
        }
        logits.to_dtype(DType::F32)
    }
}

impl CausalLm for GemmaModel {
    fn token_to_id(&self, token: &str) -> Option<u32> {
        self.tokenizer.token_to_id(token)
    }

    fn preprocess(&self, prompts: &[String]) -> anyhow::Result<PaddedBatch> {
        let mut rows = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let encoding = self
                .tokenizer
                .encode(prompt.as_str(), true)
                .map_err(anyhow::Error::msg)?;
            let mut ids = encoding.get_ids().to_vec();
            if ids.len() > self.max_seq_len {
                tracing::warn!(
                    tokens = ids.len(),
                    max = self.max_seq_len,
                    "truncating prompt to the maximum sequence length"
                );
                ids.truncate(self.max_seq_len);
            }
            rows.push(ids);
        }
        PaddedBatch::from_rows(&rows, self.pad_id, &self.device)
    }

    fn forward(&self, batch: &PaddedBatch) -> anyhow::Result<Tensor> {
        Ok(self.logits(batch.token_ids())?)
    }

    fn fit(
        &mut self,
        _examples: &[String],
        _config: &TrainingConfig,
    ) -> anyhow::Result<TrainingHistory> {
        Err(ClassifierError::InferenceOnly {
            backend: "the quantized gemma backend",
        }
        .into())
    }

    fn save_adapter(&self, _path: &Path) -> anyhow::Result<()> {
        Err(ClassifierError::InferenceOnly {
            backend: "the quantized gemma backend",
        }
        .into())
    }

    fn device(&self) -> &Device {
        &self.device
    }
}
