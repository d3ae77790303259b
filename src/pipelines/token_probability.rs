//! Relative probabilities for a fixed candidate token set.
//!
//! Given a causal LM's next-token logits for a padded batch, extract the
//! logits at each row's last real token position and softmax over the
//! candidate columns only. The result is a distribution *restricted* to
//! the candidate set, not the marginal probability over the vocabulary;
//! that restriction is the point, not an approximation.

use candle_core::{DType, IndexOp, Tensor};
use candle_nn::ops::softmax;

use crate::core::ClassifierError;

/// A probability distribution over a [`CandidateTokenSet`]: one entry per
/// candidate, each in `[0, 1]`, summing to one.
pub type ScoreVector = Vec<f32>;

/// Ordered candidate tokens resolved to vocabulary ids.
///
/// Order is significant: it fixes the index-to-label mapping of every
/// score vector produced downstream. Immutable once resolved.
#[derive(Debug, Clone)]
pub struct CandidateTokenSet {
    tokens: Vec<String>,
    ids: Vec<u32>,
}

impl CandidateTokenSet {
    /// Resolves every token through the tokenizer lookup, failing on the
    /// first token missing from the vocabulary.
    pub fn resolve<S, F>(tokens: &[S], token_to_id: F) -> Result<Self, ClassifierError>
    where
        S: AsRef<str>,
        F: Fn(&str) -> Option<u32>,
    {
        let mut ids = Vec::with_capacity(tokens.len());
        for token in tokens {
            let token = token.as_ref();
            match token_to_id(token) {
                Some(id) => ids.push(id),
                None => {
                    return Err(ClassifierError::UnknownToken {
                        token: token.to_string(),
                    })
                }
            }
        }
        Ok(Self {
            tokens: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
            ids,
        })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Zero-based index of the last real token per row, `sum(mask) - 1`.
///
/// Rows must be right-padded: real tokens first, padding after. A row of
/// pure padding is a hard error, as is a row where `sum(mask) - 1` does
/// not sit on the real/padding boundary (a left-padded batch would score
/// the wrong position silently otherwise).
pub fn last_token_indices(padding_mask: &Tensor) -> anyhow::Result<Vec<usize>> {
    let (_rows, seq_len) = padding_mask.dims2()?;
    let mask = padding_mask.to_dtype(DType::U32)?.to_vec2::<u32>()?;

    let mut indices = Vec::with_capacity(mask.len());
    for (row, flags) in mask.iter().enumerate() {
        let real: usize = flags.iter().map(|&f| (f != 0) as usize).sum();
        if real == 0 {
            return Err(ClassifierError::AllPaddingRow { row }.into());
        }
        let last = real - 1;
        let on_boundary = flags[last] != 0 && (last + 1 == seq_len || flags[last + 1] == 0);
        if !on_boundary {
            return Err(ClassifierError::PaddingConvention { row }.into());
        }
        indices.push(last);
    }
    Ok(indices)
}

/// Restricted softmax over the candidate columns at each row's last real
/// token position. One [`ScoreVector`] per batch row, row order preserved.
pub fn candidate_probabilities(
    logits: &Tensor,
    padding_mask: &Tensor,
    candidates: &CandidateTokenSet,
) -> anyhow::Result<Vec<ScoreVector>> {
    let (batch, seq_len, _vocab) = logits.dims3()?;
    let mask_dims = padding_mask.dims2()?;
    anyhow::ensure!(
        (batch, seq_len) == mask_dims,
        "logits shape {:?} does not match padding mask shape {:?}",
        logits.shape(),
        padding_mask.shape()
    );

    let candidate_ids = Tensor::new(candidates.ids(), logits.device())?;
    let mut scores = Vec::with_capacity(batch);
    for (row, last) in last_token_indices(padding_mask)?.into_iter().enumerate() {
        let row_logits = logits.i((row, last))?;
        let selected = row_logits
            .index_select(&candidate_ids, 0)?
            .to_dtype(DType::F32)?;
        scores.push(softmax(&selected, 0)?.to_vec1::<f32>()?);
    }
    Ok(scores)
}

/// Index of the maximum score; exact ties go to the lowest index.
pub fn argmax(scores: &[f32]) -> usize {
    let mut best = 0;
    for (idx, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = idx;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn mask(rows: &[&[u32]]) -> Tensor {
        let seq_len = rows[0].len();
        let flat: Vec<u32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Tensor::from_vec(flat, (rows.len(), seq_len), &Device::Cpu).unwrap()
    }

    /// Builds `[batch, seq, vocab]` logits with the given rows placed at
    /// explicit positions and zeros everywhere else.
    fn logits_at(
        batch: usize,
        seq_len: usize,
        vocab: usize,
        placed: &[(usize, usize, Vec<f32>)],
    ) -> Tensor {
        let mut flat = vec![0f32; batch * seq_len * vocab];
        for (row, pos, values) in placed {
            let offset = (row * seq_len + pos) * vocab;
            flat[offset..offset + vocab].copy_from_slice(values);
        }
        Tensor::from_vec(flat, (batch, seq_len, vocab), &Device::Cpu).unwrap()
    }

    #[test]
    fn resolve_fails_on_unknown_token() {
        let lookup = |t: &str| match t {
            "Yes" => Some(3u32),
            "No" => Some(5u32),
            _ => None,
        };
        assert!(CandidateTokenSet::resolve(&["Yes", "No"], lookup).is_ok());
        let err = CandidateTokenSet::resolve(&["Yes", "Maybe"], lookup).unwrap_err();
        assert!(matches!(err, ClassifierError::UnknownToken { token } if token == "Maybe"));
    }

    #[test]
    fn last_index_matches_true_last_real_token_for_right_padding() {
        // Ragged real lengths 1..=4, right-padded to 4.
        let m = mask(&[
            &[1, 0, 0, 0],
            &[1, 1, 0, 0],
            &[1, 1, 1, 0],
            &[1, 1, 1, 1],
        ]);
        let indices = last_token_indices(&m).unwrap();
        let expected: Vec<usize> = m
            .to_vec2::<u32>()
            .unwrap()
            .iter()
            .map(|flags| flags.iter().rposition(|&f| f == 1).unwrap())
            .collect();
        assert_eq!(indices, expected);
    }

    #[test]
    fn all_padding_row_is_an_error() {
        let m = mask(&[&[1, 1, 0], &[0, 0, 0]]);
        let err = last_token_indices(&m).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClassifierError>(),
            Some(ClassifierError::AllPaddingRow { row: 1 })
        ));
    }

    #[test]
    fn left_padded_rows_are_rejected_not_mis_scored() {
        // sum(mask) - 1 == 1 but the last real token sits at index 2.
        let m = mask(&[&[0, 1, 1]]);
        let err = last_token_indices(&m).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClassifierError>(),
            Some(ClassifierError::PaddingConvention { row: 0 })
        ));
    }

    #[test]
    fn yes_no_scores_are_a_restricted_softmax() {
        let candidates = CandidateTokenSet::resolve(&["Yes", "No"], |t| match t {
            "Yes" => Some(3),
            "No" => Some(5),
            _ => None,
        })
        .unwrap();

        // Single prompt, one real position; "Yes" outscores "No" and both
        // outscore the rest of the vocabulary.
        let logits = logits_at(1, 1, 8, &[(0, 0, vec![0., 0., 0., 4.0, 0., 2.0, 0., 0.])]);
        let m = mask(&[&[1]]);

        let scores = candidate_probabilities(&logits, &m, &candidates).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].len(), 2);

        let (p_yes, p_no) = (scores[0][0], scores[0][1]);
        assert!(p_yes > p_no);
        assert!((p_yes + p_no - 1.0).abs() < 1e-6);

        // softmax over {4, 2} only; the other vocabulary entries must not
        // contribute any probability mass.
        let expected = (4f32 - 2f32).exp() / (1.0 + (4f32 - 2f32).exp());
        assert!((p_yes - expected).abs() < 1e-6);
        assert_eq!(argmax(&scores[0]), 0);
    }

    #[test]
    fn scores_come_from_each_rows_last_real_position() {
        let candidates = CandidateTokenSet::resolve(&["Yes", "No"], |t| match t {
            "Yes" => Some(0),
            "No" => Some(1),
            _ => None,
        })
        .unwrap();

        // Row 0 has 3 real tokens, row 1 has 1. Poison every position
        // other than the true last real one with a huge "No" logit, so a
        // wrong gather produces a wrong winner.
        let poison = vec![0f32, 50.0, 0., 0.];
        let logits = logits_at(
            2,
            3,
            4,
            &[
                (0, 0, poison.clone()),
                (0, 1, poison.clone()),
                (0, 2, vec![3.0, 1.0, 0., 0.]),
                (1, 0, vec![2.0, 4.0, 0., 0.]),
                (1, 1, poison.clone()),
                (1, 2, poison),
            ],
        );
        let m = mask(&[&[1, 1, 1], &[1, 0, 0]]);

        let scores = candidate_probabilities(&logits, &m, &candidates).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[0][0] > scores[0][1], "row 0 should favor Yes");
        assert!(scores[1][1] > scores[1][0], "row 1 should favor No");
        for row in &scores {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-6);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn candidate_order_defines_score_order() {
        let lookup = |t: &str| match t {
            "a" => Some(0u32),
            "b" => Some(1),
            _ => None,
        };
        let ab = CandidateTokenSet::resolve(&["a", "b"], lookup).unwrap();
        let ba = CandidateTokenSet::resolve(&["b", "a"], lookup).unwrap();

        let logits = logits_at(1, 1, 4, &[(0, 0, vec![1.0, 2.0, 0., 0.])]);
        let m = mask(&[&[1]]);

        let s_ab = candidate_probabilities(&logits, &m, &ab).unwrap();
        let s_ba = candidate_probabilities(&logits, &m, &ba).unwrap();
        assert!((s_ab[0][0] - s_ba[0][1]).abs() < 1e-6);
        assert!((s_ab[0][1] - s_ba[0][0]).abs() < 1e-6);
    }

    #[test]
    fn argmax_breaks_ties_toward_the_lowest_index() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.2, 0.6, 0.2]), 1);
        assert_eq!(argmax(&[0.1, 0.45, 0.45]), 1);
    }
}
