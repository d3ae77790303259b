use thiserror::Error;

/// Error type shared by the classifier pipelines and the CLI front-ends.
///
/// Every variant is fatal for the current run: there is no retry and no
/// partial-success mode. External model failures (forward pass, download)
/// are not represented here; those propagate as-is.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// A candidate label/token has no id in the model vocabulary.
    #[error("token {token:?} is not present in the model vocabulary")]
    UnknownToken { token: String },

    /// A stdin line was not valid JSON of the expected shape.
    #[error("failed to parse input line: {line}\nexpected format: {expected}")]
    MalformedRecord { line: String, expected: &'static str },

    /// A padding-mask row marked every position as padding.
    #[error("padding mask row {row} contains no real tokens")]
    AllPaddingRow { row: usize },

    /// `sum(mask) - 1` does not land on the last real token of the row,
    /// i.e. the batch was not right-padded.
    #[error("padding mask row {row} is not right-padded; cannot locate the last real token")]
    PaddingConvention { row: usize },

    /// `fit` was called with differing numbers of texts and labels.
    #[error("got {texts} training texts but {labels} labels")]
    LengthMismatch { texts: usize, labels: usize },

    /// The trained-adapter output path is missing the required suffix.
    #[error("the model output path {path:?} should end with {suffix:?}")]
    OutputPath { path: String, suffix: &'static str },

    /// The loaded backend cannot update its weights.
    #[error("{backend} is inference-only and does not support fine-tuning")]
    InferenceOnly { backend: &'static str },
}
