//! Prompt rendering for the agile classifier.

/// Renders the classification prompt for one input text:
/// `instructions:[label,label]<sep>Text:...<sep>Prediction:`.
///
/// Pure and deterministic. A separator occurring inside `text` is not
/// escaped; that is a known limitation, not a guarded invariant.
pub fn build_prompt(text: &str, labels: &[String], instructions: &str, separator: &str) -> String {
    let header = format!("{instructions}:[{}]", labels.join(","));
    [header, format!("Text:{text}"), "Prediction:".to_string()].join(separator)
}

/// Training variant: the gold label and the end-of-text token are appended
/// verbatim, with no delimiter after `Prediction:`.
pub fn build_training_example(
    text: &str,
    label: &str,
    labels: &[String],
    instructions: &str,
    separator: &str,
    end_of_text_token: &str,
) -> String {
    format!(
        "{}{label}{end_of_text_token}",
        build_prompt(text, labels, instructions, separator)
    )
}
