mod common;

use common::FakeCausalLm;
use llm_classifiers::core::ClassifierError;
use llm_classifiers::models::{CausalLm, TrainingConfig};
use llm_classifiers::pipelines::agile_classifier::{
    AgileClassifierBuilder, DEFAULT_END_OF_TEXT_TOKEN, DEFAULT_INSTRUCTIONS,
    DEFAULT_SEPARATOR_TOKEN,
};

const VOCAB: &[(&str, u32)] = &[("positive", 0), ("negative", 1)];
const VOCAB_SIZE: usize = 4;

fn prompt_for(text: &str) -> String {
    format!(
        "{DEFAULT_INSTRUCTIONS}:[positive,negative]{DEFAULT_SEPARATOR_TOKEN}Text:{text}{DEFAULT_SEPARATOR_TOKEN}Prediction:"
    )
}

#[test]
fn score_returns_one_distribution_per_text_in_order() -> anyhow::Result<()> {
    let model = FakeCausalLm::new(VOCAB, VOCAB_SIZE)
        .with_logits(&prompt_for("great product"), vec![3.0, 1.0, 0.0, 0.0])
        .with_logits(&prompt_for("total garbage"), vec![1.0, 4.0, 0.0, 0.0]);
    let classifier = AgileClassifierBuilder::new(&["positive", "negative"]).build(model)?;

    let scores = classifier.score(&[
        "great product".to_string(),
        "total garbage".to_string(),
    ])?;

    assert_eq!(scores.len(), 2);
    for row in &scores {
        assert_eq!(row.len(), 2);
        let sum: f32 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }
    assert!(scores[0][0] > scores[0][1], "first text should score positive");
    assert!(scores[1][1] > scores[1][0], "second text should score negative");
    Ok(())
}

#[test]
fn predict_breaks_exact_ties_toward_the_first_label() -> anyhow::Result<()> {
    let model = FakeCausalLm::new(VOCAB, VOCAB_SIZE)
        .with_logits(&prompt_for("ambivalent"), vec![2.0, 2.0, 0.0, 0.0])
        .with_logits(&prompt_for("clearly bad"), vec![0.0, 5.0, 0.0, 0.0]);
    let classifier = AgileClassifierBuilder::new(&["positive", "negative"]).build(model)?;

    let predictions =
        classifier.predict(&["ambivalent".to_string(), "clearly bad".to_string()])?;
    assert_eq!(predictions, vec!["positive", "negative"]);
    Ok(())
}

#[test]
fn score_batches_are_chunked_but_output_order_is_preserved() -> anyhow::Result<()> {
    let model = FakeCausalLm::new(VOCAB, VOCAB_SIZE)
        .with_logits(&prompt_for("a"), vec![5.0, 0.0, 0.0, 0.0])
        .with_logits(&prompt_for("b"), vec![0.0, 5.0, 0.0, 0.0])
        .with_logits(&prompt_for("c"), vec![5.0, 0.0, 0.0, 0.0]);
    let classifier = AgileClassifierBuilder::new(&["positive", "negative"])
        .score_batch_size(2)
        .build(model)?;

    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let predictions = classifier.predict(&texts)?;
    assert_eq!(predictions, vec!["positive", "negative", "positive"]);

    // The trailing chunk of one is the last batch the model saw.
    assert_eq!(classifier.model().last_batch(), vec![prompt_for("c")]);
    Ok(())
}

#[test]
fn fit_owns_the_training_example_encoding() -> anyhow::Result<()> {
    let model = FakeCausalLm::new(VOCAB, VOCAB_SIZE);
    let mut classifier = AgileClassifierBuilder::new(&["positive", "negative"]).build(model)?;

    let texts = vec!["great product".to_string(), "total garbage".to_string()];
    let labels = vec!["positive".to_string(), "negative".to_string()];
    let config = TrainingConfig {
        epochs: 2,
        batch_size: 1,
    };
    let history = classifier.fit(&texts, &labels, &config)?;
    assert_eq!(history.epoch_losses.len(), 2);

    let fit_calls = &classifier.model().fit_calls;
    assert_eq!(fit_calls.len(), 1);
    let (examples, passed_config) = &fit_calls[0];
    assert_eq!(passed_config.epochs, 2);
    assert_eq!(
        examples,
        &vec![
            format!(
                "{}positive{DEFAULT_END_OF_TEXT_TOKEN}",
                prompt_for("great product")
            ),
            format!(
                "{}negative{DEFAULT_END_OF_TEXT_TOKEN}",
                prompt_for("total garbage")
            ),
        ]
    );
    Ok(())
}

#[test]
fn adapter_weights_are_persisted_through_the_model_after_fit() -> anyhow::Result<()> {
    let model = FakeCausalLm::new(VOCAB, VOCAB_SIZE);
    let mut classifier = AgileClassifierBuilder::new(&["positive", "negative"]).build(model)?;

    classifier.fit(
        &["great product".to_string()],
        &["positive".to_string()],
        &TrainingConfig::default(),
    )?;
    let output = std::path::Path::new("out.lora.safetensors");
    classifier.model().save_adapter(output)?;

    assert_eq!(classifier.model().saved_adapters(), vec![output.to_path_buf()]);
    Ok(())
}

#[test]
fn fit_rejects_mismatched_text_and_label_counts() -> anyhow::Result<()> {
    let model = FakeCausalLm::new(VOCAB, VOCAB_SIZE);
    let mut classifier = AgileClassifierBuilder::new(&["positive", "negative"]).build(model)?;

    let err = classifier
        .fit(
            &["one".to_string(), "two".to_string()],
            &["positive".to_string()],
            &TrainingConfig::default(),
        )
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ClassifierError>(),
        Some(ClassifierError::LengthMismatch {
            texts: 2,
            labels: 1
        })
    ));

    // Nothing reached the model.
    assert!(classifier.model().fit_calls.is_empty());
    Ok(())
}

#[test]
fn building_with_a_label_outside_the_vocabulary_fails() {
    let model = FakeCausalLm::new(VOCAB, VOCAB_SIZE);
    let err = AgileClassifierBuilder::new(&["positive", "mixed"])
        .build(model)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ClassifierError>(),
        Some(ClassifierError::UnknownToken { token }) if token.as_str() == "mixed"
    ));
}

#[test]
fn scoring_no_texts_yields_no_scores() -> anyhow::Result<()> {
    let model = FakeCausalLm::new(VOCAB, VOCAB_SIZE);
    let classifier = AgileClassifierBuilder::new(&["positive", "negative"]).build(model)?;
    assert!(classifier.score(&[])?.is_empty());
    Ok(())
}
