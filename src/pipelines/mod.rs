pub mod agile_classifier;
pub mod shield_gemma;
pub mod token_probability;
