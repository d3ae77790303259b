//! Output-path conventions for trained artifacts.

use crate::core::error::ClassifierError;

/// Suffix required of trained-adapter output paths.
pub const LORA_ADAPTER_SUFFIX: &str = ".lora.safetensors";

/// Checks an adapter output path before any work is done; a path without
/// the required suffix is a configuration error.
pub fn ensure_adapter_output_path(path: &str) -> Result<(), ClassifierError> {
    if path.ends_with(LORA_ADAPTER_SUFFIX) {
        Ok(())
    } else {
        Err(ClassifierError::OutputPath {
            path: path.to_string(),
            suffix: LORA_ADAPTER_SUFFIX,
        })
    }
}
