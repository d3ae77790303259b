pub mod error;
pub mod output;
pub mod record;

pub use error::ClassifierError;
pub use output::{ensure_adapter_output_path, LORA_ADAPTER_SUFFIX};
pub use record::{read_json_records, TextRecord, TrainingRecord};
