//! Identification pipeline and form projection services

pub mod care_notes;
pub mod image_gate;
pub mod normalizer;
pub mod recognition_client;

pub use care_notes::FormSeed;
pub use image_gate::CheckedImage;
pub use recognition_client::{IdentifyError, RecognitionClient};
