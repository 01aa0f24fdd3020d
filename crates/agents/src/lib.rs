//! Generation-service seam and its Gemini implementation.

pub mod error;
pub mod model;
pub mod providers;

pub use {
    error::{Error, Result},
    model::{FileUpload, GenerateRequest, Generation, GenerationService, Usage},
};
