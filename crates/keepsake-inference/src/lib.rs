//! # keepsake-inference
//!
//! Generative text client for keepsake. Wraps the Gemini HTTP API with
//! a primary flash model, a pro-model fallback for quota errors, and
//! parsing for the labeled-line output format the prompts demand.

pub mod gemini;
pub mod parse;

pub use gemini::{GeminiBackend, DEFAULT_FLASH_MODEL, DEFAULT_PRO_MODEL};
pub use parse::{parse_generated_details, GeneratedDetails, DEFAULT_DESCRIPTION, DEFAULT_TITLE};
