//! AI Integration Module
//!
//! Turns a UI screenshot into a draft list of requirement items using a
//! hosted vision-language model.

pub mod analyzer;
pub mod background;
pub mod client;
pub mod prompts;
pub mod responses;

pub use analyzer::Analyzer;
pub use background::AnalysisJob;
pub use client::{AiError, GeminiClient, MockVisionClient, VisionClient, VisionRequest};
pub use responses::RawRequirement;
