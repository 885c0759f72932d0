//! Remote image-description boundary.
//!
//! [`DescriptionClient`] takes one JPEG still and a prompt and returns
//! descriptive text. The production implementation is
//! [`OpenAiVisionClient`], a single-POST client for OpenAI-compatible
//! multimodal completion endpoints.

pub mod openai;

pub use openai::{OpenAiVisionClient, VisionClientSettings};

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DescribeError
// ---------------------------------------------------------------------------

/// Errors from the description boundary.
///
/// All variants carry the user-facing message in their `Display` output so
/// the orchestrator can report them without knowing the internal cause.
#[derive(Debug, Clone, Error)]
pub enum DescribeError {
    /// No credential is configured (or the endpoint rejected it).
    #[error("API Key missing. Please add your OpenAI API key.")]
    Auth,

    /// Transport failure, non-success HTTP status, or an unreadable
    /// response body. Carries the message extracted from a structured error
    /// body when one was present.
    #[error("{0}")]
    Remote(String),

    /// Success status but no usable result in the body.
    #[error("No description received from the image service.")]
    EmptyResult,
}

// ---------------------------------------------------------------------------
// DescriptionClient
// ---------------------------------------------------------------------------

/// Object-safe boundary for the remote describe call.
///
/// The request is made exactly once per cycle — no retry, and deliberately
/// no timeout (an unresponsive endpoint stalls the cycle, matching the
/// behaviour this tool is modelled on; a bounded timeout is the documented
/// improvement candidate).
#[async_trait]
pub trait DescriptionClient: Send + Sync {
    /// Describe `image_jpeg` according to `prompt`, returning the trimmed
    /// descriptive text.
    async fn describe(&self, image_jpeg: &[u8], prompt: &str) -> Result<String, DescribeError>;
}
