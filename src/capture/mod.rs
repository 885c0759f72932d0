//! Still-image capture boundary.
//!
//! [`CaptureProvider`] is the narrow contract the orchestrator depends on:
//! probe readiness, grab one JPEG still. The production implementation is
//! [`CameraCapture`], which owns the exclusive camera stream on a dedicated
//! worker thread.

pub mod camera;

pub use camera::CameraCapture;

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors from the capture boundary.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// No active camera stream exists.
    #[error("Camera not initialized.")]
    SourceUnavailable,

    /// The device rejected enumeration, opening, or a frame grab.
    #[error("Camera access denied or not available: {0}")]
    Device(String),

    /// The grabbed frame could not be decoded or encoded to JPEG.
    #[error("failed to encode captured frame: {0}")]
    Encode(String),
}

// ---------------------------------------------------------------------------
// CaptureProvider
// ---------------------------------------------------------------------------

/// Object-safe boundary for acquiring a single still frame.
///
/// Implementations must be `Send + Sync` so they can sit behind an
/// `Arc<dyn CaptureProvider>` shared with the orchestrator.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Whether a live capture source is currently initialized. The
    /// orchestrator checks this before starting any cycle side effects.
    fn is_ready(&self) -> bool;

    /// Grab one still frame as JPEG bytes.
    ///
    /// Fails with [`CaptureError::SourceUnavailable`] when no stream is
    /// active.
    async fn capture(&self) -> Result<Vec<u8>, CaptureError>;
}
