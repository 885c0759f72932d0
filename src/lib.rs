//! scene-to-speech — capture a camera still, describe it through a
//! multimodal completion API, and speak the description aloud.
//!
//! The crate is organised around one orchestration core and four narrow
//! collaborator boundaries:
//!
//! ```text
//! GestureController ──▶ SessionOrchestrator
//!                          │  CaptureProvider.capture()      (camera still)
//!                          │  PromptBuilder.build()          (pure)
//!                          │  DescriptionClient.describe()   (remote call)
//!                          └─ NarrationProvider.speak()      (TTS playback)
//! ```
//!
//! A press-and-hold gesture additionally records a spoken prompt through
//! [`transcribe::TranscriptionProvider`], which is merged into the request.
//! Every stage reads the layered [`config::ConfigStore`]; nothing holds
//! hidden global state.

pub mod capture;
pub mod config;
pub mod describe;
pub mod eventlog;
pub mod gesture;
pub mod messages;
pub mod narrate;
pub mod prompt;
pub mod session;
pub mod transcribe;
