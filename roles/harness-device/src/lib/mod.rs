//! Device side of the masked AEAD evaluation harness.
//!
//! The device receives frames from the host (a 4 byte header naming a field, an operation and a
//! payload length, then the payload), stores them and, when asked, runs the cipher engine
//! `repeat_count` times under a trigger pulse while evolving its shadow generator state and
//! re-masking the key between runs.
pub mod buffers;
pub mod config;
pub mod error;
pub mod link;
pub mod orchestrator;
pub mod session;
pub mod signals;

pub use config::DeviceConfig;
pub use error::{DeviceError, DeviceResult};
pub use orchestrator::{Orchestrator, Response, RunParameters};
pub use session::Session;
