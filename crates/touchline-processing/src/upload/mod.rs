//! Batch intake: validation, routing and upload-progress simulation

pub mod observer;
pub mod orchestrator;
pub mod progress;
pub mod state;

pub use observer::{FileRejection, NoOpObserver, UploadObserver};
pub use orchestrator::UploadQueueOrchestrator;
pub use progress::{UploadProgressTracker, DEFAULT_UPLOAD_TICK};
pub use state::{FileState, FileStateMachine};
