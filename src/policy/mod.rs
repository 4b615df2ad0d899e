/// Decisions made on top of embed telemetry

pub mod completion;
pub mod early_stop;

pub use completion::{CompletionDetector, CompletionLatch, CompletionReason};
pub use early_stop::EarlyStopPolicy;
