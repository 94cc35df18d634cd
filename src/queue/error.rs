//! Queue Error Types
//!
//! Queue data operations (push, pull, pause, resume, stop) are infallible by
//! contract. Errors only arise from channel-adapter lifecycle misuse and
//! from loading configuration.

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue '{queue}' has already been started")]
    AlreadyStarted { queue: String },

    #[error("Queue '{queue}' has been stopped and cannot be started")]
    Stopped { queue: String },

    #[error("Output receiver for queue '{queue}' has already been taken")]
    ReceiverTaken { queue: String },

    #[error("No tokio runtime available to start queue '{queue}'")]
    NoRuntime { queue: String },

    #[error("Invalid queue configuration: {message}")]
    Configuration { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
