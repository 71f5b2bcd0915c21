use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("broker error: {0}")]
    Broker(#[from] lapin::Error),

    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("message not confirmed when publishing into queue {0}")]
    NotConfirmed(String),

    #[error("timed out publishing into queue {0}")]
    PublishTimeout(String),

    #[error("invalid delivery receipt: {0}")]
    InvalidReceipt(String),

    #[error("queue client is stopped")]
    Stopped,
}
