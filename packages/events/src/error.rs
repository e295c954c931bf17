use thiserror::Error;
use twig_vdom::EventKind;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("unknown event kind '{0}'")]
    UnknownEventKind(String),

    #[error("event kind '{0}' is not enabled for this registry")]
    UnsupportedEventKind(EventKind),

    #[error("invalid registry config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type EventResult<T> = Result<T, EventError>;
