//! Common imports for typical generation usage.
pub use crate::{
    ChatClient, EventSink, GenerationError, GenerationOptions, GenerationResult,
    GenerationService, HistoryMessage, Role, StreamEvent, StreamRelay,
};
