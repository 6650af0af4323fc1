mod channel;
mod event_types;

pub use channel::{RealtimeHub, DEFAULT_BUFFER_SIZE};
pub use event_types::*;
