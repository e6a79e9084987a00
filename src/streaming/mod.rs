pub mod chunks;
pub mod relay;
pub mod response;
pub mod sse;

pub use relay::{OutputSink, RelayOutcome, pump_fragments, relay_fragments};
pub use response::create_streaming_response;
pub use sse::{SseDecoder, SseEvent, fragment_stream};
