pub mod client;
pub mod response;

pub use client::CancellableRequest;
pub use response::{json_response, text_response};
