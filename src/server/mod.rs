pub mod rejection;
pub mod relay;
pub mod routes;

pub use rejection::handle_rejection;
pub use relay::RelayServer;
