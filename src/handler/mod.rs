//! Request layer: one simulated inbound signup request per handler.

pub mod request_handler;

pub use request_handler::RequestHandler;
