pub mod client;
pub mod mapper;
pub mod nonce;
pub mod signature;
pub mod types;

pub use client::KrakenClient;
pub use mapper::translate_pair;
pub use signature::sign_request;
