pub mod client;
mod dtos;
pub(crate) mod errors;
pub mod health;
pub mod transport;
