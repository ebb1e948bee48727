pub mod client;
pub mod keys;
