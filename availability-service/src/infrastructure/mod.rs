pub mod block;
pub mod booking;
pub mod cache;
pub mod recurring;
