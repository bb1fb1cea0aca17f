mod types;
mod client;
mod time;

pub use types::*;
pub use client::ClockifyClient;
