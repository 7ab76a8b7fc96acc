pub mod client;
pub mod collection;

pub use client::{ClientError, TodoClient, DEFAULT_SERVER};
pub use collection::{SyncStrategy, TodoCollection};
