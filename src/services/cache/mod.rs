pub mod client;
pub mod listing;
pub mod valkey;

#[cfg(test)]
pub mod memory;

pub use client::CacheClient;
pub use listing::ListingCache;
pub use valkey::ValkeyClient;
