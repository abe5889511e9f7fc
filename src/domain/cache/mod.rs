//! Cache domain - exact-match response store keyed by identity token

mod entry;
mod store;

pub use entry::CacheEntry;
pub use store::CacheStore;

#[cfg(test)]
pub use store::MockCacheStore;
