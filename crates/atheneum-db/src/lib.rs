//! Atheneum content-store crate.
//!
//! Defines the [`ContentStore`] trait and its two implementations: the
//! relational [`PgStore`] and the in-process [`MemoryStore`]. Which one backs
//! a deployment is decided once at startup from configuration.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::ContentStore;
