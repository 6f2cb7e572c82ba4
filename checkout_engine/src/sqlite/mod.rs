//! SQLite backend for the checkout engine.
//!
//! [`SqliteDatabase`] implements every backend trait in [`crate::traits`]. The functions in [`db`] do the actual SQL
//! work and can be composed inside a transaction when a caller needs several of them to be atomic.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
