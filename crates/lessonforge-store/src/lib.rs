//! Seeding of content bundles into a database.
//!
//! Records are matched by natural key (course slug, module slug within its
//! course, quiz title, lesson slug, exercise order within its lesson, question
//! text within its quiz) so that applying a bundle is idempotent.

pub mod errors;
pub mod memory;
pub mod migrations;
pub mod model;
pub mod postgres;
pub mod row;
pub mod seed;
pub mod store;

pub use errors::{Result, StoreError};
pub use memory::MemoryStore;
pub use model::{Outcome, OutcomeCounts, SeedMode, SeedReport};
pub use postgres::{PostgresStore, connect};
pub use row::{RowSpec, SqlValue};
pub use seed::seed_bundle;
pub use store::ContentStore;
