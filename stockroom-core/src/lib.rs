pub mod backfill;
pub mod cells;
pub mod discount;
pub mod errors;
pub mod filters;
pub mod index;
pub mod lifecycle;
pub mod models;
pub mod pricing;
pub mod reconcile;
pub mod stats;

pub use backfill::*;
pub use cells::*;
pub use discount::*;
pub use errors::*;
pub use filters::*;
pub use index::*;
pub use lifecycle::*;
pub use models::*;
pub use pricing::*;
pub use reconcile::*;
pub use stats::*;
