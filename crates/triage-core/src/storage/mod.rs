pub mod schema;
pub mod store;

pub use store::{FlakyWindowRow, Store};
