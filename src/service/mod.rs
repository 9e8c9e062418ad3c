pub mod executor;
pub mod http;
pub mod query;
pub mod schema;
pub mod search;

pub use executor::{RawRow, SearchExecutor};
pub use schema::{FieldCatalog, SchemaResolver};
pub use search::SearchService;
