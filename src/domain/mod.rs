pub mod catalog;
pub mod models;

pub use models::{Dialect, FilterSet, NormalizedRecord, ResultPage, SortMode};
