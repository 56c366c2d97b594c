pub mod search_result;

pub use search_result::{NewSearchResult, ResultValidationError, SearchResult};
