pub mod custom_search;

pub use custom_search::CustomSearchClient;
