pub mod search_results;
