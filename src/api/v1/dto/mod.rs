pub mod test_results;
