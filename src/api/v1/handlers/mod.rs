pub mod health;
pub mod test_results;
