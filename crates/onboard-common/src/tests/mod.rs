#[cfg(test)]
mod populate_tests;
