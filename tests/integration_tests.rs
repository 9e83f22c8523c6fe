//! Integration tests entry point.
//!
//! Pulls in the scenarios under `tests/integration/` so they run as one
//! test binary.

mod integration;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integration_tests_module_loads() {
        integration::init_test_env();
    }
}
