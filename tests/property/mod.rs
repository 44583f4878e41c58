//! Property-based tests for the pure helpers
