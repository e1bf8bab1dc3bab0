//! Property-based tests for plan construction and parsing
