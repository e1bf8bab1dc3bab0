//! Integration tests for the Quill writing loop

mod config_integration;
mod model_providers;
mod test_utils;
mod writing_loop;
