//! Integration tests for the nested-set interval index

mod cli_contracts;
mod concurrent_writers;
mod interval_properties;
mod sled_store;
