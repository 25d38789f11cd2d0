//! Error types.
//!
//! `StorageError` covers failures reported by a `RecordStore`; `ApiError` is
//! what every public operation returns. Incomplete trees are not errors: the
//! maintainer reports them as a skipped placement instead.

use crate::types::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Interval shift out of range for node {0}")]
    IntervalOutOfRange(NodeId),
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Parent pointers form a cycle at node {0}")]
    Cycle(NodeId),

    #[error("Node {0} still has children; remove the subtree instead")]
    HasChildren(NodeId),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
