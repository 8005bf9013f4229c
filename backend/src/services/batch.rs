//! Per-record outcomes of a bulk status update

use serde::{Deserialize, Serialize};
use shared::Period;
use uuid::Uuid;

use crate::error::AppError;

/// Identity of a stock status row within a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockStatusKey {
    pub raw_material_id: Uuid,
}

/// Identity of a production status row within a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductionStatusKey {
    pub raw_material_id: Uuid,
    pub process_id: Uuid,
}

/// A record whose write failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedWrite<K> {
    pub key: K,
    pub code: String,
    pub message: String,
}

impl<K> FailedWrite<K> {
    pub fn new(key: K, error: &AppError) -> Self {
        Self {
            key,
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Result of writing a batch of records independently. Records listed in
/// `updated` are committed regardless of failures elsewhere in the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome<K, R> {
    pub period: Period,
    pub updated: Vec<R>,
    pub failed: Vec<FailedWrite<K>>,
}

impl<K, R> BatchOutcome<K, R> {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            updated: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
