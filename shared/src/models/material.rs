//! Raw material and process models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A raw material tracked in stock. Read-only for reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawMaterial {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    /// Unit of measure (e.g., "kg")
    pub unit: String,
    pub current_stock: Decimal,
    /// Minimum stock threshold, copied into status rows as `min_level`
    pub min_stock: Decimal,
}

impl RawMaterial {
    /// Case-insensitive match on name or category
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query) || self.category.to_lowercase().contains(&query)
    }
}

/// A production process materials are assigned to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Process {
    pub id: Uuid,
    pub name: String,
    pub process_type: ProcessType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessType {
    PreProduction,
    Production,
}

impl ProcessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessType::PreProduction => "pre-production",
            ProcessType::Production => "production",
        }
    }
}

impl std::str::FromStr for ProcessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre-production" => Ok(ProcessType::PreProduction),
            "production" => Ok(ProcessType::Production),
            other => Err(format!("unknown process type: {}", other)),
        }
    }
}

impl std::fmt::Display for ProcessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessType::PreProduction => write!(f, "Pre-production"),
            ProcessType::Production => write!(f, "Production"),
        }
    }
}
