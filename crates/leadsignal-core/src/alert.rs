use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::trigger::{Metric, Operator, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "open",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        }
    }
}

impl FromStr for AlertStatus {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "open" => Ok(AlertStatus::Open),
            "acknowledged" => Ok(AlertStatus::Acknowledged),
            "resolved" => Ok(AlertStatus::Resolved),
            other => Err(CoreError::UnknownVariant {
                kind: "alert status",
                raw: other.to_string(),
            }),
        }
    }
}

/// A persisted alert: one trigger firing for one ad set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAlert {
    pub id: String,
    pub trigger_id: String,
    pub trigger_name: String,
    pub adset_name: String,
    pub metric: Metric,
    pub operator: Operator,
    pub metric_value: f64,
    pub threshold_value: f64,
    pub severity: Severity,
    pub campaign_week: u32,
    pub message: String,
    pub status: AlertStatus,
    pub created_at: String,
    pub acknowledged_at: Option<String>,
    pub resolved_at: Option<String>,
}

/// An alert the evaluator wants to insert. Status is always `open`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAlert {
    pub trigger_id: String,
    pub trigger_name: String,
    pub adset_name: String,
    pub metric: Metric,
    pub operator: Operator,
    pub metric_value: f64,
    pub threshold_value: f64,
    pub severity: Severity,
    pub campaign_week: u32,
    pub message: String,
}

impl NewAlert {
    /// Key of the storage-level uniqueness constraint for open alerts.
    pub fn open_key(&self) -> String {
        open_key(&self.trigger_id, &self.adset_name)
    }
}

pub fn open_key(trigger_id: &str, adset_name: &str) -> String {
    format!("{trigger_id}:{adset_name}")
}

/// `(trigger_id, adset_name)` of an alert that is currently open.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpenAlertKey {
    pub trigger_id: String,
    pub adset_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTransition {
    Acknowledge,
    Resolve,
}

impl AlertTransition {
    pub fn target(&self) -> AlertStatus {
        match self {
            AlertTransition::Acknowledge => AlertStatus::Acknowledged,
            AlertTransition::Resolve => AlertStatus::Resolved,
        }
    }

    /// Acknowledging only applies to open alerts; resolving also closes
    /// acknowledged ones.
    pub fn allowed_from(&self, current: AlertStatus) -> bool {
        match self {
            AlertTransition::Acknowledge => current == AlertStatus::Open,
            AlertTransition::Resolve => current != AlertStatus::Resolved,
        }
    }
}
