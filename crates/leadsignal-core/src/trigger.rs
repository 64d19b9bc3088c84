//! Decision-trigger configuration: operator-defined threshold rules over ad-set metrics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Ad-set metrics a trigger can be written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Cpl,
    Frequency,
    Cpc,
    DaysWithoutLead,
    ConversionRate,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Cpl,
        Metric::Frequency,
        Metric::Cpc,
        Metric::DaysWithoutLead,
        Metric::ConversionRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cpl => "cpl",
            Metric::Frequency => "frequency",
            Metric::Cpc => "cpc",
            Metric::DaysWithoutLead => "days_without_lead",
            Metric::ConversionRate => "conversion_rate",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == raw)
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "metric",
                raw: raw.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "gt", alias = ">")]
    Gt,
    #[serde(rename = "gte", alias = ">=")]
    Gte,
    #[serde(rename = "lt", alias = "<")]
    Lt,
    #[serde(rename = "lte", alias = "<=")]
    Lte,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
        }
    }

    pub fn evaluate(&self, value: f64, threshold: f64) -> bool {
        match self {
            Operator::Gt => value > threshold,
            Operator::Gte => value >= threshold,
            Operator::Lt => value < threshold,
            Operator::Lte => value <= threshold,
        }
    }
}

impl FromStr for Operator {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "gt" | ">" => Ok(Operator::Gt),
            "gte" | ">=" => Ok(Operator::Gte),
            "lt" | "<" => Ok(Operator::Lt),
            "lte" | "<=" => Ok(Operator::Lte),
            other => Err(CoreError::UnknownVariant {
                kind: "operator",
                raw: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    #[default]
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            other => Err(CoreError::UnknownVariant {
                kind: "severity",
                raw: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTrigger {
    pub id: String,
    pub trigger_name: String,
    pub adset_pattern: String,
    pub market: Option<String>,
    pub metric: Metric,
    pub operator: Operator,
    pub threshold_value: Option<f64>,
    pub severity: Severity,
    pub evaluation_week: Option<u32>,
    pub is_active: bool,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl DecisionTrigger {
    /// A trigger without a week restriction applies every week.
    pub fn applies_in_week(&self, week: u32) -> bool {
        self.evaluation_week.is_none_or(|w| w == week)
    }

    pub fn matches_adset(&self, adset_name: &str) -> bool {
        if !pattern_matches(&self.adset_pattern, adset_name) {
            return false;
        }
        match self.market.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            None => true,
            Some(market) => adset_name
                .split('_')
                .any(|segment| segment.eq_ignore_ascii_case(market)),
        }
    }
}

/// Wildcard markers accepted in ad-set patterns.
const WILDCARDS: [char; 2] = ['%', '*'];

/// Exact match, or a glob match when the pattern contains `%` or `*`.
///
/// Each marker matches any run of characters, including an empty one, so
/// `retargeting_%`, `%_nl` and `%lookalike%` give prefix, suffix and
/// substring matches.
pub fn pattern_matches(pattern: &str, name: &str) -> bool {
    if !pattern.contains(WILDCARDS) {
        return pattern == name;
    }
    let parts: Vec<&str> = pattern.split(WILDCARDS).collect();
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return false,
    };
    let Some(mut remaining) = name.strip_prefix(first) else {
        return false;
    };
    let Some((last, middle)) = rest.split_last() else {
        return remaining.is_empty();
    };
    for part in middle {
        match remaining.find(part) {
            Some(idx) => remaining = &remaining[idx + part.len()..],
            None => return false,
        }
    }
    remaining.ends_with(last)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTriggerRequest {
    pub trigger_name: String,
    pub adset_pattern: String,
    pub market: Option<String>,
    pub metric: Metric,
    pub operator: Operator,
    pub threshold_value: Option<f64>,
    #[serde(default)]
    pub severity: Severity,
    pub evaluation_week: Option<u32>,
    pub is_active: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTriggerRequest {
    pub trigger_name: Option<String>,
    pub adset_pattern: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub market: Option<Option<String>>,
    pub metric: Option<Metric>,
    pub operator: Option<Operator>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub threshold_value: Option<Option<f64>>,
    pub severity: Option<Severity>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub evaluation_week: Option<Option<u32>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub description: Option<Option<String>>,
}

fn deserialize_optional_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}
