use std::collections::BTreeMap;

use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type QueryId = String;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    #[default]
    And,
    Or,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Parses the operator label a server echoes back, ignoring case.
    pub fn from_reported(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationRequest {
    pub qrels_file: String,
    pub operator: Operator,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub precision: f64,
    pub recall: f64,
    pub f_measure: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f_measure: f64,
    pub accuracy: f64,
    pub true_positive: u64,
    pub false_positive: u64,
    pub false_negative: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_negative: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_docs: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relevant_docs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retrieved_docs: Vec<String>,
}

impl QueryMetrics {
    pub fn metric_set(&self) -> MetricSet {
        MetricSet {
            precision: self.precision,
            recall: self.recall,
            f_measure: self.f_measure,
            accuracy: self.accuracy,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    #[serde(rename = "macro")]
    pub macro_metrics: MetricSet,
    #[serde(default)]
    pub per_query: IndexMap<QueryId, QueryMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_queries: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_count: Option<usize>,
    /// Engine-side warning, e.g. when no qrels could be loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision_recall: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_comparison: Option<String>,
}

/// Body of `POST /api/evaluate` exactly as the server sends it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluateResponseBody {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<EvaluationMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plots: Option<PlotSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qrels_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSuccess {
    pub metrics: EvaluationMetrics,
    pub plots: PlotSet,
    pub operator: Option<String>,
    pub qrels_file: Option<String>,
    pub documents_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationResponse {
    Success(Box<EvaluationSuccess>),
    Failure {
        message: String,
        details: Option<String>,
    },
}

impl EvaluationSuccess {
    /// Operator the server says it evaluated with. The top-level field wins
    /// over the copy nested in `metrics`; unknown labels are ignored.
    pub fn reported_operator(&self) -> Option<Operator> {
        [self.operator.as_deref(), self.metrics.operator.as_deref()]
            .into_iter()
            .flatten()
            .find_map(Operator::from_reported)
    }
}

impl EvaluationResponse {
    /// Returns `None` when the body claims success but carries no metrics.
    pub fn from_body(body: EvaluateResponseBody) -> Option<Self> {
        if !body.success {
            return Some(Self::Failure {
                message: body.error.unwrap_or_default(),
                details: body.details,
            });
        }

        let metrics = body.metrics?;
        Some(Self::Success(Box::new(EvaluationSuccess {
            metrics,
            plots: body.plots.unwrap_or_default(),
            operator: body.operator,
            qrels_file: body.qrels_file,
            documents_count: body.documents_count,
        })))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDoc {
    pub name: String,
    pub description: String,
    pub formula: String,
}

pub type MetricsInfo = IndexMap<String, MetricDoc>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub documents_count: usize,
    #[serde(default)]
    pub file_types: BTreeMap<String, usize>,
    #[serde(default)]
    pub indexed_terms: usize,
    #[serde(default)]
    pub current_folder: String,
    #[serde(default)]
    pub search_type: String,
    #[serde(default)]
    pub qrels_exists: bool,
    #[serde(default)]
    pub qrels_size: u64,
    #[serde(default)]
    pub evaluation_ready: bool,
}
