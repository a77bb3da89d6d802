use indexmap::IndexMap;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::classify::{status_tier, visual_tier, StatusTier, VisualTier};
use crate::i18n::Messages;
use crate::model::{MetricSet, MetricsInfo, Operator, PlotSet, QueryId, QueryMetrics};

pub const MAX_LABEL_CHARS: usize = 30;
const ELLIPSIS: &str = "...";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Precision,
    Recall,
    FMeasure,
    Accuracy,
}

impl MetricKey {
    /// Display order of cards, table columns and the metrics modal.
    pub const ALL: [MetricKey; 4] = [
        MetricKey::Precision,
        MetricKey::Recall,
        MetricKey::FMeasure,
        MetricKey::Accuracy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::FMeasure => "f_measure",
            Self::Accuracy => "accuracy",
        }
    }

    pub fn label(self, messages: &Messages) -> &'static str {
        match self {
            Self::Precision => messages.precision,
            Self::Recall => messages.recall,
            Self::FMeasure => messages.f_measure,
            Self::Accuracy => messages.accuracy,
        }
    }

    pub fn value_in(self, metrics: &MetricSet) -> f64 {
        match self {
            Self::Precision => metrics.precision,
            Self::Recall => metrics.recall,
            Self::FMeasure => metrics.f_measure,
            Self::Accuracy => metrics.accuracy,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    PrecisionRecall,
    MetricsComparison,
}

impl PlotKind {
    pub const ALL: [PlotKind; 2] = [PlotKind::PrecisionRecall, PlotKind::MetricsComparison];

    fn image_in(self, plots: &PlotSet) -> Option<&String> {
        match self {
            Self::PrecisionRecall => plots.precision_recall.as_ref(),
            Self::MetricsComparison => plots.metrics_comparison.as_ref(),
        }
    }

    fn title(self, messages: &Messages) -> &'static str {
        match self {
            Self::PrecisionRecall => messages.precision_recall_title,
            Self::MetricsComparison => messages.metrics_comparison_title,
        }
    }

    fn caption(self, messages: &Messages) -> &'static str {
        match self {
            Self::PrecisionRecall => messages.precision_recall_caption,
            Self::MetricsComparison => messages.metrics_comparison_caption,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricCard {
    pub key: MetricKey,
    pub label: String,
    pub value: String,
    pub tier: VisualTier,
    pub operator: Operator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlotPanel {
    pub kind: PlotKind,
    pub title: String,
    pub caption: String,
    pub image_base64: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricCell {
    pub key: MetricKey,
    pub value: String,
    pub tier: VisualTier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRow {
    pub label: String,
    /// Untruncated query id, shown on hover.
    pub title: String,
    pub cells: Vec<MetricCell>,
    pub stats: String,
    pub status: StatusTier,
    pub status_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detailed {
    Empty { notice: String },
    Table { rows: Vec<QueryRow> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub operator: Operator,
    pub cards: Vec<MetricCard>,
    pub plots: Vec<PlotPanel>,
    pub detailed: Detailed,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ViewModel {
    pub fn row_count(&self) -> usize {
        match &self.detailed {
            Detailed::Empty { .. } => 0,
            Detailed::Table { rows } => rows.len(),
        }
    }

    /// SHA-256 over the canonical JSON form; equal view models share a digest.
    pub fn digest(&self) -> serde_json::Result<String> {
        let data = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&data);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsInfoEntry {
    pub key: String,
    pub name: String,
    pub description: String,
    pub formula: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsInfoView {
    pub title: String,
    pub entries: Vec<MetricsInfoEntry>,
}

pub fn assemble(
    macro_metrics: &MetricSet,
    per_query: &IndexMap<QueryId, QueryMetrics>,
    plots: &PlotSet,
    operator: Operator,
    messages: &Messages,
) -> ViewModel {
    let cards = MetricKey::ALL
        .iter()
        .map(|&key| {
            let value = key.value_in(macro_metrics);
            MetricCard {
                key,
                label: key.label(messages).to_string(),
                value: format_metric(value),
                tier: visual_tier(value),
                operator,
            }
        })
        .collect();

    let plots = PlotKind::ALL
        .iter()
        .filter_map(|&kind| {
            kind.image_in(plots).map(|image| PlotPanel {
                kind,
                title: kind.title(messages).to_string(),
                caption: kind.caption(messages).to_string(),
                image_base64: image.clone(),
            })
        })
        .collect();

    let detailed = if per_query.is_empty() {
        Detailed::Empty {
            notice: messages.no_data.to_string(),
        }
    } else {
        Detailed::Table {
            rows: per_query
                .iter()
                .map(|(query_id, metrics)| query_row(query_id, metrics, messages))
                .collect(),
        }
    };

    ViewModel {
        operator,
        cards,
        plots,
        detailed,
        warning: None,
    }
}

fn query_row(query_id: &str, metrics: &QueryMetrics, messages: &Messages) -> QueryRow {
    let set = metrics.metric_set();
    let cells = MetricKey::ALL
        .iter()
        .map(|&key| {
            let value = key.value_in(&set);
            MetricCell {
                key,
                value: format_metric(value),
                tier: visual_tier(value),
            }
        })
        .collect();
    let status = status_tier(metrics.f_measure);

    QueryRow {
        label: truncate_label(query_id),
        title: query_id.to_string(),
        cells,
        stats: format!(
            "{}/{}/{}",
            metrics.true_positive, metrics.false_positive, metrics.false_negative
        ),
        status,
        status_label: status.label(messages).to_string(),
    }
}

pub fn truncate_label(query_id: &str) -> String {
    if query_id.chars().count() <= MAX_LABEL_CHARS {
        return query_id.to_string();
    }
    let mut label: String = query_id.chars().take(MAX_LABEL_CHARS).collect();
    label.push_str(ELLIPSIS);
    label
}

fn format_metric(value: f64) -> String {
    format!("{value:.3}")
}

/// Orders documentation entries like the cards; unknown keys follow in server order.
pub fn metrics_info_view(info: &MetricsInfo, messages: &Messages) -> MetricsInfoView {
    let known = MetricKey::ALL.map(MetricKey::as_str);

    let ordered = known
        .iter()
        .filter_map(|key| info.get_key_value(*key))
        .chain(info.iter().filter(|(key, _)| !known.contains(&key.as_str())));

    MetricsInfoView {
        title: messages.metrics_info_title.to_string(),
        entries: ordered
            .map(|(key, doc)| MetricsInfoEntry {
                key: key.clone(),
                name: doc.name.clone(),
                description: doc.description.clone(),
                formula: doc.formula.clone(),
            })
            .collect(),
    }
}
