use clap::ValueEnum;
use serde::Serialize;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
        }
    }

    pub fn messages(self) -> &'static Messages {
        match self {
            Self::En => &EN,
            Self::Ru => &RU,
        }
    }
}

/// User-facing strings for one locale.
#[derive(Debug)]
pub struct Messages {
    pub report_title: &'static str,
    pub macro_heading: &'static str,
    pub plots_heading: &'static str,
    pub detailed_heading: &'static str,
    pub operator_label: &'static str,

    pub precision: &'static str,
    pub recall: &'static str,
    pub f_measure: &'static str,
    pub accuracy: &'static str,

    pub precision_recall_title: &'static str,
    pub precision_recall_caption: &'static str,
    pub metrics_comparison_title: &'static str,
    pub metrics_comparison_caption: &'static str,

    pub column_query: &'static str,
    pub column_stats: &'static str,
    pub column_status: &'static str,
    pub no_data: &'static str,

    pub status_excellent: &'static str,
    pub status_good: &'static str,
    pub status_fair: &'static str,
    pub status_poor: &'static str,

    pub tier_high: &'static str,
    pub tier_medium: &'static str,
    pub tier_low: &'static str,

    pub loading: &'static str,
    pub transport_error: &'static str,
    pub unknown_server_error: &'static str,
    pub metrics_info_error: &'static str,
    pub metrics_info_title: &'static str,
    pub formula_label: &'static str,
    pub generated_at: &'static str,
}

static EN: Messages = Messages {
    report_title: "Retrieval quality evaluation",
    macro_heading: "Macro-averaged metrics",
    plots_heading: "Plots",
    detailed_heading: "Per-query results",
    operator_label: "Operator",

    precision: "Precision",
    recall: "Recall",
    f_measure: "F-measure",
    accuracy: "Accuracy",

    precision_recall_title: "Precision-Recall by query",
    precision_recall_caption: "Each point is one query: recall on the X axis, precision on the Y axis.",
    metrics_comparison_title: "Metric comparison",
    metrics_comparison_caption: "Macro-averaged precision, recall, F-measure and accuracy side by side.",

    column_query: "Query",
    column_stats: "TP/FP/FN",
    column_status: "Status",
    no_data: "No per-query data to display.",

    status_excellent: "Excellent",
    status_good: "Good",
    status_fair: "Fair",
    status_poor: "Poor",

    tier_high: "High",
    tier_medium: "Medium",
    tier_low: "Low",

    loading: "Running evaluation...",
    transport_error: "Could not reach the evaluation server. Check the connection and try again.",
    unknown_server_error: "The evaluation server reported an unknown error.",
    metrics_info_error: "Failed to load metric details.",
    metrics_info_title: "About the metrics",
    formula_label: "Formula",
    generated_at: "Generated at",
};

static RU: Messages = Messages {
    report_title: "Оценка качества поиска",
    macro_heading: "Метрики (макроусреднение)",
    plots_heading: "Графики",
    detailed_heading: "Результаты по запросам",
    operator_label: "Оператор",

    precision: "Точность",
    recall: "Полнота",
    f_measure: "F-мера",
    accuracy: "Аккуратность",

    precision_recall_title: "Precision-Recall по запросам",
    precision_recall_caption: "Каждая точка соответствует запросу: по оси X полнота, по оси Y точность.",
    metrics_comparison_title: "Сравнение метрик",
    metrics_comparison_caption: "Макроусреднённые точность, полнота, F-мера и аккуратность.",

    column_query: "Запрос",
    column_stats: "TP/FP/FN",
    column_status: "Статус",
    no_data: "Нет данных по запросам.",

    status_excellent: "Отлично",
    status_good: "Хорошо",
    status_fair: "Удовлетворительно",
    status_poor: "Плохо",

    tier_high: "Высокое",
    tier_medium: "Среднее",
    tier_low: "Низкое",

    loading: "Выполняется оценка...",
    transport_error: "Не удалось связаться с сервером оценки. Проверьте соединение и повторите попытку.",
    unknown_server_error: "Сервер оценки вернул неизвестную ошибку.",
    metrics_info_error: "Не удалось загрузить описание метрик.",
    metrics_info_title: "О метриках",
    formula_label: "Формула",
    generated_at: "Сформировано",
};
