use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_QRELS_FILE, DEFAULT_SERVER_URL};
use crate::i18n::Locale;
use crate::model::Operator;
use crate::report::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "irdash",
    version,
    about = "Retrieval-quality evaluation dashboard client"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Evaluate(EvaluateArgs),
    MetricsInfo(MetricsInfoArgs),
    Render(RenderArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[arg(long, value_enum, default_value_t = Locale::En)]
    pub locale: Locale,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub report: ReportArgs,

    #[arg(long, default_value = DEFAULT_QRELS_FILE)]
    pub qrels_file: String,

    #[arg(long, value_enum, default_value_t = Operator::And)]
    pub operator: Operator,

    #[arg(long, default_value_t = false)]
    pub with_metrics_info: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MetricsInfoArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    #[arg(long, value_enum, default_value_t = Locale::En)]
    pub locale: Locale,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    /// Saved body of a `POST /api/evaluate` response.
    #[arg(long)]
    pub response: PathBuf,

    /// Saved body of a `GET /api/metrics/details` response.
    #[arg(long)]
    pub metrics_info: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Operator::And)]
    pub operator: Operator,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub server: ServerArgs,
}
