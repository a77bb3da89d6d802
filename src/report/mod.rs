mod assemble;
mod render;

pub use assemble::{assemble, metrics_info_view, Detailed, MetricsInfoView, ViewModel};
pub use render::{render, render_metrics_info_text, OutputFormat};
