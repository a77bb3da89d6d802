use std::io::Write;

use anyhow::{Context, Result};
use clap::ValueEnum;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use serde::Serialize;

use super::assemble::{Detailed, MetricKey, MetricsInfoView, ViewModel};
use crate::i18n::Messages;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Html,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: &'a str,
    report: &'a ViewModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_info: Option<&'a MetricsInfoView>,
}

const STYLE: &str = r#"
body{font-family:-apple-system,'Segoe UI',sans-serif;margin:2rem;color:#222}
.cards{display:flex;gap:1rem;flex-wrap:wrap}
.card{border:1px solid #ddd;border-radius:6px;padding:1rem;min-width:10rem}
.card .value{font-size:1.8rem;font-weight:600}
.card .operator{font-size:.8rem;color:#666}
.metric-high{color:#1e8449}.metric-medium{color:#b9770e}.metric-low{color:#c0392b}
.plot img{max-width:100%}
.plot .caption{color:#555;font-size:.9rem}
table{border-collapse:collapse;width:100%}
th,td{border-bottom:1px solid #eee;padding:.4rem .6rem;text-align:left}
.status-excellent{background:#d5f5e3}.status-good{background:#eafaf1}
.status-fair{background:#fef5e7}.status-poor{background:#fdedec}
.warning{background:#fef9e7;border:1px solid #f7dc6f;padding:.6rem}
.no-data{color:#777;font-style:italic}
.modal{border-top:2px solid #ddd;margin-top:2rem}
.modal .formula{font-family:monospace}
footer{margin-top:2rem;color:#888;font-size:.8rem}
"#;

pub fn render<W: Write>(
    output: &mut W,
    format: OutputFormat,
    view: &ViewModel,
    metrics_info: Option<&MetricsInfoView>,
    messages: &Messages,
    generated_at: &str,
) -> Result<()> {
    match format {
        OutputFormat::Text => write_text_report(output, view, metrics_info, messages)?,
        OutputFormat::Html => {
            let page = html_report(view, metrics_info, messages, generated_at);
            output
                .write_all(page.into_string().as_bytes())
                .context("failed to write html report")?;
            writeln!(output)?;
        }
        OutputFormat::Json => {
            let report = JsonReport {
                generated_at,
                report: view,
                metrics_info,
            };
            serde_json::to_writer_pretty(&mut *output, &report)
                .context("failed to serialize json report")?;
            writeln!(output)?;
        }
    }

    output.flush()?;
    Ok(())
}

fn write_text_report<W: Write>(
    output: &mut W,
    view: &ViewModel,
    metrics_info: Option<&MetricsInfoView>,
    messages: &Messages,
) -> Result<()> {
    writeln!(output, "{}", messages.report_title)?;
    writeln!(output, "{}: {}", messages.operator_label, view.operator)?;
    if let Some(warning) = &view.warning {
        writeln!(output, "! {warning}")?;
    }

    writeln!(output)?;
    writeln!(output, "{}", messages.macro_heading)?;
    for card in &view.cards {
        writeln!(
            output,
            "\t{:<12} {}\t[{}]",
            card.label,
            card.value,
            card.tier.label(messages)
        )?;
    }

    if !view.plots.is_empty() {
        writeln!(output)?;
        writeln!(output, "{}", messages.plots_heading)?;
        for panel in &view.plots {
            writeln!(
                output,
                "\t{}: {} ({} bytes base64)",
                panel.title,
                panel.caption,
                panel.image_base64.len()
            )?;
        }
    }

    writeln!(output)?;
    writeln!(output, "{}", messages.detailed_heading)?;
    match &view.detailed {
        Detailed::Empty { notice } => writeln!(output, "\t{notice}")?,
        Detailed::Table { rows } => {
            let metric_headers: Vec<&str> = MetricKey::ALL
                .iter()
                .map(|key| key.label(messages))
                .collect();
            writeln!(
                output,
                "\t{}\t{}\t{}\t{}",
                messages.column_query,
                metric_headers.join("\t"),
                messages.column_stats,
                messages.column_status
            )?;
            for row in rows {
                let cells: Vec<&str> = row.cells.iter().map(|cell| cell.value.as_str()).collect();
                writeln!(
                    output,
                    "\t{}\t{}\t{}\t{}",
                    row.label,
                    cells.join("\t"),
                    row.stats,
                    row.status_label
                )?;
            }
        }
    }

    if let Some(info) = metrics_info {
        writeln!(output)?;
        render_metrics_info_text(output, info, messages)?;
    }

    Ok(())
}

pub fn render_metrics_info_text<W: Write>(
    output: &mut W,
    info: &MetricsInfoView,
    messages: &Messages,
) -> Result<()> {
    writeln!(output, "{}", info.title)?;
    for entry in &info.entries {
        writeln!(output, "\t{} ({})", entry.name, entry.key)?;
        writeln!(output, "\t  {}", entry.description)?;
        writeln!(output, "\t  {}: {}", messages.formula_label, entry.formula)?;
    }
    Ok(())
}

fn html_report(
    view: &ViewModel,
    metrics_info: Option<&MetricsInfoView>,
    messages: &Messages,
    generated_at: &str,
) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (messages.report_title) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                h1 { (messages.report_title) }
                @if let Some(warning) = &view.warning {
                    div class="warning" { (warning) }
                }

                section id="macro-metrics" {
                    h2 { (messages.macro_heading) }
                    div class="cards" {
                        @for card in &view.cards {
                            div class={ "card " (card.tier.css_class()) } data-metric=(card.key.as_str()) {
                                div class="label" { (card.label) }
                                div class="value" { (card.value) }
                                div class="operator" { (messages.operator_label) ": " (card.operator.as_str()) }
                            }
                        }
                    }
                }

                @if !view.plots.is_empty() {
                    section id="plots" {
                        h2 { (messages.plots_heading) }
                        @for panel in &view.plots {
                            figure class="plot" {
                                figcaption { h3 { (panel.title) } }
                                img src={ "data:image/png;base64," (panel.image_base64) } alt=(panel.title);
                                p class="caption" { (panel.caption) }
                            }
                        }
                    }
                }

                section id="detailed" {
                    h2 { (messages.detailed_heading) }
                    @match &view.detailed {
                        Detailed::Empty { notice } => {
                            p class="no-data" { (notice) }
                        }
                        Detailed::Table { rows } => {
                            table {
                                thead {
                                    tr {
                                        th { (messages.column_query) }
                                        @for key in MetricKey::ALL {
                                            th { (key.label(messages)) }
                                        }
                                        th { (messages.column_stats) }
                                        th { (messages.column_status) }
                                    }
                                }
                                tbody {
                                    @for row in rows {
                                        tr {
                                            td title=(row.title) { (row.label) }
                                            @for cell in &row.cells {
                                                td class=(cell.tier.css_class()) { (cell.value) }
                                            }
                                            td { (row.stats) }
                                            td class=(row.status.css_class()) { (row.status_label) }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                @if let Some(info) = metrics_info {
                    section class="modal" id="metrics-info" {
                        h2 { (info.title) }
                        dl {
                            @for entry in &info.entries {
                                dt { (entry.name) }
                                dd {
                                    p { (entry.description) }
                                    p class="formula" { (messages.formula_label) ": " (entry.formula) }
                                }
                            }
                        }
                    }
                }

                footer { (messages.generated_at) " " (generated_at) }
            }
        }
    }
}
