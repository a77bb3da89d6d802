pub mod evaluate;
pub mod metrics_info;
pub mod render;
pub mod status;

use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::cli::ReportArgs;
use crate::controller::Controller;
use crate::i18n::Messages;
use crate::report::render as render_report;
use crate::util::{create_output_file, now_utc_string};
use crate::view::{Phase, ViewEvent};

/// Runs one evaluation while echoing view transitions to the log. Metric docs,
/// when requested, load first so a docs failure is replaced by the run's own
/// outcome.
async fn drive(
    controller: &Controller,
    mut events: UnboundedReceiver<ViewEvent>,
    with_metrics_info: bool,
) -> Result<Phase> {
    let messages = controller.messages();

    if with_metrics_info {
        if let Err(err) = controller.show_metrics_info().await {
            warn!(error = %err, "continuing without metrics info");
        }
    }

    let run = controller.run_evaluation();
    tokio::pin!(run);

    let phase = loop {
        tokio::select! {
            biased;
            Some(event) = events.recv() => log_event(&event, messages),
            result = &mut run => {
                while let Ok(event) = events.try_recv() {
                    log_event(&event, messages);
                }
                break result?;
            }
        }
    };

    Ok(phase)
}

fn log_event(event: &ViewEvent, messages: &Messages) {
    match event {
        ViewEvent::LoadingShown => info!("{}", messages.loading),
        ViewEvent::ResultsShown(view) => {
            info!(queries = view.row_count(), plots = view.plots.len(), "results shown")
        }
        ViewEvent::ErrorShown(message) => warn!(error = %message, "error shown"),
        ViewEvent::NoticeShown(message) => warn!(notice = %message, "notice shown"),
        ViewEvent::LoadingHidden => debug!("loading hidden"),
        ViewEvent::ModalOpened(info) => info!(entries = info.entries.len(), "metrics info opened"),
        ViewEvent::ModalClosed => debug!("metrics info closed"),
    }
}

fn present(controller: &Controller, report: &ReportArgs) -> Result<()> {
    let view = match controller.phase() {
        Phase::Results(view) => view,
        Phase::Error(message) => bail!("evaluation failed: {message}"),
        other => bail!("evaluation did not settle (phase: {})", other.name()),
    };

    if let Some(last) = controller.last_response() {
        info!(
            qrels_file = %last.qrels_file.as_deref().unwrap_or(&controller.config().qrels_file),
            operator = %controller.config().operator,
            total_queries = last.metrics.total_queries.unwrap_or(view.row_count()),
            "evaluation complete"
        );
    }

    if let Some(notice) = controller.notice() {
        warn!(notice = %notice, "report rendered with a pending notice");
    }

    let modal = controller.modal();
    let messages = controller.messages();
    let generated_at = now_utc_string();

    match report.output.as_deref() {
        Some(path) => {
            let mut writer = create_output_file(path)?;
            render_report(
                &mut writer,
                report.format,
                &view,
                modal.as_ref(),
                messages,
                &generated_at,
            )?;
            log_written(path, report, view.row_count());
        }
        None => {
            let mut writer = io::BufWriter::new(io::stdout().lock());
            render_report(
                &mut writer,
                report.format,
                &view,
                modal.as_ref(),
                messages,
                &generated_at,
            )?;
            writer.flush()?;
        }
    }

    Ok(())
}

fn log_written(path: &Path, report: &ReportArgs, rows: usize) {
    info!(
        path = %path.display(),
        format = report.format.as_str(),
        locale = report.locale.as_str(),
        rows,
        "wrote report"
    );
}
