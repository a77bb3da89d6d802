use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::MetricsInfoArgs;
use crate::config::{DashboardConfig, ServerConfig};
use crate::controller::Controller;
use crate::report::render_metrics_info_text;
use crate::util::current_thread_runtime;

pub fn run(args: MetricsInfoArgs) -> Result<()> {
    let server = ServerConfig::from_args(&args.server)?;
    info!(server = %server.url, "metrics info requested");

    let controller = Controller::new(
        Arc::new(server.connect()?),
        DashboardConfig::default().with_locale(args.locale),
    );
    let runtime = current_thread_runtime()?;
    let info = runtime
        .block_on(controller.show_metrics_info())
        .with_context(|| controller.messages().metrics_info_error)?;

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &info)
            .context("failed to serialize metrics info json")?;
        writeln!(output)?;
    } else {
        render_metrics_info_text(&mut output, &info, controller.messages())?;
    }
    output.flush()?;

    controller.close_modal();
    Ok(())
}
