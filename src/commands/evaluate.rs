use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use super::{drive, present};
use crate::cli::EvaluateArgs;
use crate::config::{DashboardConfig, ServerConfig};
use crate::controller::Controller;
use crate::util::current_thread_runtime;

pub fn run(args: EvaluateArgs) -> Result<()> {
    let server = ServerConfig::from_args(&args.server)?;
    let config = DashboardConfig::default()
        .with_qrels_file(args.qrels_file.clone())
        .with_operator(args.operator)
        .with_locale(args.report.locale);

    info!(
        server = %server.url,
        qrels_file = %config.qrels_file,
        operator = %config.operator,
        timeout_secs = server.timeout.map(|timeout| timeout.as_secs()).unwrap_or_default(),
        "evaluate requested"
    );

    let mut controller = Controller::new(Arc::new(server.connect()?), config);
    let events = controller.subscribe();
    let runtime = current_thread_runtime()?;
    runtime.block_on(drive(&controller, events, args.with_metrics_info))?;

    present(&controller, &args.report)
}
