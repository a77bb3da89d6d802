use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use super::{drive, present};
use crate::cli::RenderArgs;
use crate::client::ReplayApi;
use crate::config::DashboardConfig;
use crate::controller::Controller;
use crate::util::current_thread_runtime;

pub fn run(args: RenderArgs) -> Result<()> {
    info!(
        response = %args.response.display(),
        operator = %args.operator,
        format = args.report.format.as_str(),
        "render requested"
    );

    let with_metrics_info = args.metrics_info.is_some();
    let api = ReplayApi::new(args.response.clone(), args.metrics_info.clone());
    let config = DashboardConfig::default()
        .with_operator(args.operator)
        .with_locale(args.report.locale);

    let mut controller = Controller::new(Arc::new(api), config);
    let events = controller.subscribe();
    let runtime = current_thread_runtime()?;
    runtime.block_on(drive(&controller, events, with_metrics_info))?;

    present(&controller, &args.report)
}
