use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::client::EvaluationApi;
use crate::config::ServerConfig;
use crate::model::SystemInfo;
use crate::util::current_thread_runtime;

pub fn run(args: StatusArgs) -> Result<()> {
    let server = ServerConfig::from_args(&args.server)?;
    info!(server = %server.url, "status requested");

    let api = server.connect()?;
    let runtime = current_thread_runtime()?;
    let system = runtime
        .block_on(api.system_info())
        .with_context(|| format!("failed to query {}", server.url))?;

    log_system_info(&system);
    Ok(())
}

fn log_system_info(system: &SystemInfo) {
    let file_types = system
        .file_types
        .iter()
        .map(|(kind, count)| format!("{kind}={count}"))
        .collect::<Vec<_>>()
        .join(",");

    info!(
        documents = system.documents_count,
        indexed_terms = system.indexed_terms,
        file_types = %file_types,
        search_type = %system.search_type,
        current_folder = %system.current_folder,
        "server index status"
    );

    if system.qrels_exists {
        info!(qrels_size = system.qrels_size, "qrels file present");
    } else {
        warn!("qrels file missing on server");
    }

    if system.documents_count == 0 {
        warn!("server has no indexed documents");
    }

    if system.evaluation_ready {
        info!("evaluation ready");
    } else {
        warn!("evaluation not ready");
    }
}
