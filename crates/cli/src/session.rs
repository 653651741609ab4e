use anyhow::{anyhow, Result};
use tracing::{debug, info};

use sentiflow_client::{ChannelManager, Transport, Update};
use sentiflow_core::{AnalyzeRequest, ResultSet};

/// Drives one job to its end, handing every update to `on_update`.
pub async fn run_job<T, F>(
    transport: T,
    request: &AnalyzeRequest,
    mut on_update: F,
) -> Result<ResultSet>
where
    T: Transport,
    F: FnMut(&Update),
{
    let mut manager = ChannelManager::new(transport);
    let channel = manager.submit(request)?;
    debug!(%channel, "channel opened");
    while let Some(update) = manager.next_update().await {
        on_update(&update);
        match update {
            Update::Completed { rows } => {
                info!(rows, "results received");
                break;
            }
            Update::Failed(failure) => return Err(anyhow!(failure.to_string())),
            Update::Closed => return Err(anyhow!("connection closed before the job finished")),
            Update::Connected | Update::Info(_) | Update::Progress(_) => {}
        }
    }
    manager
        .take_results()
        .ok_or_else(|| anyhow!("job ended without results"))
}
