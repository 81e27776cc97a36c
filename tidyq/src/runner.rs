use anyhow::Result;
use log::{error, info};
use tidyq_client::{ApiError, DeleteOutcome, ManagementClient};

/// Counters of a completed run.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Summary {
    pub(crate) deleted: usize,
    pub(crate) in_use: usize,
    /// Queues without the prefix, they are not touched.
    pub(crate) ignored: usize,
}

/// Exact and case-sensitive.
pub(crate) fn is_control_queue(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix)
}

/// Delete every unused queue whose name starts with `prefix`, in the order the broker lists them.
///
/// The first unexpected response stops the run, the remaining queues are left alone.
pub(crate) async fn tidy(client: &ManagementClient, prefix: &str) -> Result<Summary> {
    info!("Tidying queues starting with {:?} on {}", prefix, client.base_url());

    let queues = client.list_queues().await?;
    let mut summary = Summary::default();

    for queue in queues {
        if !is_control_queue(&queue.name, prefix) {
            summary.ignored += 1;
            continue;
        }

        let url = client.queue_url(&queue)?;

        match client.delete_queue_if_unused(&queue).await {
            Ok(outcome) => {
                info!("DELETE {}: {}", url, outcome);

                match outcome {
                    DeleteOutcome::Deleted => summary.deleted += 1,
                    DeleteOutcome::InUse => summary.in_use += 1,
                }
            }
            Err(e) => {
                if let Some(api_error) = e.downcast_ref::<ApiError>() {
                    error!("DELETE {}: status {} {}", url, api_error.status, api_error.body);
                }

                return Err(e);
            }
        }
    }

    info!(
        "Done, {} deleted, {} in use, {} ignored",
        summary.deleted, summary.in_use, summary.ignored
    );

    Ok(summary)
}
