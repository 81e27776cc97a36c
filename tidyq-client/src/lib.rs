//! Client for the queue endpoints of the RabbitMQ management HTTP API.
//!
//! ```no_run
//! use tidyq_client::{DeleteOutcome, ManagementClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = ManagementClient::new("http://localhost:15672", "guest", "guest")?;
//!
//! for queue in client.list_queues().await? {
//!     if let DeleteOutcome::InUse = client.delete_queue_if_unused(&queue).await? {
//!         println!("{} is still in use", queue.name);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
mod client;
pub use client::{ManagementClient, DEFAULT_VHOST};

mod error;
pub use error::ApiError;

mod model;
pub use model::{DeleteOutcome, Queue};

#[cfg(feature = "fake-broker")]
pub mod fake;
