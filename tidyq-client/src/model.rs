use serde_derive::Deserialize;
use std::fmt;

/// A queue as the management API lists it. Every other field of the listing is ignored.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Queue {
    /// The name of the queue, unique within its virtual host.
    pub name: String,
    /// The virtual host the queue lives in.
    pub vhost: String,
}

impl Queue {
    pub fn new(vhost: &str, name: &str) -> Self {
        Queue {
            name: name.to_string(),
            vhost: vhost.to_string(),
        }
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vhost, self.name)
    }
}

/// The expected results of a delete-if-unused request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The broker answered with 204 No Content.
    Deleted,
    /// The broker refused the deletion because the queue still has consumers.
    InUse,
}

impl fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteOutcome::Deleted => f.write_str("Deleted"),
            DeleteOutcome::InUse => f.write_str("In use"),
        }
    }
}
