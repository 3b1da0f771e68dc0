use serde::{Deserialize, Serialize};

/// A proof of vulnerability produced by an upstream analysis job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exploit {
    pub id: String,
    pub cbn_id: String,
    pub blob: Vec<u8>,
    pub created_at: String,
}
