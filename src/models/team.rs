use serde::{Deserialize, Serialize};

/// A competing team. Our own team is stored with `is_self` set and never
/// receives submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub is_self: bool,
}
