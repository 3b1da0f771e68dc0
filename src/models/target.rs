use serde::{Deserialize, Serialize};

/// One challenge binary under analysis.
///
/// Multi-binary challenge sets form a forest: the node without a parent is the
/// root, and only roots are submission targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeBinaryNode {
    pub id: String,
    /// Challenge-set identifier used by the scoring service.
    pub cs_id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

impl ChallengeBinaryNode {
    /// A standalone root node whose challenge-set id and name equal its id.
    pub fn root(id: &str) -> Self {
        Self {
            id: id.to_string(),
            cs_id: id.to_string(),
            name: id.to_string(),
            parent_id: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
