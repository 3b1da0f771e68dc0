use serde::{Deserialize, Serialize};

/// Body of `GET /status`. Only the round is interpreted; the rest is kept
/// for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusInfo {
    #[serde(default)]
    pub round: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One staged challenge binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binary {
    /// File name of the staged binary.
    pub id: String,
    /// Standard base64 of the file contents.
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinariesResponse {
    pub binaries: Vec<Binary>,
}

/// Acknowledgment returned by the scoring service for an accepted POV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionAck {
    pub status_code: u16,
    pub body: String,
}
