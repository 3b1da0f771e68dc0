use super::types::MeisterError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    /// Whether a submission loop may log this error and move on to the next item.
    pub skippable: bool,
}

impl MeisterError {
    /// Classify this error to decide whether the submission loop skips past it
    /// or aborts the run.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Transport and API failures: isolated per submission attempt
            MeisterError::RemoteApi { .. } => ErrorClassification {
                error_type: "RemoteAPIError",
                skippable: true,
            },
            MeisterError::RemoteApiTimeout { .. } => ErrorClassification {
                error_type: "RemoteAPITimeout",
                skippable: true,
            },
            MeisterError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                skippable: true,
            },

            // Everything else is unmodeled from the submitter's point of view
            MeisterError::LocalIo { .. } => ErrorClassification {
                error_type: "LocalIOError",
                skippable: false,
            },
            MeisterError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                skippable: false,
            },
            MeisterError::Database(_) => ErrorClassification {
                error_type: "DatabaseError",
                skippable: false,
            },
            MeisterError::Io(_) => ErrorClassification {
                error_type: "IoError",
                skippable: false,
            },
            MeisterError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                skippable: false,
            },
            MeisterError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                skippable: false,
            },
            MeisterError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                skippable: false,
            },
        }
    }

    pub fn is_skippable(&self) -> bool {
        self.classify().skippable
    }
}
