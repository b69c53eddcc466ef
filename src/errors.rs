#[derive(thiserror::Error, Debug)]
pub enum Error {
    // Provisioning
    #[error("{0}")]
    StepFailed(String),
    #[error("Timed out waiting for operation: {0}")]
    Timeout(String),
    #[error("Command {0:?} could not be started: {1}")]
    CommandError(Vec<String>, std::io::Error),
    #[error("Unexpected {kind} object: {reason}")]
    MalformedObject { kind: String, reason: String },

    // Host
    #[error("IO error {0}")]
    Io(#[from] std::io::Error),
    #[error("No such user or group: {0}")]
    UnknownOwner(String),
    #[error("System call failed: {0}")]
    Nix(#[from] nix::errno::Errno),
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    // Configuration
    #[error("Invalid value {value:?} for {key}")]
    InvalidConfig { key: String, value: String },

    // Misc libs
    #[error("JSON error {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Error rendering template: {0}")]
    Template(#[from] askama::Error),
    #[error("Failed to install log subscriber: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),
}
