use bridge_traits::inventory::Capability;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{}", describe_missing(missing, available))]
    MissingBindings {
        missing: Vec<Capability>,
        available: Vec<String>,
    },

    #[error("Unknown outcome action: {0}")]
    UnknownAction(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_missing(missing: &[Capability], available: &[String]) -> String {
    let mut out = String::from("Could not bind required capabilities:");
    for capability in missing {
        out.push_str(&format!(
            "\n  - {} (override with {}=<name>)",
            capability,
            capability.override_key()
        ));
    }
    if available.is_empty() {
        out.push_str("\nNo collaborators are registered.");
    } else {
        out.push_str(&format!("\nRegistered collaborators: {}", available.join(", ")));
    }
    out
}

pub type Result<T> = std::result::Result<T, SyncError>;
