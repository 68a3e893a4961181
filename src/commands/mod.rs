pub mod list;
pub mod prune;

/// Project environment a command operates on.
#[derive(Debug, Clone)]
pub struct Target {
    pub project_id: String,
    pub environment_id: String,
}

/// How a command that ran to completion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// Some deletes failed or the run was interrupted
    PartialFailure,
}
