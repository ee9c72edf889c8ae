use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("could not start command ({command}): {source}")]
    Spawn { command: String, source: std::io::Error },

    #[error("could not collect the output of ({command}): {source}")]
    Wait { command: String, source: std::io::Error },

    #[error("command cancelled ({command})")]
    Cancelled { command: String },
}

impl CommandError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CommandError::Cancelled { .. })
    }
}
