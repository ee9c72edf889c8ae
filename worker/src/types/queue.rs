use strum_macros::{Display, EnumIter};

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, EnumIter, Hash)]
pub enum QueueType {
    /// Job tokens waiting for a worker
    #[strum(serialize = "generate")]
    Generate,
    /// Job tokens whose terminal status has been written
    #[strum(serialize = "results")]
    Results,
}
