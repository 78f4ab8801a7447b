/// Errors that can occur in the reader/pump pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PumpError {
    /// The reader thread could not be started.
    #[error("failed to spawn reader thread: {0}")]
    Spawn(std::io::Error),

    /// The consumer side of the state channel was dropped.
    #[error("state receiver dropped")]
    ReceiverGone,

    /// A drain policy name was not recognised.
    #[error("unknown drain policy '{0}' (expected 'all' or 'one')")]
    UnknownDrainPolicy(String),
}

pub type Result<T> = std::result::Result<T, PumpError>;
