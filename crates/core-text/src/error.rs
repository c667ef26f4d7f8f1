use thiserror::Error;

/// Errors raised by buffer construction. The view engine proper never
/// returns this type — failed motions and projections use sentinels
/// ([`crate::EPOS`], `false`) per the narrow error surface the core
/// commits to.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read buffer from disk: {0}")]
    Io(#[source] std::io::Error),
}
