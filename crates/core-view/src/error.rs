use thiserror::Error;

/// The view's error surface is deliberately narrow (spec §7): most failures
/// are encoded as `false`/`None` return values rather than this type. This
/// enum covers only construction-time and configuration failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to allocate view of size {width}x{height}")]
    Alloc { width: usize, height: usize },
    #[error("invalid view configuration: {0}")]
    Config(#[source] toml::de::Error),
}
