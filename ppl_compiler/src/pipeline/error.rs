use std::path::PathBuf;

use crate::error::StructuralError;

/// Pipeline processing errors. Only fatal conditions surface here;
/// recoverable problems are collected as diagnostics on the session.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("translation failed: {0}")]
    Structural(#[from] StructuralError),

    #[error("program loading failed: {0}")]
    Container(#[from] ppl_container::ContainerError),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
