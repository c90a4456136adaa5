use flotilla_graph::Graph;
use miette::Diagnostic;
use thiserror::Error;

pub mod dot;

pub use dot::{DotBackend, DotOptions};

#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum BackendError {
    #[error("backend error: {0}")]
    #[diagnostic(code(backend::error))]
    Fmt(#[from] std::fmt::Error),
}

/// Turn a compiled graph into an output artifact.
pub trait Backend {
    type Artifact;

    fn emit(&self, graph: &Graph) -> Result<Self::Artifact, BackendError>;
}
