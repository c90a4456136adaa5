use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    #[error("topology schema validation failed: {0}")]
    #[diagnostic(code(topology::schema_error))]
    Schema(#[from] serde_yaml::Error),

    #[error("unsupported topology version `{version}` (supported: {supported})")]
    #[diagnostic(code(topology::unsupported_version))]
    UnsupportedVersion { version: u32, supported: u32 },
}
