use pdpsync_domain::PdpError;
use thiserror::Error;

/// CDAR decoding failures. All of them need investigation before a retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CdarError {
    #[error("malformed CDAR XML: {0}")]
    Malformed(String),

    #[error("unexpected CDAR root element <{0}>")]
    UnexpectedRoot(String),

    #[error("missing mandatory CDAR fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid CDAR field {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

impl From<quick_xml::Error> for CdarError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<CdarError> for PdpError {
    fn from(err: CdarError) -> Self {
        Self::Validation(err.to_string())
    }
}
