use thiserror::Error;

/// Why a contact submission did not reach a successful response.
///
/// Every variant is shown to the visitor as the same generic failure banner;
/// the detail only goes to the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("form relay request failed: {0}")]
    Transport(String),
    #[error("form relay responded with status {0}")]
    Status(u16),
    #[error("form relay request timed out")]
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown form field `{0}`")]
pub struct UnknownFieldKey(pub String);
