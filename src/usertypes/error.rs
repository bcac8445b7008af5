use thiserror::Error;

use crate::rpc::TransmissionError;

/// Failure raised while turning user input into a typed value.
///
/// `Invalid` is the everyday "bad input" case and is the only variant a union
/// type swallows while trying its members. `Misconfigured` means the type itself
/// was set up with impossible constraints and is never retried.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Misconfigured(String),
    #[error("Can't fetch setting {setting}: {source}")]
    Fetch {
        setting: String,
        #[source]
        source: TransmissionError,
    },
    #[error("Can't change setting {setting}: {source}")]
    Remote {
        setting: String,
        #[source]
        source: TransmissionError,
    },
}

pub type ValueResult<T> = std::result::Result<T, ValueError>;

impl ValueError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ValueError::Invalid(message.into())
    }

    pub fn misconfigured(message: impl Into<String>) -> Self {
        ValueError::Misconfigured(message.into())
    }

    pub fn is_misconfigured(&self) -> bool {
        matches!(self, ValueError::Misconfigured(_))
    }
}
