use thiserror::Error;

use crate::domain::booking::CurrencyCode;

/// Failure of a single interpreter (rule-based or model-assisted).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("could not parse query: {0}")]
    Unparseable(String),
    #[error("unsupported or invalid query: {0}")]
    Unsupported(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BookingSourceError {
    #[error("booking provider unavailable: {0}")]
    Unavailable(String),
    #[error("booking provider returned an invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FxError {
    #[error("FX client is not configured but a conversion from {from} to {to} was requested")]
    NotConfigured { from: CurrencyCode, to: CurrencyCode },
    #[error("FX provider unavailable: {0}")]
    Unavailable(String),
    #[error("no FX rate for {from}->{to}: {reason}")]
    RateUnavailable { from: CurrencyCode, to: CurrencyCode, reason: String },
}

/// Coarse classification used by transports to pick a response class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    UnparseableQuery,
    InvalidParserOutput,
    ProviderUnavailable,
    DataUnavailable,
    Configuration,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnparseableQuery => "unparseable_query",
            Self::InvalidParserOutput => "invalid_parser_output",
            Self::ProviderUnavailable => "provider_unavailable",
            Self::DataUnavailable => "data_unavailable",
            Self::Configuration => "configuration",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error(transparent)]
    UnparseableQuery(#[from] ParseError),
    #[error("invalid dates from parser: start=`{start_date}`, end=`{end_date}`")]
    InvalidParserOutput { start_date: String, end_date: String },
    #[error(transparent)]
    Bookings(#[from] BookingSourceError),
    #[error("could not convert from {from} to {to}: {source}")]
    ConversionFailed {
        from: CurrencyCode,
        to: CurrencyCode,
        #[source]
        source: FxError,
    },
    #[error("booking total in {currency} exceeds the representable amount range")]
    TotalOverflow { currency: CurrencyCode },
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnparseableQuery(_) => ErrorKind::UnparseableQuery,
            Self::InvalidParserOutput { .. } => ErrorKind::InvalidParserOutput,
            Self::Bookings(BookingSourceError::Unavailable(_)) => ErrorKind::ProviderUnavailable,
            Self::Bookings(BookingSourceError::InvalidResponse(_)) => ErrorKind::DataUnavailable,
            Self::ConversionFailed { source, .. } => match source {
                FxError::NotConfigured { .. } => ErrorKind::Configuration,
                FxError::Unavailable(_) => ErrorKind::ProviderUnavailable,
                FxError::RateUnavailable { .. } => ErrorKind::DataUnavailable,
            },
            Self::TotalOverflow { .. } => ErrorKind::DataUnavailable,
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let message = self.to_string();
        match self.kind() {
            ErrorKind::UnparseableQuery
            | ErrorKind::InvalidParserOutput
            | ErrorKind::DataUnavailable => InterfaceError::BadRequest { message, correlation_id },
            ErrorKind::ProviderUnavailable => {
                InterfaceError::ServiceUnavailable { message, correlation_id }
            }
            ErrorKind::Configuration => InterfaceError::Internal { message, correlation_id },
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn reason(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}
