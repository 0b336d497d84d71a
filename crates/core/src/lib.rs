pub mod config;
pub mod domain;
pub mod errors;
pub mod interpret;
pub mod money;
pub mod summary;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::booking::{Booking, BookingId, CurrencyCode, DEFAULT_CURRENCY};
pub use domain::query::{ParsedQuery, QueryFilters};
pub use domain::summary::{AgentResult, BookingSummary};
pub use errors::{
    BookingSourceError, ErrorKind, FxError, InterfaceError, ParseError, QueryError,
};
pub use interpret::{
    InterpreterMode, ParserKind, QueryInterpreter, QueryParser, RuleBasedQueryParser,
};
pub use summary::{BookingSource, BookingSummarizer, FxRateSource};
