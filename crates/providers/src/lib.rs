//! HTTP implementations of the booking and FX collaborators.

pub mod bookings;
pub mod fx;
pub mod http;

pub use bookings::HttpBookingSource;
pub use fx::HttpFxRateSource;
pub use http::{build_client, ClientBuildError};
