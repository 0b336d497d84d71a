pub mod booking;
pub mod query;
pub mod summary;
