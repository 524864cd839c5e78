pub mod api;
pub mod date_utils;
pub mod errors;
pub mod logging;

pub use api::{ApiClient, SchoolApi};
pub use errors::ApiError;
