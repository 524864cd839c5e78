//! # School Admin Front-end
//!
//! Client-side logic for the school administration console:
//!
//! - **navigation**: route history and "go back" resolution
//! - **fees**: monthly fee receipts (fines, arrears, duplicate warnings,
//!   confirm-before-create) and direct fee entry
//! - **services**: REST client for the school API, logging, date helpers
//! - **config**: YAML configuration with environment overrides
//!
//! The school API itself is an external service; everything here talks to
//! it through [`services::SchoolApi`].

pub mod config;
pub mod fees;
pub mod navigation;
pub mod services;

pub use config::AdminConfig;
pub use fees::{FeeEntryService, ReceiptSession};
pub use navigation::NavigationStack;
pub use services::{ApiClient, ApiError, SchoolApi};
