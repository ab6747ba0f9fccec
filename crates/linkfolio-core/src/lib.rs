pub mod aggregate;
pub mod config;
pub mod error;
pub mod event;
pub mod referrer;
pub mod report;
pub mod session;
pub mod social;
pub mod store;
