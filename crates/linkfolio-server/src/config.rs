/// Re-export `Config` from `linkfolio-core` for use within this crate.
///
/// All environment-variable parsing lives in `linkfolio-core` so it can be
/// shared with integration tests without depending on the full server.
pub use linkfolio_core::config::Config;
