//! Publish strategies
//!
//! Every built-in platform is a [`PlatformProfile`] (URLs, selector chains,
//! success signal) run by the shared [`WebStrategy`] flow.

pub mod platforms;
pub mod profile;
pub mod web;

pub use platforms::builtin_profiles;
pub use profile::{ContentInput, PlatformProfile, PostSubmitDialog, SuccessSignal};
pub use web::{PublishStep, StrategySettings, WebStrategy};
