//! Security utilities for log output and generated file names.
//!
//! - Credential scrubbing so secrets never reach the shipped run logs
//! - Sanitizing user-supplied values embedded in archive names

pub mod sanitize;
pub mod scrubber;

pub use sanitize::sanitize_name_component;
pub use scrubber::scrub_credentials;
