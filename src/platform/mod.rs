//! Live accessibility backends.
//!
//! Only macOS has one. Everything above this module works against
//! [`AccessibleElement`](crate::element::AccessibleElement), so recorded
//! snapshots stand in for the live tree on other platforms and in tests.

#[cfg(target_os = "macos")]
pub mod macos;
