//! macOS backend: AXUIElement wrapper, WeChat process discovery, key input,
//! permission checks and the notification observer.

pub mod app;
pub mod element;
pub mod observer;
pub mod permissions;

pub use app::{get_pid_for_bundle_id, MacHost, WECHAT_BUNDLE_ID};
pub use element::AxElement;
pub use permissions::{
    get_permission_instructions, is_trusted, is_trusted_with_prompt, open_accessibility_preferences,
};
