//! Cross-platform entry points.
//!
//! [`WeChatExtractor`] hides which backend is available: on macOS it talks
//! to the running client, elsewhere the live operations report
//! [`WeChatError::Unsupported`] and only recorded snapshots can be read.

use std::path::Path;
use std::time::Duration;

use crate::chat::UnreadPolicy;
use crate::locator::Locator;
use crate::roles::RolePathTable;
use crate::session::ChatSession;
use crate::snapshot::SnapshotHost;
use crate::types::WeChatError;

#[cfg(target_os = "macos")]
use crate::platform::macos::{self, MacHost};

/// Unified API over the live and recorded backends.
pub struct WeChatExtractor;

impl WeChatExtractor {
    /// Whether this process may use the accessibility API.
    ///
    /// Always `false` off macOS.
    pub fn is_enabled() -> bool {
        #[cfg(target_os = "macos")]
        {
            macos::is_trusted()
        }

        #[cfg(not(target_os = "macos"))]
        {
            false
        }
    }

    /// Show the system permission prompt and open the settings pane.
    pub fn request_permissions() {
        #[cfg(target_os = "macos")]
        {
            if !macos::is_trusted_with_prompt() {
                if let Err(e) = macos::open_accessibility_preferences() {
                    log::warn!("[WX-AX] Could not open System Settings: {}", e);
                }
            }
        }

        #[cfg(not(target_os = "macos"))]
        {
            log::debug!("[WX-AX] No permission prompt on this platform");
        }
    }

    /// Human-readable steps for granting accessibility access.
    pub fn permission_instructions() -> &'static str {
        #[cfg(target_os = "macos")]
        {
            macos::get_permission_instructions()
        }

        #[cfg(not(target_os = "macos"))]
        {
            "Accessibility automation of WeChat is only available on macOS."
        }
    }

    /// Build a locator for `dialect`, rejecting dialects without a table.
    ///
    /// # Arguments
    ///
    /// * `dialect` - Client layout version, `v38` or `v40`
    /// * `max_depth` - Level limit for every role-path search
    ///
    /// # Errors
    ///
    /// [`WeChatError::UnsupportedDialect`] naming the supported versions.
    ///
    /// # Example
    ///
    /// ```
    /// use wechat_extractor::{WeChatError, WeChatExtractor};
    ///
    /// let locator = WeChatExtractor::locator("v38", 100).unwrap();
    /// assert_eq!(locator.version(), "v38");
    ///
    /// assert!(matches!(
    ///     WeChatExtractor::locator("v12", 100),
    ///     Err(WeChatError::UnsupportedDialect(_))
    /// ));
    /// ```
    pub fn locator(dialect: &str, max_depth: usize) -> Result<Locator, WeChatError> {
        if !RolePathTable::is_supported(dialect) {
            return Err(WeChatError::UnsupportedDialect(format!(
                "{} (supported: {})",
                dialect,
                RolePathTable::supported_versions().join(", ")
            )));
        }
        Ok(Locator::new(dialect).with_max_depth(max_depth))
    }

    /// A session over a recorded UI tree.
    ///
    /// # Errors
    ///
    /// [`WeChatError::Snapshot`] when the file cannot be read or parsed.
    pub fn open_snapshot(
        path: &Path,
        locator: Locator,
        policy: UnreadPolicy,
    ) -> Result<ChatSession<SnapshotHost>, WeChatError> {
        let host = SnapshotHost::load(path)?;
        log::info!("[WX-AX] Replaying snapshot {:?}", path);
        Ok(ChatSession::new(host, locator, policy))
    }

    /// A session over the running WeChat client.
    ///
    /// # Errors
    ///
    /// - [`WeChatError::PermissionDenied`] without accessibility access
    /// - [`WeChatError::AppNotFound`] when WeChat is not running
    #[cfg(target_os = "macos")]
    pub fn connect(locator: Locator, policy: UnreadPolicy) -> Result<ChatSession<MacHost>, WeChatError> {
        if !Self::is_enabled() {
            return Err(WeChatError::PermissionDenied(
                "accessibility access is not granted".into(),
            ));
        }
        let host = MacHost::connect()?;
        Ok(ChatSession::new(host, locator, policy))
    }

    /// Print debounced change notifications from WeChat until the process
    /// is stopped.
    pub fn monitor(debounce: Duration) -> Result<(), WeChatError> {
        #[cfg(target_os = "macos")]
        {
            use crate::monitor::Debouncer;

            if !Self::is_enabled() {
                return Err(WeChatError::PermissionDenied(
                    "accessibility access is not granted".into(),
                ));
            }
            let host = MacHost::connect()?;
            macos::observer::run(host.pid(), host.app(), Debouncer::new(debounce))
        }

        #[cfg(not(target_os = "macos"))]
        {
            let _ = debounce;
            Err(WeChatError::Unsupported("monitoring requires macOS".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // Dialect validation
    // ============================================================================

    #[test]
    fn test_locator_accepts_known_dialects() {
        for dialect in ["v38", "v40"] {
            let locator = WeChatExtractor::locator(dialect, 100).unwrap();
            assert_eq!(locator.version(), dialect);
        }
    }

    #[test]
    fn test_locator_rejects_unknown_dialect() {
        match WeChatExtractor::locator("v39", 100) {
            Err(WeChatError::UnsupportedDialect(message)) => {
                assert!(message.starts_with("v39"));
                assert!(message.contains("v38"));
            }
            other => panic!("expected UnsupportedDialect, got {:?}", other.map(|l| l.version().to_string())),
        }
    }

    // ============================================================================
    // Snapshot sessions
    // ============================================================================

    #[test]
    fn test_open_missing_snapshot_fails() {
        let locator = WeChatExtractor::locator("v40", 100).unwrap();
        let result = WeChatExtractor::open_snapshot(
            Path::new("/nonexistent/wechat.json"),
            locator,
            UnreadPolicy::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_permission_instructions_not_empty() {
        assert!(!WeChatExtractor::permission_instructions().is_empty());
    }

    // ============================================================================
    // Unsupported platforms
    // ============================================================================

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_not_enabled_off_macos() {
        assert!(!WeChatExtractor::is_enabled());
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_monitor_unsupported_off_macos() {
        assert!(matches!(
            WeChatExtractor::monitor(Duration::from_millis(500)),
            Err(WeChatError::Unsupported(_))
        ));
    }
}
