//! Accessibility permission handling.
//!
//! Driving WeChat requires the calling binary (or the terminal it runs in)
//! to be listed under Privacy & Security > Accessibility.

use std::process::Command;

/// Deep link to the Accessibility pane of System Settings
pub const ACCESSIBILITY_SETTINGS_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility";

/// Check if accessibility permissions are granted, without prompting.
pub fn is_trusted() -> bool {
    macos_accessibility_client::accessibility::application_is_trusted()
}

/// Check if accessibility permissions are granted, showing the system
/// prompt when they are not.
pub fn is_trusted_with_prompt() -> bool {
    macos_accessibility_client::accessibility::application_is_trusted_with_prompt()
}

/// Open System Settings at the Accessibility pane.
pub fn open_accessibility_preferences() -> std::io::Result<()> {
    Command::new("open").arg(ACCESSIBILITY_SETTINGS_URL).spawn()?;
    Ok(())
}

/// Human-readable steps for granting the permission.
pub fn get_permission_instructions() -> &'static str {
    "重要: 辅助功能权限未启用!\n\
     请前往: 系统设置 > 隐私与安全性 > 辅助功能\n\
     然后点击 '+'，将此应用添加到列表中并启用它。"
}
