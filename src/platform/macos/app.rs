//! WeChat process discovery and synthetic key input.

use std::thread;
use std::time::Duration;

use core_graphics::event::{CGEvent, CGKeyCode};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};

use super::element::AxElement;
use crate::session::Host;
use crate::types::{Lookup, WeChatError};

/// Bundle identifier of the WeChat desktop client
pub const WECHAT_BUNDLE_ID: &str = "com.tencent.xinWeChat";

const KEY_RETURN: CGKeyCode = 0x24;
const KEY_ESCAPE: CGKeyCode = 0x35;

/// Pause between key down and key up when submitting
const SUBMIT_KEY_DELAY: Duration = Duration::from_millis(50);

/// Get the process ID for a running application by bundle ID.
///
/// Walks `[[NSWorkspace sharedWorkspace] runningApplications]`.
pub fn get_pid_for_bundle_id(bundle_id: &str) -> Option<i32> {
    use cocoa::base::{id, nil};
    use objc::{class, msg_send, sel, sel_impl};

    unsafe {
        let ns_workspace_class = class!(NSWorkspace);
        let workspace: id = msg_send![ns_workspace_class, sharedWorkspace];
        if workspace == nil {
            log::warn!("[WX-APP] Failed to get NSWorkspace");
            return None;
        }

        let running_apps: id = msg_send![workspace, runningApplications];
        if running_apps == nil {
            log::warn!("[WX-APP] Failed to get running applications");
            return None;
        }

        let count: usize = msg_send![running_apps, count];
        for i in 0..count {
            let app: id = msg_send![running_apps, objectAtIndex: i];
            if app == nil {
                continue;
            }
            let app_bundle_id: id = msg_send![app, bundleIdentifier];
            if app_bundle_id == nil {
                continue;
            }
            let c_str: *const std::os::raw::c_char = msg_send![app_bundle_id, UTF8String];
            if c_str.is_null() {
                continue;
            }
            if std::ffi::CStr::from_ptr(c_str).to_string_lossy() == bundle_id {
                let pid: i32 = msg_send![app, processIdentifier];
                return Some(pid);
            }
        }
    }
    None
}

/// Post a key down/up pair to `pid`.
fn post_key(pid: i32, key: CGKeyCode, delay: Option<Duration>) -> Result<(), WeChatError> {
    let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|_| WeChatError::Unsupported("CGEventSource unavailable".into()))?;
    let key_down = CGEvent::new_keyboard_event(source.clone(), key, true)
        .map_err(|_| WeChatError::Unsupported(format!("cannot create key event {:#x}", key)))?;
    let key_up = CGEvent::new_keyboard_event(source, key, false)
        .map_err(|_| WeChatError::Unsupported(format!("cannot create key event {:#x}", key)))?;

    key_down.post_to_pid(pid);
    if let Some(delay) = delay {
        thread::sleep(delay);
    }
    key_up.post_to_pid(pid);
    if let Some(delay) = delay {
        thread::sleep(delay);
    }
    Ok(())
}

/// The running WeChat client.
pub struct MacHost {
    pid: i32,
    app: AxElement,
}

impl MacHost {
    /// Attach to the running WeChat process.
    pub fn connect() -> Result<Self, WeChatError> {
        let pid = get_pid_for_bundle_id(WECHAT_BUNDLE_ID)
            .ok_or_else(|| WeChatError::AppNotFound(WECHAT_BUNDLE_ID.to_string()))?;
        log::debug!("[WX-APP] WeChat running with pid {}", pid);
        Ok(MacHost {
            pid,
            app: AxElement::application(pid),
        })
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }

    pub fn app(&self) -> &AxElement {
        &self.app
    }

    fn element_pid(&self, element: &AxElement) -> i32 {
        match element.pid() {
            Ok(pid) => pid,
            Err(failure) => {
                log::debug!("[WX-APP] {}", failure);
                self.pid
            }
        }
    }
}

impl Host for MacHost {
    type Element = AxElement;

    fn application(&self) -> Lookup<AxElement> {
        Lookup::Found(self.app.clone())
    }

    /// Sends Escape, which brings WeChat's process forward and speeds up
    /// the following accessibility calls.
    fn activate(&self, window: &AxElement) {
        if let Err(e) = post_key(self.element_pid(window), KEY_ESCAPE, None) {
            log::warn!("[WX-APP] Activating WeChat failed: {}", e);
        }
    }

    fn submit(&self, input: &AxElement) {
        if let Err(e) = post_key(self.element_pid(input), KEY_RETURN, Some(SUBMIT_KEY_DELAY)) {
            log::warn!("[WX-APP] Submitting message failed: {}", e);
        }
    }
}
