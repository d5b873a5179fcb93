//! AXObserver subscription that drives the monitoring mode.

use std::cell::RefCell;
use std::ffi::c_void;
use std::time::Instant;

use accessibility_sys::{
    kAXErrorSuccess, AXObserverAddNotification, AXObserverCreate, AXObserverGetRunLoopSource,
    AXObserverRef, AXUIElementRef,
};
use core_foundation::base::TCFType;
use core_foundation::runloop::{kCFRunLoopDefaultMode, CFRunLoop, CFRunLoopSource};
use core_foundation::string::{CFString, CFStringRef};

use super::element::AxElement;
use crate::monitor::{notification_line, Debouncer, WATCHED_NOTIFICATIONS};
use crate::types::WeChatError;

unsafe extern "C" fn on_notification(
    _observer: AXObserverRef,
    _element: AXUIElementRef,
    notification: CFStringRef,
    refcon: *mut c_void,
) {
    if refcon.is_null() || notification.is_null() {
        return;
    }
    let debouncer = &*(refcon as *const RefCell<Debouncer>);
    let Ok(mut debouncer) = debouncer.try_borrow_mut() else {
        return;
    };
    if debouncer.observe(Instant::now()) {
        let name = CFString::wrap_under_get_rule(notification).to_string();
        log::debug!("[WX-MONITOR] {}", name);
        println!("{}", notification_line(chrono::Local::now(), &name));
    }
}

/// Subscribe to [`WATCHED_NOTIFICATIONS`] on `app` and run the current
/// thread's run loop.
///
/// Only returns if the subscription cannot be set up.
pub fn run(pid: i32, app: &AxElement, debouncer: Debouncer) -> Result<(), WeChatError> {
    let mut observer: AXObserverRef = std::ptr::null_mut();
    let code = unsafe { AXObserverCreate(pid, on_notification, &mut observer) };
    if code != kAXErrorSuccess || observer.is_null() {
        return Err(WeChatError::Observer(format!("Failed to create AXObserver: {}", code)));
    }

    // Lives for the rest of the process; the run loop never hands it back.
    let refcon = Box::into_raw(Box::new(RefCell::new(debouncer))) as *mut c_void;

    for name in WATCHED_NOTIFICATIONS {
        let notification = CFString::new(name);
        let code = unsafe {
            AXObserverAddNotification(
                observer,
                app.as_ax().as_concrete_TypeRef(),
                notification.as_concrete_TypeRef(),
                refcon,
            )
        };
        if code != kAXErrorSuccess {
            return Err(WeChatError::Observer(format!(
                "Failed to add notification {}: {}",
                name, code
            )));
        }
        log::info!("[WX-MONITOR] Watching {}", name);
    }

    let source = unsafe { CFRunLoopSource::wrap_under_get_rule(AXObserverGetRunLoopSource(observer)) };
    let run_loop = CFRunLoop::get_current();
    unsafe { run_loop.add_source(&source, kCFRunLoopDefaultMode) };

    log::info!("[WX-MONITOR] Monitoring WeChat (pid {})", pid);
    CFRunLoop::run_current();
    Ok(())
}
