//! [`AccessibleElement`] over a live `AXUIElement`.
//!
//! Reads go through the raw `AXUIElementCopyAttributeValue` call so that the
//! AXError code survives into [`Lookup::PlatformError`]; "no value" and
//! "attribute unsupported" are reported as [`Lookup::NotFound`].

use std::ffi::c_void;

use accessibility::AXUIElement;
use accessibility_sys::{
    kAXErrorAttributeUnsupported, kAXErrorNoValue, kAXErrorSuccess, kAXValueTypeCGRect,
    AXUIElementCopyActionNames, AXUIElementCopyAttributeValue, AXUIElementGetPid,
    AXUIElementPerformAction, AXUIElementRef, AXUIElementSetAttributeValue, AXValueGetType,
    AXValueGetValue, AXValueRef,
};
use core_foundation::array::{CFArray, CFArrayRef};
use core_foundation::base::{CFType, CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::number::CFNumber;
use core_foundation::string::{CFString, CFStringRef};
use core_graphics::geometry::{CGPoint, CGRect, CGSize};

use crate::element::AccessibleElement;
use crate::types::{Frame, Lookup, PlatformFailure};

/// A live accessibility element.
///
/// Reads go through `AXUIElementCopyAttributeValue` directly so the raw
/// AXError code reaches [`Lookup::PlatformError`]. "No value" and
/// "attribute unsupported" are ordinary absence and map to
/// [`Lookup::NotFound`].
#[derive(Clone)]
pub struct AxElement(AXUIElement);

impl AxElement {
    pub fn new(element: AXUIElement) -> Self {
        AxElement(element)
    }

    /// Application element for `pid`.
    pub fn application(pid: i32) -> Self {
        AxElement(AXUIElement::application(pid))
    }

    /// The wrapped `AXUIElement`, for observer registration.
    pub fn as_ax(&self) -> &AXUIElement {
        &self.0
    }

    /// Owning process of the element.
    ///
    /// # Errors
    ///
    /// A [`PlatformFailure`] named `pid` carrying the AXError code.
    pub fn pid(&self) -> Result<i32, PlatformFailure> {
        let mut pid: i32 = 0;
        let code = unsafe { AXUIElementGetPid(self.0.as_concrete_TypeRef(), &mut pid) };
        if code == kAXErrorSuccess {
            Ok(pid)
        } else {
            Err(PlatformFailure::new("pid", code))
        }
    }

    /// Copy one attribute value, classifying the AXError code.
    fn copy_attribute(&self, name: &str) -> Lookup<CFType> {
        let attribute = CFString::new(name);
        let mut value: CFTypeRef = std::ptr::null();
        let code = unsafe {
            AXUIElementCopyAttributeValue(
                self.0.as_concrete_TypeRef(),
                attribute.as_concrete_TypeRef(),
                &mut value,
            )
        };
        match code {
            kAXErrorSuccess if !value.is_null() => {
                Lookup::Found(unsafe { CFType::wrap_under_create_rule(value) })
            }
            kAXErrorSuccess | kAXErrorNoValue | kAXErrorAttributeUnsupported => Lookup::NotFound,
            code => Lookup::PlatformError(PlatformFailure::new(name, code)),
        }
    }

    fn set_attribute(&self, name: &str, value: CFTypeRef) -> Result<(), PlatformFailure> {
        let attribute = CFString::new(name);
        let code = unsafe {
            AXUIElementSetAttributeValue(self.0.as_concrete_TypeRef(), attribute.as_concrete_TypeRef(), value)
        };
        if code == kAXErrorSuccess {
            Ok(())
        } else {
            Err(PlatformFailure::new(name, code))
        }
    }

    fn string_attribute(&self, name: &str) -> Lookup<String> {
        self.copy_attribute(name).and_then(|value| cftype_to_string(&value).into())
    }

    /// Array-of-elements attribute; any failure reads as empty.
    fn element_array(&self, name: &str) -> Vec<AxElement> {
        match self.copy_attribute(name) {
            Lookup::Found(value) => cftype_to_elements(&value),
            Lookup::NotFound => Vec::new(),
            Lookup::PlatformError(failure) => {
                log::debug!("[WX-AX] {}", failure);
                Vec::new()
            }
        }
    }
}

/// Convert a CFString value to a Rust string.
fn cftype_to_string(value: &CFType) -> Option<String> {
    if value.type_of() != CFString::type_id() {
        return None;
    }
    let cf_string: CFString = unsafe { CFString::wrap_under_get_rule(value.as_CFTypeRef() as CFStringRef) };
    Some(cf_string.to_string())
}

/// Convert a CFNumber or CFBoolean value to an integer.
fn cftype_to_i64(value: &CFType) -> Option<i64> {
    let type_id = value.type_of();
    if type_id == CFNumber::type_id() {
        let number: CFNumber =
            unsafe { CFNumber::wrap_under_get_rule(value.as_CFTypeRef() as core_foundation::number::CFNumberRef) };
        return number.to_i64();
    }
    if type_id == CFBoolean::type_id() {
        let boolean: CFBoolean = unsafe {
            CFBoolean::wrap_under_get_rule(value.as_CFTypeRef() as core_foundation::boolean::CFBooleanRef)
        };
        return Some(i64::from(bool::from(boolean)));
    }
    None
}

fn cftype_to_element(value: &CFType) -> Option<AxElement> {
    if value.type_of() != AXUIElement::type_id() {
        return None;
    }
    let element = unsafe { AXUIElement::wrap_under_get_rule(value.as_CFTypeRef() as AXUIElementRef) };
    Some(AxElement(element))
}

fn cftype_to_elements(value: &CFType) -> Vec<AxElement> {
    if value.type_of() != CFArray::<CFType>::type_id() {
        return Vec::new();
    }
    let array: CFArray<CFType> = unsafe { CFArray::wrap_under_get_rule(value.as_CFTypeRef() as CFArrayRef) };
    array.iter().filter_map(|item| cftype_to_element(&item)).collect()
}

impl AccessibleElement for AxElement {
    fn role(&self) -> Lookup<String> {
        self.string_attribute("AXRole")
    }

    fn title(&self) -> Lookup<String> {
        self.string_attribute("AXTitle")
    }

    fn description(&self) -> Lookup<String> {
        self.string_attribute("AXDescription")
    }

    fn help(&self) -> Lookup<String> {
        self.string_attribute("AXHelp")
    }

    fn numeric_value(&self) -> Lookup<i64> {
        self.copy_attribute("AXValue").and_then(|value| cftype_to_i64(&value).into())
    }

    fn index(&self) -> Lookup<usize> {
        self.copy_attribute("AXIndex")
            .and_then(|value| cftype_to_i64(&value).and_then(|n| usize::try_from(n).ok()).into())
    }

    fn children(&self) -> Vec<Self> {
        self.element_array("AXChildren")
    }

    fn parent(&self) -> Lookup<Self> {
        self.copy_attribute("AXParent").and_then(|value| cftype_to_element(&value).into())
    }

    fn rows(&self) -> Vec<Self> {
        self.element_array("AXRows")
    }

    fn visible_rows(&self) -> Vec<Self> {
        self.element_array("AXVisibleRows")
    }

    fn windows(&self) -> Vec<Self> {
        self.element_array("AXWindows")
    }

    fn is_selected(&self) -> bool {
        match self.copy_attribute("AXSelected") {
            Lookup::Found(value) => cftype_to_i64(&value).map(|v| v != 0).unwrap_or(false),
            Lookup::NotFound => false,
            Lookup::PlatformError(failure) => {
                log::debug!("[WX-AX] {}", failure);
                false
            }
        }
    }

    fn set_selected(&self, selected: bool) -> Result<(), PlatformFailure> {
        let value = if selected { CFBoolean::true_value() } else { CFBoolean::false_value() };
        self.set_attribute("AXSelected", value.as_CFTypeRef())
    }

    fn set_text_value(&self, text: &str) -> Result<(), PlatformFailure> {
        let value = CFString::new(text);
        self.set_attribute("AXValue", value.as_CFTypeRef())
    }

    fn action_names(&self) -> Vec<String> {
        let mut names: CFArrayRef = std::ptr::null();
        let code = unsafe { AXUIElementCopyActionNames(self.0.as_concrete_TypeRef(), &mut names) };
        if code != kAXErrorSuccess || names.is_null() {
            if code != kAXErrorSuccess {
                log::debug!("[WX-AX] {}", PlatformFailure::new("actions", code));
            }
            return Vec::new();
        }
        let names: CFArray<CFString> = unsafe { CFArray::wrap_under_create_rule(names) };
        names.iter().map(|name| name.to_string()).collect()
    }

    fn perform_action(&self, action: &str) -> Result<(), PlatformFailure> {
        let name = CFString::new(action);
        let code = unsafe { AXUIElementPerformAction(self.0.as_concrete_TypeRef(), name.as_concrete_TypeRef()) };
        if code == kAXErrorSuccess {
            Ok(())
        } else {
            Err(PlatformFailure::new(action, code))
        }
    }

    fn frame(&self) -> Lookup<Frame> {
        self.copy_attribute("AXFrame").and_then(|value| {
            let ax_value = value.as_CFTypeRef() as AXValueRef;
            let mut rect = CGRect::new(&CGPoint::new(0.0, 0.0), &CGSize::new(0.0, 0.0));
            let ok = unsafe {
                AXValueGetType(ax_value) == kAXValueTypeCGRect
                    && AXValueGetValue(ax_value, kAXValueTypeCGRect, &mut rect as *mut CGRect as *mut c_void)
            };
            if !ok {
                return Lookup::NotFound;
            }
            Lookup::Found(Frame {
                x: rect.origin.x,
                y: rect.origin.y,
                width: rect.size.width,
                height: rect.size.height,
            })
        })
    }
}
