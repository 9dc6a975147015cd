#[cfg(target_os = "windows")]
use windows::core::Error as WinError;

use super::types::Handle;

// Represents errors that can occur within the facade.
//
// Creation failures come back from the native layer; registry and binding
// failures are invariant violations and are always logged where they are raised.
#[derive(Debug, Clone)]
pub enum FacadeError {
    /// An error originating from the Windows API.
    #[cfg(target_os = "windows")]
    Win32(WinError),
    /// Failure during the initialization of the facade or its components.
    InitializationFailed(String),
    /// Registering a native window class failed.
    ClassRegistrationFailed(String),
    /// Failure to create a native window.
    WindowCreationFailed(String),
    /// Failure to create a dialog from its template.
    DialogCreationFailed(String),
    /// A second association was requested for a handle that is still live.
    DuplicateHandle(Handle),
    /// The handle (or object) has no association in the registry.
    NotRegistered(String),
    /// A handle-based operation was called on an object without a native window.
    NotBound,
    /// The native layer does not know this handle.
    InvalidHandle(String),
    /// A requested operation could not be completed.
    OperationFailed(String),
    /// Loading or saving the facade configuration failed.
    Config(String),
}

#[cfg(target_os = "windows")]
impl From<WinError> for FacadeError {
    fn from(err: WinError) -> Self {
        FacadeError::Win32(err)
    }
}

impl std::fmt::Display for FacadeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(target_os = "windows")]
            FacadeError::Win32(e) => write!(f, "Win32 Error: {e}"),
            FacadeError::InitializationFailed(s) => write!(f, "Initialization Failed: {s}"),
            FacadeError::ClassRegistrationFailed(s) => {
                write!(f, "Window Class Registration Failed: {s}")
            }
            FacadeError::WindowCreationFailed(s) => write!(f, "Window Creation Failed: {s}"),
            FacadeError::DialogCreationFailed(s) => write!(f, "Dialog Creation Failed: {s}"),
            FacadeError::DuplicateHandle(h) => {
                write!(f, "Handle {h:?} already has a live association")
            }
            FacadeError::NotRegistered(s) => write!(f, "Not Registered: {s}"),
            FacadeError::NotBound => write!(f, "Object is not bound to a native window"),
            FacadeError::InvalidHandle(s) => write!(f, "Invalid Handle: {s}"),
            FacadeError::OperationFailed(s) => write!(f, "Operation Failed: {s}"),
            FacadeError::Config(s) => write!(f, "Configuration Error: {s}"),
        }
    }
}

impl std::error::Error for FacadeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(target_os = "windows")]
            FacadeError::Win32(e) => Some(e),
            _ => None,
        }
    }
}

/// A specialized `Result` type for facade operations.
pub type Result<T> = std::result::Result<T, FacadeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_duplicate_handle() {
        let handle = Handle::from_raw(0x42).unwrap();
        let text = FacadeError::DuplicateHandle(handle).to_string();
        assert!(text.contains("66"), "unexpected text: {text}");
        assert!(text.contains("live association"));
    }

    #[test]
    fn not_bound_has_no_source() {
        use std::error::Error;
        assert!(FacadeError::NotBound.source().is_none());
    }
}
