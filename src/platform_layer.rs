/*
 * The native side of the facade: the window/dialog contract the dispatch core
 * is written against, its Win32 and headless implementations, and the types,
 * message constants and error type both sides share.
 */
pub mod error;
pub mod headless;
pub mod messages;
pub mod native;
pub mod reporting;
pub mod types;
#[cfg(target_os = "windows")]
pub mod win32;

pub use error::{FacadeError, Result as FacadeResult};
pub use headless::HeadlessNative;
pub use native::NativeWindowOperations;
pub use reporting::{UnhandledError, clear_unhandled_error_reporter, set_unhandled_error_reporter};
pub use types::{
    CommandEvent, CommandId, CommandUi, ControlEvent, ControlId, CreateParams, DialogLayout,
    DialogTemplate, Handle, Message, MessageClass, Point, Rect, Size, WindowClass,
};
#[cfg(target_os = "windows")]
pub use win32::Win32Native;
