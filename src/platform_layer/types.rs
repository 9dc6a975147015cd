/*
 * This module defines the core data types shared by the dispatch core and the
 * native backends. It includes the opaque window `Handle`, the raw `Message`
 * tuple delivered by the platform, geometry primitives, logical control and
 * command identifiers, the decoded event payloads handed to typed handler
 * methods, and the parameter structs of the window/dialog creation contract.
 */

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

// An opaque identifier for a live native window.
//
// The platform assigns it and controls its lifetime. The null value cannot be
// represented, so "no window" is always spelled `Option<Handle>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(NonZeroUsize);

impl Handle {
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Handle)
    }

    pub const fn from_non_zero(raw: NonZeroUsize) -> Self {
        Handle(raw)
    }

    pub fn raw(self) -> usize {
        self.0.get()
    }

    /// Reads a handle carried in an `LPARAM` slot (e.g. the control of a `WM_COMMAND`).
    pub fn from_lparam(lparam: isize) -> Option<Self> {
        Self::from_raw(lparam as usize)
    }

    pub fn as_lparam(self) -> isize {
        self.raw() as isize
    }
}

/// One raw platform message: `(message-id, wparam, lparam)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub id: u32,
    pub wparam: usize,
    pub lparam: isize,
}

impl Message {
    pub const fn new(id: u32, wparam: usize, lparam: isize) -> Self {
        Self { id, wparam, lparam }
    }
}

// Logical identifier of a child control inside its parent (the dialog item id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(i32);

impl ControlId {
    pub const fn new(raw: i32) -> Self {
        ControlId(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }
}

// A command identifier: menu item, toolbar button or accelerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub u32);

// --- Geometry ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(
            origin.x,
            origin.y,
            origin.x + size.width,
            origin.y + size.height,
        )
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub const fn origin(&self) -> Point {
        Point {
            x: self.left,
            y: self.top,
        }
    }

    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }
}

// --- Decoded event payloads ---

/// The `wparam` of a resize notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeKind {
    Restored,
    Minimized,
    Maximized,
    OtherRestored,
    OtherMaximized,
}

impl ResizeKind {
    pub fn from_wparam(wparam: usize) -> Self {
        match wparam {
            1 => ResizeKind::Minimized,
            2 => ResizeKind::Maximized,
            3 => ResizeKind::OtherRestored,
            4 => ResizeKind::OtherMaximized,
            _ => ResizeKind::Restored,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBar {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollEvent {
    pub bar: ScrollBar,
    /// The `SB_*` request code.
    pub request: u16,
    /// Thumb position for `SB_THUMBPOSITION`/`SB_THUMBTRACK`.
    pub position: u16,
    /// The scroll-bar control that sent it, `None` for the window's own bars.
    pub source: Option<Handle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub virtual_key: u32,
    pub pressed: bool,
    pub repeat_count: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Move,
    Down(MouseButton),
    Up(MouseButton),
    DoubleClick(MouseButton),
    Wheel { delta: i16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub action: MouseAction,
    /// Client coordinates, or screen coordinates for wheel messages.
    pub position: Point,
    /// The `MK_*` modifier bits.
    pub modifiers: u16,
}

/// A menu/accelerator or control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEvent {
    pub id: CommandId,
    /// Notification code: 0 for menus, 1 for accelerators, control-specific otherwise.
    pub code: u16,
    pub source: Option<Handle>,
}

/// The kind of child-control message a notification arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageClass {
    Command,
    Notify,
    DrawItem,
    CtlColor,
    Scroll,
}

/*
 * A notification from a child control to its parent, decoded once by the router.
 * It is handed to the child's reflected handler, to the parent's control table
 * and to the parent's typed fallback. `message` keeps the raw tuple so handlers
 * can reach control-specific payloads (e.g. the structure behind a `WM_NOTIFY`).
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub class: MessageClass,
    pub control_id: ControlId,
    pub code: u32,
    pub source: Option<Handle>,
    pub message: Message,
}

// Mirrors the native notification header (`NMHDR`) that a `WM_NOTIFY` lparam points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyHeader {
    pub hwnd_from: usize,
    pub id_from: usize,
    pub code: u32,
}

// Mirrors `MINMAXINFO`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MinMaxInfo {
    pub reserved: Point,
    pub max_size: Point,
    pub max_position: Point,
    pub min_track_size: Point,
    pub max_track_size: Point,
}

// First field of the native creation structure (`CREATESTRUCTW::lpCreateParams`).
#[repr(C)]
#[derive(Debug)]
pub struct CreateStructPrefix {
    pub create_params: *mut std::ffi::c_void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtlColorRequest {
    pub class: MessageClass,
    /// Opaque device context handle.
    pub device_context: usize,
    pub control: Option<Handle>,
}

/// Enabled/checked/text state computed by a command table's update handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandUi {
    pub enabled: bool,
    pub checked: bool,
    pub text: Option<String>,
}

impl Default for CommandUi {
    fn default() -> Self {
        Self {
            enabled: true,
            checked: false,
            text: None,
        }
    }
}

// --- Creation contract ---

// Class-level parameters of a popup window, registered once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClass {
    pub name: String,
    /// `CS_*` style bits.
    pub style: u32,
    /// System color index used for the background brush, `None` for no brush.
    pub background_color: Option<i32>,
}

impl WindowClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            style: crate::platform_layer::messages::CS_HREDRAW
                | crate::platform_layer::messages::CS_VREDRAW,
            background_color: Some(crate::platform_layer::messages::COLOR_WINDOW),
        }
    }
}

// Instance-level parameters of one popup window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateParams {
    pub title: String,
    /// `WS_*` style bits.
    pub style: u32,
    pub ex_style: u32,
    /// Initial rectangle; `None` lets the platform pick a default position and size.
    pub rect: Option<Rect>,
    pub parent: Option<Handle>,
    /// Menu handle for top-level windows, or the control id for child windows.
    pub menu_or_id: usize,
}

impl Default for CreateParams {
    fn default() -> Self {
        Self {
            title: String::new(),
            style: crate::platform_layer::messages::WS_OVERLAPPEDWINDOW
                | crate::platform_layer::messages::WS_CLIPCHILDREN,
            ex_style: 0,
            rect: None,
            parent: None,
            menu_or_id: 0,
        }
    }
}

// One child control inside an in-memory dialog layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogItem {
    pub id: ControlId,
    /// Predefined control class name ("Button", "Edit", "Static", ...).
    pub class_name: String,
    pub text: String,
    pub rect: Rect,
    pub style: u32,
}

// An in-memory dialog description, in dialog units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogLayout {
    pub title: String,
    pub size: Size,
    pub style: u32,
    pub font_name: String,
    pub font_size: u16,
    pub items: Vec<DialogItem>,
}

impl DialogLayout {
    pub fn new(title: impl Into<String>, size: Size) -> Self {
        Self {
            title: title.into(),
            size,
            style: crate::platform_layer::messages::DS_MODALFRAME
                | crate::platform_layer::messages::WS_POPUP
                | crate::platform_layer::messages::WS_CAPTION
                | crate::platform_layer::messages::WS_SYSMENU,
            font_name: "MS Shell Dlg".to_string(),
            font_size: 8,
            items: Vec::new(),
        }
    }

    pub fn item(
        mut self,
        id: ControlId,
        class_name: &str,
        text: &str,
        rect: Rect,
        style: u32,
    ) -> Self {
        self.items.push(DialogItem {
            id,
            class_name: class_name.to_string(),
            text: text.to_string(),
            rect,
            style,
        });
        self
    }
}

/// The opaque template identifier handed to the dialog creation primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogTemplate {
    /// A template compiled into the executable's resources.
    Resource(u16),
    /// A template built in memory.
    Inline(DialogLayout),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_raw_value_is_not_a_handle() {
        assert_eq!(Handle::from_raw(0), None);
        assert_eq!(Handle::from_lparam(0), None);
        let handle = Handle::from_raw(0x1234).unwrap();
        assert_eq!(Handle::from_lparam(handle.as_lparam()), Some(handle));
    }

    #[test]
    fn rect_size_and_offset() {
        let rect = Rect::from_origin_size(Point { x: 10, y: 20 }, Size::new(30, 40));
        assert_eq!(rect, Rect::new(10, 20, 40, 60));
        assert_eq!(rect.size(), Size::new(30, 40));
        assert_eq!(rect.offset(-10, 5), Rect::new(0, 25, 30, 65));
    }

    #[test]
    fn resize_kind_decodes_wparam() {
        assert_eq!(ResizeKind::from_wparam(0), ResizeKind::Restored);
        assert_eq!(ResizeKind::from_wparam(2), ResizeKind::Maximized);
        assert_eq!(ResizeKind::from_wparam(99), ResizeKind::Restored);
    }
}
