/*
 * Defines the seam between the dispatch core and the native windowing system.
 *
 * `NativeWindowOperations` lists every platform primitive the core needs: class
 * registration, window and dialog creation, the default window procedure,
 * synchronous and posted messages, visibility/geometry/text/timers, the modal
 * dialog machinery and the message loop. The dispatch core only talks to the
 * platform through this trait, so the same core runs on top of the Win32
 * backend (`Win32Native`) or the in-process `HeadlessNative`, and tests can
 * drive it without a desktop session.
 *
 * Every backend calls back into exactly two shared procedures:
 * `ui_facade::popup::popup_window_proc` for ordinary windows and
 * `ui_facade::dialog::dialog_proc` for dialogs.
 */

use super::error::Result as FacadeResult;
use super::types::{
    CommandId, CommandUi, ControlId, CreateParams, DialogTemplate, Handle, Message, Rect,
    WindowClass,
};

pub trait NativeWindowOperations {
    /// True when a window class of this name is already registered in the process.
    fn class_registered(&self, class_name: &str) -> bool;

    /// Registers a class whose window procedure is the shared popup procedure.
    fn register_class(&self, class: &WindowClass) -> FacadeResult<()>;

    /*
     * Creates a window of a registered class. `create_param` is delivered
     * untouched in the creation structure of the first creation messages, which
     * may be dispatched before this call returns.
     */
    fn create_window(
        &self,
        class_name: &str,
        params: &CreateParams,
        create_param: isize,
    ) -> FacadeResult<Handle>;

    /// Platform default processing for a popup window message.
    fn default_window_proc(&self, handle: Handle, message: Message) -> isize;

    /*
     * Creates a modeless dialog. The dialog procedure receives `init_param` as
     * the lparam of its initialization message before this call returns.
     */
    fn create_dialog(
        &self,
        template: &DialogTemplate,
        owner: Option<Handle>,
        init_param: isize,
    ) -> FacadeResult<Handle>;

    /*
     * Creates a modal dialog and pumps messages until `end_dialog` is called for
     * it. Returns the end code.
     */
    fn dialog_box(
        &self,
        template: &DialogTemplate,
        owner: Option<Handle>,
        init_param: isize,
    ) -> FacadeResult<isize>;

    /// Ends a modal dialog; the nested pump of `dialog_box` returns `code`.
    fn end_dialog(&self, handle: Handle, code: isize) -> FacadeResult<()>;

    /// Stores the result of a handled dialog message (`DWLP_MSGRESULT`).
    fn set_dialog_message_result(&self, handle: Handle, result: isize);

    fn destroy_window(&self, handle: Handle) -> FacadeResult<()>;

    fn is_window(&self, handle: Handle) -> bool;

    /// Synchronous delivery; returns once the target's handler has returned.
    fn send_message(&self, handle: Handle, message: Message) -> isize;

    /// Queues a message for the message loop.
    fn post_message(&self, handle: Handle, message: Message) -> FacadeResult<()>;

    /// Returns whether the window was previously visible.
    fn show_window(&self, handle: Handle, visible: bool) -> bool;

    fn is_visible(&self, handle: Handle) -> bool;

    /// Returns whether the window was previously disabled.
    fn enable_window(&self, handle: Handle, enabled: bool) -> bool;

    fn is_enabled(&self, handle: Handle) -> bool;

    /// Child windows use parent client coordinates, top-level windows screen coordinates.
    fn set_window_rect(&self, handle: Handle, rect: Rect) -> FacadeResult<()>;

    /// Same coordinate space as `set_window_rect`.
    fn window_rect(&self, handle: Handle) -> FacadeResult<Rect>;

    fn client_rect(&self, handle: Handle) -> FacadeResult<Rect>;

    fn set_window_text(&self, handle: Handle, text: &str) -> FacadeResult<()>;

    fn window_text(&self, handle: Handle) -> FacadeResult<String>;

    fn parent(&self, handle: Handle) -> Option<Handle>;

    fn dlg_item(&self, dialog: Handle, id: ControlId) -> Option<Handle>;

    fn control_id(&self, handle: Handle) -> Option<ControlId>;

    fn set_focus(&self, handle: Handle) -> FacadeResult<()>;

    fn invalidate(&self, handle: Handle, erase: bool) -> FacadeResult<()>;

    fn set_timer(&self, handle: Handle, timer_id: usize, interval_ms: u32) -> FacadeResult<()>;

    fn kill_timer(&self, handle: Handle, timer_id: usize) -> FacadeResult<()>;

    /// The usable desktop area, in screen coordinates.
    fn work_area(&self) -> Rect;

    /// Command ids of the items of a popup menu, separators and submenus excluded.
    fn menu_item_ids(&self, menu: usize) -> Vec<CommandId>;

    fn apply_menu_item_state(&self, menu: usize, id: CommandId, state: &CommandUi);

    /// Runs the top-level message loop until a quit request; returns its exit code.
    fn run_message_loop(&self) -> i32;

    fn post_quit(&self, exit_code: i32);

    /// Shows a blocking error message box.
    fn show_error_message(&self, owner: Option<Handle>, title: &str, text: &str);
}
