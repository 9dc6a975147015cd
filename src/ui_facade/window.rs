/*
 * The wrapper side of the window-object association.
 *
 * `WindowObject` is the base state every wrapper embeds: the handle slot, the
 * native operations it talks through, and the declarative routing tables the
 * router consults. `WindowHandler` is the dispatch surface: one method per
 * well-known message category, all defaulting to "not handled". A handler marks
 * a message as handled by calling `ctx.set_handled(result)`.
 *
 * Handlers take `&self`. Nested pumps re-enter a wrapper while an outer handler
 * of the same wrapper is still on the stack, so per-window mutable state belongs
 * in `Cell`/`RefCell` fields that are never borrowed across a call back into
 * the platform.
 */

use crate::platform_layer::error::{FacadeError, Result as FacadeResult};
use crate::platform_layer::native::NativeWindowOperations;
use crate::platform_layer::types::{
    CommandEvent, ControlEvent, ControlId, CtlColorRequest, Handle, KeyEvent, Message,
    MinMaxInfo, MouseEvent, Point, Rect, ResizeKind, ScrollEvent, Size,
};
use crate::ui_description_layer::command_table::{CommandChain, CommandDispatchTable};
use crate::ui_description_layer::control_table::ControlMessageTable;
use crate::ui_facade::context::DispatchContext;
use crate::ui_facade::dialog::DialogHandler;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub struct WindowObject {
    native: Rc<dyn NativeWindowOperations>,
    handle: Cell<Option<Handle>>,
    control_table: ControlMessageTable,
    commands: CommandChain,
}

impl WindowObject {
    /// Creates an unbound wrapper; no native window is created.
    pub fn new(native: Rc<dyn NativeWindowOperations>) -> Self {
        Self {
            native,
            handle: Cell::new(None),
            control_table: ControlMessageTable::new(),
            commands: CommandChain::new(),
        }
    }

    pub fn with_control_table(mut self, table: ControlMessageTable) -> Self {
        self.control_table = table;
        self
    }

    /// Appends a command table; tables are consulted in the order they were added.
    pub fn with_command_table(mut self, table: Rc<CommandDispatchTable>) -> Self {
        self.commands.push(table);
        self
    }

    pub fn native(&self) -> &Rc<dyn NativeWindowOperations> {
        &self.native
    }

    pub fn handle(&self) -> Option<Handle> {
        self.handle.get()
    }

    pub fn is_bound(&self) -> bool {
        self.handle.get().is_some()
    }

    pub fn control_table(&self) -> &ControlMessageTable {
        &self.control_table
    }

    pub fn commands(&self) -> &CommandChain {
        &self.commands
    }

    pub(crate) fn bind(&self, handle: Handle) {
        self.handle.set(Some(handle));
    }

    pub(crate) fn unbind(&self) {
        self.handle.set(None);
    }

    fn bound_handle(&self) -> FacadeResult<Handle> {
        self.handle.get().ok_or(FacadeError::NotBound)
    }

    /// Returns whether the window was previously visible.
    pub fn show(&self) -> FacadeResult<bool> {
        let handle = self.bound_handle()?;
        Ok(self.native.show_window(handle, true))
    }

    pub fn hide(&self) -> FacadeResult<bool> {
        let handle = self.bound_handle()?;
        Ok(self.native.show_window(handle, false))
    }

    pub fn is_visible(&self) -> FacadeResult<bool> {
        Ok(self.native.is_visible(self.bound_handle()?))
    }

    pub fn enable(&self, enabled: bool) -> FacadeResult<bool> {
        let handle = self.bound_handle()?;
        Ok(self.native.enable_window(handle, enabled))
    }

    pub fn is_enabled(&self) -> FacadeResult<bool> {
        Ok(self.native.is_enabled(self.bound_handle()?))
    }

    pub fn move_to(&self, rect: Rect) -> FacadeResult<()> {
        self.native.set_window_rect(self.bound_handle()?, rect)
    }

    pub fn window_rect(&self) -> FacadeResult<Rect> {
        self.native.window_rect(self.bound_handle()?)
    }

    pub fn client_rect(&self) -> FacadeResult<Rect> {
        self.native.client_rect(self.bound_handle()?)
    }

    pub fn set_text(&self, text: &str) -> FacadeResult<()> {
        self.native.set_window_text(self.bound_handle()?, text)
    }

    pub fn text(&self) -> FacadeResult<String> {
        self.native.window_text(self.bound_handle()?)
    }

    /// Synchronous send; may re-enter any wrapper on this thread before returning.
    pub fn send_message(&self, message: Message) -> FacadeResult<isize> {
        let handle = self.bound_handle()?;
        Ok(self.native.send_message(handle, message))
    }

    pub fn post_message(&self, message: Message) -> FacadeResult<()> {
        self.native.post_message(self.bound_handle()?, message)
    }

    pub fn set_timer(&self, timer_id: usize, interval_ms: u32) -> FacadeResult<()> {
        self.native
            .set_timer(self.bound_handle()?, timer_id, interval_ms)
    }

    pub fn kill_timer(&self, timer_id: usize) -> FacadeResult<()> {
        self.native.kill_timer(self.bound_handle()?, timer_id)
    }

    pub fn invalidate(&self, erase: bool) -> FacadeResult<()> {
        self.native.invalidate(self.bound_handle()?, erase)
    }

    pub fn set_focus(&self) -> FacadeResult<()> {
        self.native.set_focus(self.bound_handle()?)
    }

    pub fn parent(&self) -> FacadeResult<Option<Handle>> {
        Ok(self.native.parent(self.bound_handle()?))
    }

    pub fn dlg_item(&self, id: ControlId) -> FacadeResult<Option<Handle>> {
        Ok(self.native.dlg_item(self.bound_handle()?, id))
    }

    /*
     * Destroys the native window. The destroy notifications are delivered before
     * this returns, so the wrapper is unbound (and its association removed) by
     * the time the call completes.
     */
    pub fn destroy(&self) -> FacadeResult<()> {
        let handle = self.bound_handle()?;
        log::debug!("WindowObject: Destroying window {handle:?}.");
        self.native.destroy_window(handle)
    }
}

impl fmt::Debug for WindowObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowObject")
            .field("handle", &self.handle.get())
            .field("control_table", &self.control_table)
            .field("commands", &self.commands)
            .finish()
    }
}

pub trait WindowHandler {
    fn window(&self) -> &WindowObject;

    /// Set the result to -1 to veto creation.
    fn on_create(&self, _ctx: &mut DispatchContext) {}
    fn on_destroy(&self, _ctx: &mut DispatchContext) {}

    /// Runs after the association is gone; the wrapper is already unbound.
    fn on_final_message(&self) {}

    fn on_close(&self, _ctx: &mut DispatchContext) {}
    fn on_paint(&self, _ctx: &mut DispatchContext) {}
    fn on_size(&self, _ctx: &mut DispatchContext, _kind: ResizeKind, _client: Size) {}
    fn on_move(&self, _ctx: &mut DispatchContext, _client_origin: Point) {}
    fn on_timer(&self, _ctx: &mut DispatchContext, _timer_id: usize) {}
    fn on_scroll(&self, _ctx: &mut DispatchContext, _event: &ScrollEvent) {}
    fn on_focus(&self, _ctx: &mut DispatchContext, _gained: bool) {}
    fn on_key(&self, _ctx: &mut DispatchContext, _event: &KeyEvent) {}
    fn on_char(&self, _ctx: &mut DispatchContext, _ch: char) {}
    fn on_mouse(&self, _ctx: &mut DispatchContext, _event: &MouseEvent) {}
    fn on_context_menu(&self, _ctx: &mut DispatchContext, _source: Option<Handle>, _at: Point) {}

    /// Runs after the command tables have updated the menu items.
    fn on_init_menu_popup(&self, _ctx: &mut DispatchContext, _menu: usize) {}

    /// Commands no command table or control table recognised.
    fn on_command(&self, _ctx: &mut DispatchContext, _event: &CommandEvent) {}
    fn on_notify(&self, _ctx: &mut DispatchContext, _event: &ControlEvent) {}
    fn on_draw_item(&self, _ctx: &mut DispatchContext, _event: &ControlEvent) {}
    fn on_ctl_color(&self, _ctx: &mut DispatchContext, _request: &CtlColorRequest) {}
    fn on_get_min_max_info(&self, _ctx: &mut DispatchContext, _info: &mut MinMaxInfo) {}

    /// A notification this window sent to its parent, reflected back to it.
    fn on_reflected_notification(&self, _ctx: &mut DispatchContext, _event: &ControlEvent) {}

    /// Messages in the application-defined range.
    fn on_app_message(&self, _ctx: &mut DispatchContext, _message: Message) {}
    fn on_message(&self, _ctx: &mut DispatchContext, _message: Message) {}
}

/// Upcast helper so dialog trait objects can be dispatched as plain windows.
pub trait AsWindowHandler {
    fn as_window_handler(&self) -> &dyn WindowHandler;
}

impl<T: WindowHandler> AsWindowHandler for T {
    fn as_window_handler(&self) -> &dyn WindowHandler {
        self
    }
}

/// A strong reference to a registered wrapper.
#[derive(Clone)]
pub enum WindowRef {
    Window(Rc<dyn WindowHandler>),
    Dialog(Rc<dyn DialogHandler>),
}

impl WindowRef {
    pub fn from_window<T: WindowHandler + 'static>(window: &Rc<T>) -> Self {
        WindowRef::Window(Rc::clone(window) as Rc<dyn WindowHandler>)
    }

    pub fn from_dialog<T: DialogHandler + 'static>(dialog: &Rc<T>) -> Self {
        WindowRef::Dialog(Rc::clone(dialog) as Rc<dyn DialogHandler>)
    }

    pub fn handler(&self) -> &dyn WindowHandler {
        match self {
            WindowRef::Window(window) => window.as_ref(),
            WindowRef::Dialog(dialog) => dialog.as_window_handler(),
        }
    }

    pub fn dialog(&self) -> Option<&Rc<dyn DialogHandler>> {
        match self {
            WindowRef::Dialog(dialog) => Some(dialog),
            WindowRef::Window(_) => None,
        }
    }

    pub fn object(&self) -> &WindowObject {
        self.handler().window()
    }

    fn data_ptr(&self) -> *const () {
        match self {
            WindowRef::Window(window) => Rc::as_ptr(window) as *const (),
            WindowRef::Dialog(dialog) => Rc::as_ptr(dialog) as *const (),
        }
    }

    /// Identity comparison of the referenced wrappers.
    pub fn ptr_eq(&self, other: &WindowRef) -> bool {
        self.data_ptr() == other.data_ptr()
    }
}

impl fmt::Debug for WindowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            WindowRef::Window(_) => "Window",
            WindowRef::Dialog(_) => "Dialog",
        };
        f.debug_struct("WindowRef")
            .field("kind", &kind)
            .field("handle", &self.object().handle())
            .finish()
    }
}
