/*
 * Dialogs: template-based windows whose procedure is the shared `dialog_proc`.
 *
 * A dialog is bound late. The wrapper reaches its window as the init parameter
 * of the creation call and is associated when `WM_INITDIALOG` arrives, before
 * anything else runs for it. Initialization then centres a modal dialog, binds
 * the child wrappers its control table declares, captures the gravity layout
 * and finally calls `on_init_dialog`.
 *
 * While a modal dialog runs, `IDOK`/`IDCANCEL` are intercepted: when
 * `can_close` agrees the dialog ends with that code and nothing else sees the
 * command. The modal run itself is a nested pump inside the native layer; any
 * number of them can be stacked.
 *
 * Lifecycle: Unbound -> Bound (WM_INITDIALOG) -> Closed (WM_NCDESTROY).
 * A closed dialog can be run again.
 */

use crate::platform_layer::error::{FacadeError, Result as FacadeResult};
use crate::platform_layer::messages::{
    BN_CLICKED, IDCANCEL, IDOK, WM_COMMAND, WM_INITDIALOG, WM_NCDESTROY, WM_SIZE,
    dialog_returns_directly, hiword_from_lparam, hiword_from_wparam, loword_from_lparam,
    loword_from_wparam,
};
use crate::platform_layer::native::NativeWindowOperations;
use crate::platform_layer::types::{DialogTemplate, Handle, Message, Point, Rect, Size};
use crate::ui_description_layer::command_table::CommandDispatchTable;
use crate::ui_description_layer::control_table::ControlMessageTable;
use crate::ui_description_layer::gravity::{GravityTable, apply_layout};
use crate::ui_facade::context::{DispatchContext, DispatchFrame};
use crate::ui_facade::registry::{self, HandleRegistry};
use crate::ui_facade::router::{dispatch_guarded, route};
use crate::ui_facade::window::{AsWindowHandler, WindowHandler, WindowObject, WindowRef};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    Unbound,
    Bound,
    Closed,
}

pub struct Dialog {
    window: WindowObject,
    template: DialogTemplate,
    phase: Cell<DialogPhase>,
    modal: Cell<bool>,
    end_code: Cell<Option<isize>>,
    center_modal: Cell<bool>,
    gravity: RefCell<GravityTable>,
    bound_children: RefCell<Vec<Handle>>,
}

impl Dialog {
    pub fn new(native: Rc<dyn NativeWindowOperations>, template: DialogTemplate) -> Self {
        Self {
            window: WindowObject::new(native),
            template,
            phase: Cell::new(DialogPhase::Unbound),
            modal: Cell::new(false),
            end_code: Cell::new(None),
            center_modal: Cell::new(true),
            gravity: RefCell::new(GravityTable::new()),
            bound_children: RefCell::new(Vec::new()),
        }
    }

    pub fn with_control_table(mut self, table: ControlMessageTable) -> Self {
        self.window = self.window.with_control_table(table);
        self
    }

    pub fn with_command_table(mut self, table: Rc<CommandDispatchTable>) -> Self {
        self.window = self.window.with_command_table(table);
        self
    }

    pub fn with_gravity(self, gravity: GravityTable) -> Self {
        self.gravity.replace(gravity);
        self
    }

    /// Whether a modal run centres the dialog on its owner (or the work area).
    pub fn centered(self, center: bool) -> Self {
        self.center_modal.set(center);
        self
    }

    pub fn window(&self) -> &WindowObject {
        &self.window
    }

    pub fn template(&self) -> &DialogTemplate {
        &self.template
    }

    pub fn phase(&self) -> DialogPhase {
        self.phase.get()
    }

    pub fn is_modal(&self) -> bool {
        self.modal.get()
    }

    /// The code the last run ended with, if it ended through `end`.
    pub fn end_code(&self) -> Option<isize> {
        self.end_code.get()
    }

    pub fn bound_children(&self) -> Vec<Handle> {
        self.bound_children.borrow().clone()
    }

    /*
     * Ends the run. A modal dialog leaves its nested pump with `code`; a
     * modeless one is destroyed.
     */
    pub fn end(&self, code: isize) -> FacadeResult<()> {
        let handle = self.window.handle().ok_or(FacadeError::NotBound)?;
        log::debug!("Dialog: Ending {handle:?} with code {code}.");
        if self.modal.get() {
            self.window.native().end_dialog(handle, code)?;
        } else {
            self.window.native().destroy_window(handle)?;
        }
        self.end_code.set(Some(code));
        Ok(())
    }

    fn prepare_run(&self, modal: bool) -> FacadeResult<()> {
        if self.phase.get() == DialogPhase::Bound {
            log::error!("Dialog: Refusing to run a dialog that is already running.");
            return Err(FacadeError::OperationFailed(
                "dialog is already running".to_string(),
            ));
        }
        self.modal.set(modal);
        self.end_code.set(None);
        Ok(())
    }
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialog")
            .field("window", &self.window)
            .field("template", &self.template)
            .field("phase", &self.phase.get())
            .field("modal", &self.modal.get())
            .field("end_code", &self.end_code.get())
            .finish_non_exhaustive()
    }
}

pub trait DialogHandler: WindowHandler + AsWindowHandler {
    fn dialog(&self) -> &Dialog;

    /// Runs once bound. Leave the message unhandled to let the platform set the default focus.
    fn on_init_dialog(&self, _ctx: &mut DispatchContext) {}

    /// Consulted before a modal dialog ends on `IDOK`/`IDCANCEL`.
    fn can_close(&self, _code: isize) -> bool {
        true
    }

    /// Runs the dialog modally and returns its end code.
    fn run_modal(self: &Rc<Self>, owner: Option<Handle>) -> FacadeResult<isize>
    where
        Self: Sized + 'static,
    {
        run_modal(&WindowRef::from_dialog(self), owner)
    }

    fn run_modeless(self: &Rc<Self>, owner: Option<Handle>) -> FacadeResult<Handle>
    where
        Self: Sized + 'static,
    {
        run_modeless(&WindowRef::from_dialog(self), owner)
    }

    fn end_dialog(&self, code: isize) -> FacadeResult<()> {
        self.dialog().end(code)
    }

    fn close(&self) -> FacadeResult<()> {
        self.end_dialog(IDCANCEL as isize)
    }
}

fn dialog_of(object: &WindowRef) -> FacadeResult<&Rc<dyn DialogHandler>> {
    object.dialog().ok_or_else(|| {
        log::error!("Dialog: {object:?} is not a dialog.");
        FacadeError::OperationFailed("not a dialog".to_string())
    })
}

pub fn run_modal(object: &WindowRef, owner: Option<Handle>) -> FacadeResult<isize> {
    let state = dialog_of(object)?.dialog();
    state.prepare_run(true)?;
    let native = Rc::clone(state.window.native());

    // Read back by `dialog_proc` during WM_INITDIALOG, inside `dialog_box`.
    let pending = object.clone();
    let init_param = &pending as *const WindowRef as isize;
    log::debug!("Dialog: Running modal dialog (owner {owner:?}).");
    match native.dialog_box(&state.template, owner, init_param) {
        Ok(code) => {
            log::debug!("Dialog: Modal run ended with code {code}.");
            Ok(code)
        }
        Err(e) => {
            log::error!("Dialog: Modal run failed: {e}");
            state.modal.set(false);
            Err(e)
        }
    }
}

pub fn run_modeless(object: &WindowRef, owner: Option<Handle>) -> FacadeResult<Handle> {
    let state = dialog_of(object)?.dialog();
    state.prepare_run(false)?;
    let native = Rc::clone(state.window.native());

    let pending = object.clone();
    let init_param = &pending as *const WindowRef as isize;
    let handle = match native.create_dialog(&state.template, owner, init_param) {
        Ok(handle) => handle,
        Err(e) => {
            log::error!("Dialog: Creating a modeless dialog failed: {e}");
            return Err(e);
        }
    };
    if !state.window.is_bound() && native.is_window(handle) {
        log::debug!("Dialog: {handle:?} was not bound at initialization; binding now.");
        registry::attach(object, handle)?;
        state.phase.set(DialogPhase::Bound);
    }
    log::debug!("Dialog: Modeless dialog {handle:?} created.");
    Ok(handle)
}

/*
 * Centres `rect` on `reference` and then pulls it back inside `work_area`.
 * The top-left corner wins when the rectangle is larger than the work area.
 */
pub fn centered_rect(rect: Rect, reference: Rect, work_area: Rect) -> Rect {
    let size = rect.size();
    let left = reference.left + (reference.width() - size.width) / 2;
    let top = reference.top + (reference.height() - size.height) / 2;
    let left = left.min(work_area.right - size.width).max(work_area.left);
    let top = top.min(work_area.bottom - size.height).max(work_area.top);
    Rect::from_origin_size(Point { x: left, y: top }, size)
}

/// The procedure every dialog is created with.
pub fn dialog_proc(native: &dyn NativeWindowOperations, handle: Handle, message: Message) -> isize {
    let _frame = DispatchFrame::enter();

    if message.id == WM_INITDIALOG {
        return init_dialog(native, handle, message);
    }

    // Late messages after the final destroy notification land here.
    let Some(object) = HandleRegistry::find(handle) else {
        return 0;
    };
    let Some(dialog) = object.dialog() else {
        log::error!("Dialog: {handle:?} is associated with a non-dialog wrapper.");
        return 0;
    };

    let mut ctx = DispatchContext::new(message);
    dispatch_guarded(handle, &mut ctx, |ctx| {
        dispatch_dialog_message(dialog, native, handle, ctx)
    });
    let result = match ctx.outcome() {
        None => 0,
        Some(result) if dialog_returns_directly(message.id) => result,
        Some(result) => {
            native.set_dialog_message_result(handle, result);
            1
        }
    };

    if message.id == WM_NCDESTROY {
        finish_dialog(dialog, handle);
    }
    result
}

fn init_dialog(native: &dyn NativeWindowOperations, handle: Handle, message: Message) -> isize {
    if message.lparam == 0 {
        log::warn!("Dialog: WM_INITDIALOG for {handle:?} carries no wrapper.");
        return 1;
    }
    // SAFETY: `run_modal`/`run_modeless` keep the `WindowRef` alive for the whole
    // creation call, and WM_INITDIALOG is delivered synchronously within it.
    let object = unsafe { &*(message.lparam as *const WindowRef) }.clone();
    let Some(dialog) = object.dialog() else {
        log::error!("Dialog: WM_INITDIALOG for {handle:?} carries a non-dialog wrapper.");
        return 0;
    };
    let state = dialog.dialog();

    if let Err(e) = registry::attach(&object, handle) {
        log::error!("Dialog: Binding {handle:?} at initialization failed: {e}");
        return 0;
    }
    state.phase.set(DialogPhase::Bound);
    log::debug!("Dialog: Bound {handle:?} (modal: {}).", state.is_modal());

    let mut ctx = DispatchContext::new(message);
    dispatch_guarded(handle, &mut ctx, |ctx| {
        if state.is_modal() && state.center_modal.get() {
            center_dialog(native, handle);
        }
        bind_children(state, native, handle);
        if let Err(e) = state.gravity.borrow_mut().capture(native, handle) {
            log::warn!("Dialog: Capturing the gravity layout of {handle:?} failed: {e}");
        }
        dialog.on_init_dialog(ctx);
    });
    ctx.outcome().unwrap_or(1)
}

fn center_dialog(native: &dyn NativeWindowOperations, handle: Handle) {
    let Ok(rect) = native.window_rect(handle) else {
        return;
    };
    let work_area = native.work_area();
    let reference = native
        .parent(handle)
        .filter(|owner| native.is_visible(*owner))
        .and_then(|owner| native.window_rect(owner).ok())
        .unwrap_or(work_area);
    let centered = centered_rect(rect, reference, work_area);
    if centered != rect {
        if let Err(e) = native.set_window_rect(handle, centered) {
            log::warn!("Dialog: Centring {handle:?} failed: {e}");
        }
    }
}

fn bind_children(state: &Dialog, native: &dyn NativeWindowOperations, handle: Handle) {
    for (control_id, child) in state.window.control_table().children() {
        let Some(child_handle) = native.dlg_item(handle, *control_id) else {
            log::warn!("Dialog: Declared child {control_id:?} does not exist in {handle:?}.");
            continue;
        };
        match registry::attach(child, child_handle) {
            Ok(()) => state.bound_children.borrow_mut().push(child_handle),
            Err(e) => log::error!("Dialog: Binding child {control_id:?} failed: {e}"),
        }
    }
}

fn dispatch_dialog_message(
    dialog: &Rc<dyn DialogHandler>,
    native: &dyn NativeWindowOperations,
    handle: Handle,
    ctx: &mut DispatchContext,
) {
    let message = ctx.message();
    let state = dialog.dialog();

    if message.id == WM_COMMAND && state.is_modal() {
        let id = i32::from(loword_from_wparam(message.wparam));
        let code = hiword_from_wparam(message.wparam);
        if (id == IDOK || id == IDCANCEL) && code == BN_CLICKED {
            let end_code = id as isize;
            if dialog.can_close(end_code) {
                match state.end(end_code) {
                    Ok(()) => ctx.set_handled(0),
                    Err(e) => log::error!("Dialog: Ending {handle:?} failed: {e}"),
                }
                return;
            }
            log::debug!("Dialog: can_close({end_code}) refused; dispatching the command.");
        }
    }

    if message.id == WM_SIZE {
        let client = Size::new(
            i32::from(loword_from_lparam(message.lparam)),
            i32::from(hiword_from_lparam(message.lparam)),
        );
        // The borrow ends before any control is moved.
        let layout = state.gravity.borrow().arrange(client);
        if let Err(e) = apply_layout(native, handle, &layout) {
            log::warn!("Dialog: Applying the gravity layout of {handle:?} failed: {e}");
        }
    }

    route(dialog.as_window_handler(), native, ctx);
}

fn finish_dialog(dialog: &Rc<dyn DialogHandler>, handle: Handle) {
    let state = dialog.dialog();
    let children = state.bound_children.take();
    for child in children {
        if let Err(e) = registry::detach(child) {
            log::warn!("Dialog: Unbinding child {child:?} of {handle:?} failed: {e}");
        }
    }
    if registry::detach(handle).is_err() {
        return;
    }
    state.phase.set(DialogPhase::Closed);
    state.modal.set(false);
    log::debug!("Dialog: {handle:?} closed; association removed.");

    let mut ctx = DispatchContext::new(Message::new(WM_NCDESTROY, 0, 0));
    dispatch_guarded(handle, &mut ctx, |_| dialog.on_final_message());
}
