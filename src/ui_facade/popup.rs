/*
 * Ordinary (non-dialog) windows: class registration, creation, and the single
 * shared window procedure every popup class is registered with.
 *
 * The wrapper travels to its window inside the creation parameters. The shared
 * procedure binds it on `WM_NCCREATE`, the first message that carries them, so
 * no later message can reach the window without an association. Should the
 * platform not route that message through us, `create_popup` binds right after
 * the native call returns.
 *
 * On `WM_NCDESTROY` the association is removed once the message has been
 * dispatched, and `on_final_message` runs last.
 */

use crate::platform_layer::error::{FacadeError, Result as FacadeResult};
use crate::platform_layer::messages::{WM_NCCREATE, WM_NCDESTROY};
use crate::platform_layer::native::NativeWindowOperations;
use crate::platform_layer::types::{CreateParams, CreateStructPrefix, Handle, Message, WindowClass};
use crate::ui_facade::context::{DispatchContext, DispatchFrame};
use crate::ui_facade::registry::{self, HandleRegistry};
use crate::ui_facade::router::{dispatch_guarded, route};
use crate::ui_facade::window::{WindowHandler, WindowRef};

use std::rc::Rc;

pub const DEFAULT_POPUP_CLASS: &str = "WinFacade_Popup";

pub trait PopupHandler: WindowHandler {
    fn window_class(&self) -> WindowClass {
        WindowClass::new(DEFAULT_POPUP_CLASS)
    }

    fn create_params(&self) -> CreateParams {
        CreateParams::default()
    }

    /// Creates and binds the native window.
    fn create(self: &Rc<Self>) -> FacadeResult<Handle>
    where
        Self: Sized + 'static,
    {
        create_popup(
            &WindowRef::from_window(self),
            &self.window_class(),
            &self.create_params(),
        )
    }
}

pub fn create_popup(
    object: &WindowRef,
    class: &WindowClass,
    params: &CreateParams,
) -> FacadeResult<Handle> {
    let window = object.object();
    if let Some(existing) = window.handle() {
        log::error!("Popup: Wrapper already owns window {existing:?}; refusing to create another.");
        return Err(FacadeError::OperationFailed(format!(
            "wrapper already bound to {existing:?}"
        )));
    }
    let native = Rc::clone(window.native());

    if !native.class_registered(&class.name) {
        log::debug!("Popup: Registering window class '{}'.", class.name);
        native.register_class(class)?;
    }

    // Read back by `popup_window_proc` during WM_NCCREATE, inside `create_window`.
    let pending = object.clone();
    let create_param = &pending as *const WindowRef as isize;
    let handle = match native.create_window(&class.name, params, create_param) {
        Ok(handle) => handle,
        Err(e) => {
            log::error!("Popup: Creating a '{}' window failed: {e}", class.name);
            return Err(e);
        }
    };

    if !window.is_bound() {
        if !native.is_window(handle) {
            return Err(FacadeError::WindowCreationFailed(format!(
                "{handle:?} was destroyed during creation"
            )));
        }
        log::debug!("Popup: {handle:?} was not bound during creation; binding now.");
        registry::attach(object, handle)?;
    }
    log::debug!("Popup: Created '{}' window {handle:?}.", class.name);
    Ok(handle)
}

/*
 * Binds the wrapper carried in the creation structure. A null create parameter
 * means the window was not created by `create_popup`; it stays unassociated.
 */
fn bind_from_create_struct(handle: Handle, lparam: isize) -> FacadeResult<()> {
    if lparam == 0 {
        return Ok(());
    }
    // SAFETY: WM_NCCREATE's lparam points to the creation structure, whose first
    // field is the create parameter given to `create_window`.
    let create_params = unsafe { (*(lparam as *const CreateStructPrefix)).create_params };
    if create_params.is_null() {
        return Ok(());
    }
    // SAFETY: `create_popup` keeps the `WindowRef` alive for the whole
    // `create_window` call, and WM_NCCREATE is delivered synchronously within it.
    let object = unsafe { &*(create_params as *const WindowRef) };
    registry::attach(object, handle)
}

/// The procedure shared by every popup window class.
pub fn popup_window_proc(
    native: &dyn NativeWindowOperations,
    handle: Handle,
    message: Message,
) -> isize {
    let _frame = DispatchFrame::enter();

    if message.id == WM_NCCREATE {
        if let Err(e) = bind_from_create_struct(handle, message.lparam) {
            log::error!("Popup: Binding {handle:?} on WM_NCCREATE failed: {e}");
            return 0;
        }
    }

    let Some(object) = HandleRegistry::find(handle) else {
        return native.default_window_proc(handle, message);
    };

    let mut ctx = DispatchContext::new(message);
    dispatch_guarded(handle, &mut ctx, |ctx| route(object.handler(), native, ctx));
    let result = match ctx.outcome() {
        Some(result) => result,
        None => native.default_window_proc(handle, message),
    };

    if message.id == WM_NCDESTROY {
        finish_window(&object, handle);
    }
    result
}

fn finish_window(object: &WindowRef, handle: Handle) {
    if registry::detach(handle).is_err() {
        return;
    }
    log::debug!("Popup: {handle:?} received its final message; association removed.");
    let mut ctx = DispatchContext::new(Message::new(WM_NCDESTROY, 0, 0));
    dispatch_guarded(handle, &mut ctx, |_| object.handler().on_final_message());
}
