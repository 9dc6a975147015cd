/*
 * The message router: turns one raw `(message-id, wparam, lparam)` tuple into a
 * call to the matching typed method of a `WindowHandler`.
 *
 * Child-control notifications take a longer path. They are first reflected to
 * the wrapper registered for the child itself (with its own context), then
 * looked up in the parent's control table, and only if neither handled them
 * the parent's typed fallback runs. Menu and accelerator commands go through
 * the parent's command tables first.
 *
 * The router never touches any context but the one it was handed. Default
 * processing for unhandled messages is the caller's business, since it differs
 * between popup windows and dialogs.
 */

use crate::platform_layer::messages::*;
use crate::platform_layer::native::NativeWindowOperations;
use crate::platform_layer::reporting::{UnhandledError, panic_description, report_unhandled};
use crate::platform_layer::types::{
    CommandEvent, CommandId, CommandUi, ControlEvent, ControlId, CtlColorRequest, Handle,
    KeyEvent, Message, MessageClass, MinMaxInfo, MouseAction, MouseButton, MouseEvent,
    NotifyHeader, Point, ResizeKind, ScrollBar, ScrollEvent, Size,
};
use crate::ui_facade::context::DispatchContext;
use crate::ui_facade::registry::HandleRegistry;
use crate::ui_facade::window::WindowHandler;

use std::panic::{AssertUnwindSafe, catch_unwind};

/// Routes the message of `ctx` to `target`.
pub fn route(
    target: &dyn WindowHandler,
    native: &dyn NativeWindowOperations,
    ctx: &mut DispatchContext,
) {
    let message = ctx.message();
    let Message { id, wparam, lparam } = message;

    match id {
        WM_CREATE => target.on_create(ctx),
        WM_DESTROY => target.on_destroy(ctx),
        WM_CLOSE => target.on_close(ctx),
        WM_PAINT => target.on_paint(ctx),
        WM_SIZE => {
            let client = Size::new(
                i32::from(loword_from_lparam(lparam)),
                i32::from(hiword_from_lparam(lparam)),
            );
            target.on_size(ctx, ResizeKind::from_wparam(wparam), client);
        }
        WM_MOVE => target.on_move(ctx, signed_point(lparam)),
        WM_TIMER => target.on_timer(ctx, wparam),
        WM_HSCROLL | WM_VSCROLL => route_scroll(target, native, ctx),
        WM_SETFOCUS => target.on_focus(ctx, true),
        WM_KILLFOCUS => target.on_focus(ctx, false),
        WM_KEYDOWN | WM_KEYUP => {
            let event = KeyEvent {
                virtual_key: wparam as u32,
                pressed: id == WM_KEYDOWN,
                repeat_count: loword_from_lparam(lparam),
            };
            target.on_key(ctx, &event);
        }
        WM_CHAR => match char::from_u32(wparam as u32) {
            Some(ch) => target.on_char(ctx, ch),
            None => target.on_message(ctx, message),
        },
        WM_MOUSEMOVE..=WM_MOUSEWHEEL => {
            let event = decode_mouse(message);
            target.on_mouse(ctx, &event);
        }
        WM_CONTEXTMENU => target.on_context_menu(ctx, Handle::from_raw(wparam), signed_point(lparam)),
        WM_INITMENUPOPUP => route_init_menu_popup(target, native, ctx, wparam),
        WM_COMMAND => route_command(target, native, ctx),
        WM_NOTIFY => route_notify(target, native, ctx),
        WM_DRAWITEM => route_draw_item(target, native, ctx),
        WM_GETMINMAXINFO => {
            if lparam == 0 {
                target.on_message(ctx, message);
            } else {
                // SAFETY: the platform passes a valid, exclusive MINMAXINFO for the
                // duration of this message; `MinMaxInfo` mirrors its layout.
                let info = unsafe { &mut *(lparam as *mut MinMaxInfo) };
                target.on_get_min_max_info(ctx, info);
            }
        }
        _ if is_ctl_color(id) => route_ctl_color(target, native, ctx),
        WM_APP..=WM_APP_LAST => target.on_app_message(ctx, message),
        _ => target.on_message(ctx, message),
    }
}

fn signed_point(lparam: isize) -> Point {
    Point {
        x: i32::from(loword_from_lparam(lparam) as i16),
        y: i32::from(hiword_from_lparam(lparam) as i16),
    }
}

fn decode_mouse(message: Message) -> MouseEvent {
    let action = match message.id {
        WM_LBUTTONDOWN => MouseAction::Down(MouseButton::Left),
        WM_LBUTTONUP => MouseAction::Up(MouseButton::Left),
        WM_LBUTTONDBLCLK => MouseAction::DoubleClick(MouseButton::Left),
        WM_RBUTTONDOWN => MouseAction::Down(MouseButton::Right),
        WM_RBUTTONUP => MouseAction::Up(MouseButton::Right),
        WM_RBUTTONDBLCLK => MouseAction::DoubleClick(MouseButton::Right),
        WM_MBUTTONDOWN => MouseAction::Down(MouseButton::Middle),
        WM_MBUTTONUP => MouseAction::Up(MouseButton::Middle),
        WM_MBUTTONDBLCLK => MouseAction::DoubleClick(MouseButton::Middle),
        WM_MOUSEWHEEL => MouseAction::Wheel {
            delta: hiword_from_wparam(message.wparam) as i16,
        },
        _ => MouseAction::Move,
    };
    MouseEvent {
        action,
        position: signed_point(message.lparam),
        modifiers: loword_from_wparam(message.wparam),
    }
}

/*
 * Reflect, then the parent's control table, then the typed fallback. A result
 * produced by the child's reflected handler is kept when the table does not
 * claim the message.
 */
fn route_child_notification(
    target: &dyn WindowHandler,
    ctx: &mut DispatchContext,
    event: &ControlEvent,
    fallback: impl FnOnce(&dyn WindowHandler, &mut DispatchContext),
) {
    let reflected = reflect_to_child(target, ctx.message(), event);

    if target.window().control_table().dispatch(ctx, event) {
        return;
    }
    if let Some(result) = reflected {
        ctx.set_handled(result);
        return;
    }
    fallback(target, ctx);
}

fn reflect_to_child(
    target: &dyn WindowHandler,
    message: Message,
    event: &ControlEvent,
) -> Option<isize> {
    let source = event.source?;
    if target.window().handle() == Some(source) {
        return None;
    }
    let child = HandleRegistry::find(source)?;
    let mut child_ctx = DispatchContext::new(message);
    child
        .handler()
        .on_reflected_notification(&mut child_ctx, event);
    child_ctx.outcome()
}

fn source_control_id(native: &dyn NativeWindowOperations, source: Handle) -> ControlId {
    native.control_id(source).unwrap_or(ControlId::new(0))
}

fn route_command(
    target: &dyn WindowHandler,
    native: &dyn NativeWindowOperations,
    ctx: &mut DispatchContext,
) {
    let message = ctx.message();
    let id = loword_from_wparam(message.wparam);
    let code = hiword_from_wparam(message.wparam);
    let source = Handle::from_lparam(message.lparam);
    let command = CommandEvent {
        id: CommandId(u32::from(id)),
        code,
        source,
    };

    match source {
        Some(control) => {
            let event = ControlEvent {
                class: MessageClass::Command,
                control_id: ControlId::new(i32::from(id)),
                code: u32::from(code),
                source: Some(control),
                message,
            };
            log::trace!(
                "Router: Control command {:?} code {code} from {control:?} (native id {:?}).",
                event.control_id,
                native.control_id(control)
            );
            route_child_notification(target, ctx, &event, |target, ctx| {
                target.on_command(ctx, &command)
            });
        }
        None => {
            if target.window().commands().execute(command.id) {
                ctx.set_handled(0);
            } else {
                target.on_command(ctx, &command);
            }
        }
    }
}

fn route_notify(
    target: &dyn WindowHandler,
    native: &dyn NativeWindowOperations,
    ctx: &mut DispatchContext,
) {
    let message = ctx.message();
    if message.lparam == 0 {
        target.on_message(ctx, message);
        return;
    }
    // SAFETY: a WM_NOTIFY lparam points to a notification structure that starts
    // with the header and outlives the synchronous send.
    let header = unsafe { *(message.lparam as *const NotifyHeader) };
    let source = Handle::from_raw(header.hwnd_from);
    let control_id = match (header.id_from, source) {
        (0, Some(source)) => source_control_id(native, source),
        (id, _) => ControlId::new(id as i32),
    };
    let event = ControlEvent {
        class: MessageClass::Notify,
        control_id,
        code: header.code,
        source,
        message,
    };
    route_child_notification(target, ctx, &event, |target, ctx| {
        target.on_notify(ctx, &event)
    });
}

fn route_draw_item(
    target: &dyn WindowHandler,
    native: &dyn NativeWindowOperations,
    ctx: &mut DispatchContext,
) {
    let message = ctx.message();
    let control_id = ControlId::new(message.wparam as i32);
    // Control id 0 means an owner-drawn menu item.
    let source = match (control_id.raw(), target.window().handle()) {
        (0, _) | (_, None) => None,
        (_, Some(parent)) => native.dlg_item(parent, control_id),
    };
    let event = ControlEvent {
        class: MessageClass::DrawItem,
        control_id,
        code: 0,
        source,
        message,
    };
    if source.is_none() {
        target.on_draw_item(ctx, &event);
        return;
    }
    route_child_notification(target, ctx, &event, |target, ctx| {
        target.on_draw_item(ctx, &event)
    });
}

fn route_ctl_color(
    target: &dyn WindowHandler,
    native: &dyn NativeWindowOperations,
    ctx: &mut DispatchContext,
) {
    let message = ctx.message();
    let source = Handle::from_lparam(message.lparam);
    let request = CtlColorRequest {
        class: MessageClass::CtlColor,
        device_context: message.wparam,
        control: source,
    };
    match source {
        Some(control) if target.window().handle() != Some(control) => {
            let event = ControlEvent {
                class: MessageClass::CtlColor,
                control_id: source_control_id(native, control),
                code: message.id,
                source: Some(control),
                message,
            };
            route_child_notification(target, ctx, &event, |target, ctx| {
                target.on_ctl_color(ctx, &request)
            });
        }
        _ => target.on_ctl_color(ctx, &request),
    }
}

fn route_scroll(
    target: &dyn WindowHandler,
    native: &dyn NativeWindowOperations,
    ctx: &mut DispatchContext,
) {
    let message = ctx.message();
    let scroll = ScrollEvent {
        bar: if message.id == WM_HSCROLL {
            ScrollBar::Horizontal
        } else {
            ScrollBar::Vertical
        },
        request: loword_from_wparam(message.wparam),
        position: hiword_from_wparam(message.wparam),
        source: Handle::from_lparam(message.lparam),
    };
    match scroll.source {
        Some(control) => {
            let event = ControlEvent {
                class: MessageClass::Scroll,
                control_id: source_control_id(native, control),
                code: u32::from(scroll.request),
                source: Some(control),
                message,
            };
            route_child_notification(target, ctx, &event, |target, ctx| {
                target.on_scroll(ctx, &scroll)
            });
        }
        None => target.on_scroll(ctx, &scroll),
    }
}

/*
 * Asks the command tables for the state of every item of the popup menu about
 * to open and applies it. Items no table knows keep their current state.
 */
fn route_init_menu_popup(
    target: &dyn WindowHandler,
    native: &dyn NativeWindowOperations,
    ctx: &mut DispatchContext,
    menu: usize,
) {
    let commands = target.window().commands();
    if !commands.is_empty() {
        let mut updated = 0usize;
        for id in native.menu_item_ids(menu) {
            let mut state = CommandUi::default();
            if commands.update_ui(id, &mut state) {
                native.apply_menu_item_state(menu, id, &state);
                updated += 1;
            }
        }
        if updated > 0 {
            log::trace!("Router: Updated {updated} items of menu {menu:#x}.");
            ctx.set_handled(0);
        }
    }
    target.on_init_menu_popup(ctx, menu);
}

/*
 * Runs one dispatch with panic containment. A panic is reported once through
 * the unhandled-error channel and the message is left unhandled so the
 * dispatcher's default processing still runs.
 */
pub(crate) fn dispatch_guarded(
    handle: Handle,
    ctx: &mut DispatchContext,
    dispatch: impl FnOnce(&mut DispatchContext),
) {
    let message = ctx.message();
    let outcome = catch_unwind(AssertUnwindSafe(|| dispatch(ctx)));
    if let Err(payload) = outcome {
        ctx.mark_unhandled();
        report_unhandled(&UnhandledError {
            handle,
            message,
            description: panic_description(payload.as_ref()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform_layer::headless::HeadlessNative;
    use crate::ui_facade::window::WindowObject;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        window: WindowObject,
        calls: RefCell<Vec<String>>,
    }

    impl Recorder {
        fn new(native: &Rc<HeadlessNative>) -> Self {
            Self {
                window: WindowObject::new(native.clone()),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn push(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl WindowHandler for Recorder {
        fn window(&self) -> &WindowObject {
            &self.window
        }

        fn on_key(&self, _ctx: &mut DispatchContext, event: &KeyEvent) {
            self.push(format!("{event:?}"));
        }

        fn on_mouse(&self, _ctx: &mut DispatchContext, event: &MouseEvent) {
            self.push(format!("{event:?}"));
        }

        fn on_scroll(&self, _ctx: &mut DispatchContext, event: &ScrollEvent) {
            self.push(format!("{event:?}"));
        }

        fn on_command(&self, ctx: &mut DispatchContext, event: &CommandEvent) {
            self.push(format!("{event:?}"));
            ctx.set_handled(4);
        }

        fn on_app_message(&self, _ctx: &mut DispatchContext, message: Message) {
            self.push(format!("app {:#x}", message.id));
        }

        fn on_message(&self, _ctx: &mut DispatchContext, message: Message) {
            self.push(format!("other {:#x}", message.id));
        }
    }

    fn route_one(message: Message) -> (Vec<String>, Option<isize>) {
        let native = Rc::new(HeadlessNative::new());
        let recorder = Recorder::new(&native);
        let mut ctx = DispatchContext::new(message);
        route(&recorder, native.as_ref(), &mut ctx);
        (recorder.calls.take(), ctx.outcome())
    }

    #[test]
    fn mouse_messages_decode_signed_positions() {
        // Arrange
        let lparam = make_lparam((-5i16) as u16, 7);

        // Act
        let (calls, outcome) = route_one(Message::new(WM_LBUTTONDOWN, 0x0001, lparam));

        // Assert
        let expected = MouseEvent {
            action: MouseAction::Down(MouseButton::Left),
            position: Point { x: -5, y: 7 },
            modifiers: 0x0001,
        };
        assert_eq!(calls, vec![format!("{expected:?}")]);
        assert_eq!(outcome, None);
    }

    #[test]
    fn wheel_delta_comes_from_the_high_word() {
        let wparam = make_wparam(0, (-120i16) as u16);

        let (calls, _) = route_one(Message::new(WM_MOUSEWHEEL, wparam, 0));

        let expected = MouseEvent {
            action: MouseAction::Wheel { delta: -120 },
            position: Point { x: 0, y: 0 },
            modifiers: 0,
        };
        assert_eq!(calls, vec![format!("{expected:?}")]);
    }

    #[test]
    fn key_down_carries_repeat_count() {
        let (calls, _) = route_one(Message::new(WM_KEYDOWN, 0x41, make_lparam(3, 0)));

        let expected = KeyEvent {
            virtual_key: 0x41,
            pressed: true,
            repeat_count: 3,
        };
        assert_eq!(calls, vec![format!("{expected:?}")]);
    }

    #[test]
    fn window_scroll_bars_have_no_source() {
        let (calls, _) = route_one(Message::new(WM_HSCROLL, make_wparam(5, 40), 0));

        let expected = ScrollEvent {
            bar: ScrollBar::Horizontal,
            request: 5,
            position: 40,
            source: None,
        };
        assert_eq!(calls, vec![format!("{expected:?}")]);
    }

    #[test]
    fn menu_command_without_tables_reaches_on_command() {
        // Act
        let (calls, outcome) = route_one(Message::new(WM_COMMAND, 42, 0));

        // Assert
        let expected = CommandEvent {
            id: CommandId(42),
            code: 0,
            source: None,
        };
        assert_eq!(calls, vec![format!("{expected:?}")]);
        assert_eq!(outcome, Some(4));
    }

    #[test]
    fn unrecognised_and_application_messages() {
        let (user, _) = route_one(Message::new(WM_USER + 1, 0, 0));
        let (app, _) = route_one(Message::new(WM_APP + 2, 0, 0));
        // A lone surrogate is not a `char`.
        let (bad_char, _) = route_one(Message::new(WM_CHAR, 0xD800, 0));

        assert_eq!(user, vec![format!("other {:#x}", WM_USER + 1)]);
        assert_eq!(app, vec![format!("app {:#x}", WM_APP + 2)]);
        assert_eq!(bad_char, vec![format!("other {:#x}", WM_CHAR)]);
    }
}
