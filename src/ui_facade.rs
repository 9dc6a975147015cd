/*
 * The object side of the facade. Window objects are associated with native
 * handles through a per-thread registry, and every native message is routed to
 * the associated object through one of two shared procedures: `popup_window_proc`
 * for ordinary windows and `dialog_proc` for dialogs.
 */
pub mod app;
pub mod context;
pub mod dialog;
pub mod popup;
pub mod registry;
pub mod router;
pub mod window;


pub use app::Application;
pub use context::{DispatchContext, current_depth};
pub use dialog::{Dialog, DialogHandler, DialogPhase, run_modal, run_modeless};
pub use popup::{PopupHandler, create_popup};
pub use registry::HandleRegistry;
pub use window::{AsWindowHandler, WindowHandler, WindowObject, WindowRef};
