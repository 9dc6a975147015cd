/*
 * An object-oriented facade over native windows and dialogs. Native handles
 * are bound to window objects for their whole lifetime, native messages are
 * routed to typed handler methods and declarative tables, and dispatch may
 * nest to any depth while handlers run.
 */
pub mod environment;
pub mod platform_layer;
pub mod ui_description_layer;
pub mod ui_facade;
