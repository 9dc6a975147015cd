/*
 * Declarative routing and layout tables a window object is built with: the
 * control message table (child notifications by control id and code), the
 * command table (menu and accelerator commands with update-UI state), and the
 * gravity table (how controls follow a resize).
 */
pub mod command_table;
pub mod control_table;
pub mod gravity;

pub use command_table::{CommandChain, CommandDispatchTable, CommandEntry, CommandKind};
pub use control_table::{ControlMessageEntry, ControlMessageTable};
pub use gravity::{Anchor, GravityTable};
