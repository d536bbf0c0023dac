pub mod command;
pub mod control_listener;

pub use command::{CommandReader, ControlCommand};
pub use control_listener::ControlListener;
