pub mod control_client;
pub mod controller_handler;
pub mod dispatcher;

pub use control_client::ControlClient;
pub use controller_handler::Controller;
pub use dispatcher::{CommandDispatcher, ConnectionEnd, DispatchOutcome};
