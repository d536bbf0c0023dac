//! tcpwatch: a single-interface live TCP traffic monitor.
//!
//! The analyzer (`tcpwatch`) captures frames on one interface, keeps running
//! throughput and retransmission figures for the active capture session, and
//! is driven by a controller (`tcpwatch-ctl`) over a local Unix socket.

pub mod configuration;
pub mod controller;
pub mod data_capture;
pub mod error_handling;
pub mod network;
pub mod session_management;
pub mod storage;

pub use controller::Controller;
pub use session_management::SessionState;
