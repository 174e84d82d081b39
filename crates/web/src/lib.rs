//! Portal E2E Dashboard Server
//!
//! Serves the dashboard, its JSON API and the generated reports, and relays
//! live test output to connected clients over WebSocket.

pub mod live;
pub mod server;
pub mod static_files;

pub use live::{Rejection, RunCoordinator};
pub use server::{serve, WebServer};
