// Server module entry point
// Listener creation, the accept loop, per-connection tasks and shutdown

pub mod connection;
pub mod listener;
pub mod shutdown;
pub mod signal;

// `loop` is a keyword, so the module is exposed as `server_loop`
#[path = "loop.rs"]
pub mod server_loop;

pub use connection::ConnectionSettings;
pub use listener::bind_listener;
pub use server_loop::{start_server_loop, ServerLoopConfig};
pub use shutdown::{Shutdown, ShutdownSignal};
