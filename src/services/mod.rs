pub mod coalescer;
pub mod escalation;
pub mod main_loop;
pub mod restore;
pub mod snapshot;
pub mod topology_monitor;
pub mod topology_watcher;
pub mod window_system;

pub use main_loop::MainLoop;
pub use topology_monitor::create_topology_monitor;
pub use window_system::{create_window_system, X11WindowSystem};
