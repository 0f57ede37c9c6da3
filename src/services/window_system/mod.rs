//! WindowSystem service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for reading window state
//! (list, title, geometry, state flags) and delivering EWMH requests to the window
//! manager. Capture policy, restore sequencing and escalation decisions live in
//! the snapshot, restore and escalation services.

mod dry_run;
#[cfg(test)]
pub mod fake;
mod r#trait;
mod x11;

pub use self::r#trait::{create_window_system, WindowSystem};
pub use self::x11::X11WindowSystem;
