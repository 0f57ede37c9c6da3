//! TopologyMonitor service: the producer side of topology notifications.
//!
//! Monitors only translate display-server notifications into `TopologyEvent`s
//! and push them into the channel consumed by the main loop. Classification,
//! debouncing and restore decisions are made elsewhere.

mod dry_run;
mod randr;
mod r#trait;

pub use self::r#trait::create_topology_monitor;
