use crate::error::Result;
use crate::events::{Resolution, TopologyEvent};
use crate::services::window_system::X11WindowSystem;
use tokio::sync::mpsc::UnboundedSender;

/// Trait for topology monitors that can run in different modes
#[async_trait::async_trait]
pub trait TopologyMonitor {
    /// Пересылать уведомления о смене топологии в `tx`, пока получатель жив
    async fn run(self: Box<Self>, tx: UnboundedSender<TopologyEvent>) -> Result<()>;
}

/// Factory function to create an appropriate topology monitor based on the dry_run flag.
///
/// Ошибка здесь означает, что подписка на RandR невозможна, и процесс должен завершиться.
pub fn create_topology_monitor(
    x11: &X11WindowSystem,
    original: Resolution,
    dry_run: bool,
) -> Result<Box<dyn TopologyMonitor + Send>> {
    if dry_run {
        Ok(Box::new(super::dry_run::DryRunMonitor::new(original)))
    } else {
        Ok(Box::new(super::randr::RandrMonitor::new(
            x11.connection(),
            x11.root(),
        )?))
    }
}
