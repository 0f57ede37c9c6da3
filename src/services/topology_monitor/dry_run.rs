use crate::error::Result;
use crate::events::{Resolution, TopologyEvent};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, Duration};
use tracing::info;

use super::r#trait::TopologyMonitor;

pub struct DryRunMonitor {
    original: Resolution,
    period: Duration,
}

impl DryRunMonitor {
    pub fn new(original: Resolution) -> Self {
        Self {
            original,
            period: Duration::from_secs(30),
        }
    }

    /// Цикл док-станции: отключение (половина ширины), затем возврат
    fn fake_cycle(&self) -> [Resolution; 2] {
        [
            Resolution::new(self.original.width / 2, self.original.height),
            self.original,
        ]
    }
}

#[async_trait::async_trait]
impl TopologyMonitor for DryRunMonitor {
    async fn run(self: Box<Self>, tx: UnboundedSender<TopologyEvent>) -> Result<()> {
        info!("Dry-run режим - TopologyMonitor работает в режиме эмуляции");

        let cycle = self.fake_cycle();
        let mut index = 0;
        let mut ticker = interval(self.period);
        // Первый тик срабатывает сразу: даём время на первый захват
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let resolution = cycle[index];
            info!("Dry-run: эмулируем смену топологии на {}", resolution);
            if tx.send(TopologyEvent::new(resolution.width, resolution.height)).is_err() {
                return Ok(());
            }

            index = (index + 1) % cycle.len();
        }
    }
}
