use std::fmt;
use tokio::time::Instant;

/// Размер рабочего стола, как его сообщает X-сервер
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Уведомление о смене топологии экранов
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyEvent {
    pub resolution: Resolution,
    pub received_at: Instant,
}

impl TopologyEvent {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: Resolution::new(width, height),
            received_at: Instant::now(),
        }
    }
}

impl fmt::Display for TopologyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}ms ago)",
            self.resolution,
            self.received_at.elapsed().as_millis()
        )
    }
}
