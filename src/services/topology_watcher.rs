use crate::events::{Resolution, TopologyEvent};
use tokio::time::Instant;

/// Переход между исходной и изменённой топологией
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Исходная конфигурация пропала, новые размеры
    Lost(Resolution),
    /// Исходная конфигурация вернулась
    Restored,
}

/// Классифицирует уведомления относительно исходного разрешения
pub struct TopologyWatcher {
    original: Resolution,
    present: bool,
    last_event_at: Option<Instant>,
}

impl TopologyWatcher {
    pub fn new(original: Resolution) -> Self {
        Self {
            original,
            present: true,
            last_event_at: None,
        }
    }

    /// Учесть событие. Любое событие обновляет время последней активности,
    /// переход возвращается только при смене классификации.
    pub fn observe(&mut self, event: &TopologyEvent) -> Option<Transition> {
        self.last_event_at = Some(event.received_at);

        let matches = event.resolution == self.original;
        if matches == self.present {
            return None;
        }

        self.present = matches;
        if matches {
            Some(Transition::Restored)
        } else {
            Some(Transition::Lost(event.resolution))
        }
    }

    pub fn last_event_at(&self) -> Option<Instant> {
        self.last_event_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_transitions_only_on_classification_change() {
        let mut watcher = TopologyWatcher::new(Resolution::new(1920, 1080));

        assert_eq!(watcher.observe(&TopologyEvent::new(1920, 1080)), None);
        assert_eq!(
            watcher.observe(&TopologyEvent::new(1366, 768)),
            Some(Transition::Lost(Resolution::new(1366, 768)))
        );
        // Другое "чужое" разрешение - всё ещё потеря, перехода нет
        assert_eq!(watcher.observe(&TopologyEvent::new(1280, 720)), None);

        assert_eq!(
            watcher.observe(&TopologyEvent::new(1920, 1080)),
            Some(Transition::Restored)
        );
        assert_eq!(watcher.observe(&TopologyEvent::new(1920, 1080)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_event_refreshes_timestamp() {
        let mut watcher = TopologyWatcher::new(Resolution::new(1920, 1080));
        assert!(watcher.last_event_at().is_none());

        let first = TopologyEvent::new(1920, 1080);
        watcher.observe(&first);
        assert_eq!(watcher.last_event_at(), Some(first.received_at));

        tokio::time::advance(std::time::Duration::from_secs(3)).await;
        let other = TopologyEvent::new(800, 600);
        watcher.observe(&other);
        assert_eq!(watcher.last_event_at(), Some(other.received_at));
        assert!(other.received_at > first.received_at);
    }
}
