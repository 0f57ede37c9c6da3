use crate::error::{Result, WinRestoreError};
use crate::events::TopologyEvent;
use std::collections::VecDeque;
use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver};
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Очередь уведомлений топологии с ожиданием "тишины".
///
/// Единственная точка, откуда основной цикл получает события. Всё, что было
/// собрано `drain`, возвращается через `requeue` и выдаётся раньше новых
/// событий канала, так что порядок поступления сохраняется.
pub struct EventCoalescer {
    rx: UnboundedReceiver<TopologyEvent>,
    pending: VecDeque<TopologyEvent>,
}

impl EventCoalescer {
    pub fn new(rx: UnboundedReceiver<TopologyEvent>) -> Self {
        Self {
            rx,
            pending: VecDeque::new(),
        }
    }

    /// Следующее событие без ожидания: сначала возвращённые, потом канал
    pub fn try_next(&mut self) -> Result<Option<TopologyEvent>> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }

        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WinRestoreError::SourceClosed),
        }
    }

    /// Собирать события, пока не пройдёт `quiet` без новых поступлений.
    ///
    /// Каждое пришедшее событие переносит срок на now + quiet. Закрытый канал
    /// завершает сбор досрочно.
    pub async fn drain(&mut self, quiet: Duration) -> VecDeque<TopologyEvent> {
        let mut drained = VecDeque::new();

        loop {
            match timeout(quiet, self.rx.recv()).await {
                Ok(Some(event)) => {
                    debug!("Drain: получено {}", event.resolution);
                    drained.push_back(event);
                }
                Ok(None) => {
                    debug!("Drain: источник событий закрыт");
                    break;
                }
                Err(_) => break,
            }
        }

        debug!("Drain: собрано {} событий", drained.len());
        drained
    }

    /// Вернуть собранные события в начало обработки (старые первыми)
    pub fn requeue(&mut self, events: VecDeque<TopologyEvent>) {
        self.pending.extend(events);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, Instant};

    #[tokio::test(start_paused = true)]
    async fn test_drain_returns_after_trailing_silence() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut coalescer = EventCoalescer::new(rx);

        // 5 событий с интервалом 500мс при окне тишины 2с
        tokio::spawn(async move {
            for i in 0..5u32 {
                tx.send(TopologyEvent::new(1920 + i, 1080)).unwrap();
                sleep(Duration::from_millis(500)).await;
            }
            // Держим отправителя, чтобы канал не закрылся во время ожидания
            sleep(Duration::from_secs(60)).await;
            drop(tx);
        });

        let started = Instant::now();
        let drained = coalescer.drain(Duration::from_secs(2)).await;

        assert_eq!(drained.len(), 5);
        assert_eq!(started.elapsed(), Duration::from_millis(4000));
        let widths: Vec<u32> = drained.iter().map(|e| e.resolution.width).collect();
        assert_eq!(widths, vec![1920, 1921, 1922, 1923, 1924]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_without_events_waits_full_timeout() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut coalescer = EventCoalescer::new(rx);

        let started = Instant::now();
        let drained = coalescer.drain(Duration::from_millis(750)).await;

        assert!(drained.is_empty());
        assert_eq!(started.elapsed(), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_requeued_events_come_before_new_ones() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut coalescer = EventCoalescer::new(rx);

        tx.send(TopologyEvent::new(1, 1)).unwrap();
        tx.send(TopologyEvent::new(2, 2)).unwrap();
        let drained = coalescer.drain(Duration::from_millis(100)).await;
        tx.send(TopologyEvent::new(3, 3)).unwrap();
        coalescer.requeue(drained);
        assert_eq!(coalescer.pending_len(), 2);

        let order: Vec<u32> = std::iter::from_fn(|| coalescer.try_next().unwrap())
            .map(|e| e.resolution.width)
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_closed_source_is_reported() {
        let (tx, rx) = mpsc::unbounded_channel::<TopologyEvent>();
        let mut coalescer = EventCoalescer::new(rx);
        drop(tx);

        assert!(matches!(coalescer.try_next(), Err(WinRestoreError::SourceClosed)));
    }
}
