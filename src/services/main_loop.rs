use crate::config::Config;
use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{Resolution, TopologyEvent};
use crate::services::coalescer::EventCoalescer;
use crate::services::escalation::ForegroundEscalation;
use crate::services::restore::RestoreOrchestrator;
use crate::services::snapshot::StateSnapshot;
use crate::services::topology_watcher::{TopologyWatcher, Transition};
use crate::services::window_system::WindowSystem;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyState {
    Present,
    Lost,
}

/// Счётчики работы цикла
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub captures: usize,
    pub losses: usize,
    pub returns: usize,
    pub restores: usize,
}

/// Конечный автомат Present/Lost, связывающий все сервисы.
///
/// Работает в одном потоке: захват, восстановление и активация никогда не
/// выполняются одновременно, поэтому снимок не может измениться посреди
/// восстановления.
pub struct MainLoop {
    windows: Box<dyn WindowSystem>,
    coalescer: EventCoalescer,
    watcher: TopologyWatcher,
    snapshot: StateSnapshot,
    restorer: RestoreOrchestrator,
    escalation: ForegroundEscalation,
    state: TopologyState,
    stats: LoopStats,
    poll_period: Duration,
    capture_debounce: Duration,
    restore_settle: Duration,
}

impl MainLoop {
    pub fn new(
        config: &Config,
        windows: Box<dyn WindowSystem>,
        events: UnboundedReceiver<TopologyEvent>,
    ) -> Self {
        info!(
            "Инициализация MainLoop: исходное разрешение {}, опрос {}мс",
            config.original_resolution(),
            config.timing.poll_period_ms
        );

        Self {
            windows,
            coalescer: EventCoalescer::new(events),
            watcher: TopologyWatcher::new(config.original_resolution()),
            snapshot: StateSnapshot::new(config.exclusions()),
            restorer: RestoreOrchestrator::new(config.fullscreen_settle()),
            escalation: ForegroundEscalation::new(
                config.escalation.target.clone(),
                config.escalation_delay(),
                config.activation_settle(),
            ),
            state: TopologyState::Present,
            stats: LoopStats::default(),
            poll_period: config.poll_period(),
            capture_debounce: config.capture_debounce(),
            restore_settle: config.restore_settle(),
        }
    }

    /// Работает, пока не закроется источник событий
    pub async fn run(mut self) -> Result<()> {
        info!("MainLoop запущен");
        loop {
            self.tick().await?;
        }
    }

    /// Одна итерация: захват (если пора), пауза опроса, разбор накопившихся событий
    pub async fn tick(&mut self) -> Result<()> {
        // Разрешение могло смениться сразу после прошлого разбора событий,
        // поэтому снимок перепроверяется и без новых уведомлений
        if self.capture_due(Instant::now()) {
            let report = self.snapshot.capture(self.windows.as_ref());
            self.stats.captures += 1;
            debug_if_enabled!("Захват #{}: {:?}", self.stats.captures, report);
        }

        sleep(self.poll_period).await;

        self.process_pending().await
    }

    fn capture_due(&self, now: Instant) -> bool {
        if self.state != TopologyState::Present {
            return false;
        }
        if self.snapshot.current().is_none() {
            return true;
        }
        match self.watcher.last_event_at() {
            Some(at) => now.duration_since(at) > self.capture_debounce,
            None => true,
        }
    }

    async fn process_pending(&mut self) -> Result<()> {
        while let Some(event) = self.coalescer.try_next()? {
            debug_if_enabled!("Событие топологии: {}", event);

            match self.watcher.observe(&event) {
                Some(Transition::Lost(resolution)) => self.on_lost(resolution).await,
                Some(Transition::Restored) => self.on_restored().await,
                None => {}
            }
        }
        Ok(())
    }

    async fn on_lost(&mut self, resolution: Resolution) {
        warn!("Исходные экраны потеряны ({}, {})", resolution.width, resolution.height);
        self.stats.losses += 1;

        let outcome = self
            .escalation
            .escalate(self.windows.as_ref(), self.snapshot.current())
            .await;
        debug!("Результат активации: {:?}", outcome);

        self.state = TopologyState::Lost;
    }

    async fn on_restored(&mut self) {
        info!("Исходные экраны обнаружены");
        self.stats.returns += 1;

        // Ждём, пока утихнет серия уведомлений от одного переподключения
        let trailing = self.coalescer.drain(self.restore_settle).await;
        if !trailing.is_empty() {
            info!("За время ожидания получено ещё {} событий топологии", trailing.len());
        }
        self.coalescer.requeue(trailing);
        debug!("В очереди на разбор {} событий", self.coalescer.pending_len());

        match self.snapshot.current() {
            Some(set) => {
                debug!(
                    "Снимок из {} окон сделан {}мс назад",
                    set.len(),
                    set.captured_at().elapsed().as_millis()
                );
                self.restorer.restore(self.windows.as_ref(), set).await;
                self.stats.restores += 1;
            }
            None => warn!("Снимок окон отсутствует, восстанавливать нечего"),
        }

        self.state = TopologyState::Present;
        debug!("Статистика MainLoop: {:?}", self.stats());
    }

    #[cfg(test)]
    pub fn state(&self) -> TopologyState {
        self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    #[cfg(test)]
    pub fn current_snapshot(&self) -> Option<&crate::events::SnapshotSet> {
        self.snapshot.current()
    }
}
