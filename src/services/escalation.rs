use crate::events::{SnapshotSet, StateAction, WindowHandle};
use crate::services::window_system::WindowSystem;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// Результат попытки вывести окно на передний план
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// Целевое окно не настроено
    Disabled,
    /// Ещё нет ни одного снимка
    NoSnapshot,
    NotFound,
    Activated(WindowHandle),
    Failed(WindowHandle),
}

/// При потере исходной топологии поднимает одно заранее выбранное окно
pub struct ForegroundEscalation {
    target: Option<String>,
    delay: Duration,
    activation_settle: Duration,
}

impl ForegroundEscalation {
    pub fn new(target: Option<String>, delay: Duration, activation_settle: Duration) -> Self {
        Self {
            target,
            delay,
            activation_settle,
        }
    }

    /// Найти в снимке первое окно с заголовком цели и активировать его
    pub async fn escalate(
        &self,
        windows: &dyn WindowSystem,
        set: Option<&SnapshotSet>,
    ) -> EscalationOutcome {
        let Some(target) = self.target.as_deref() else {
            return EscalationOutcome::Disabled;
        };
        let Some(set) = set else {
            warn!("Нет снимка окон, активация \"{}\" пропущена", target);
            return EscalationOutcome::NoSnapshot;
        };

        for snapshot in set {
            let title = match windows.title(snapshot.handle) {
                Ok(title) => title,
                Err(e) => {
                    warn!("Не удалось прочитать заголовок окна {}: {}", snapshot.handle, e);
                    continue;
                }
            };

            if title != target {
                continue;
            }

            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }

            if let Err(e) = windows.activate(snapshot.handle) {
                error!("Не удалось активировать окно \"{}\" ({}): {}", title, snapshot.handle, e);
                return EscalationOutcome::Failed(snapshot.handle);
            }
            info!("Окно \"{}\" ({}) выведено на передний план", title, snapshot.handle);

            self.refresh_fullscreen(windows, snapshot.handle).await;
            return EscalationOutcome::Activated(snapshot.handle);
        }

        info!("Окно \"{}\" для активации не найдено", target);
        EscalationOutcome::NotFound
    }

    /// Полноэкранное окно после активации бывает "сломано", пока его не
    /// вывести из fullscreen и не вернуть обратно
    async fn refresh_fullscreen(&self, windows: &dyn WindowSystem, window: WindowHandle) {
        let fullscreen = windows.special_flags().fullscreen;
        match windows.state_flags(window) {
            Ok(flags) if flags.contains(&fullscreen) => {}
            Ok(_) => return,
            Err(e) => {
                warn!("Не удалось прочитать флаги окна {}: {}", window, e);
                return;
            }
        }

        if let Err(e) = windows.change_state(window, &[fullscreen], StateAction::Remove) {
            warn!("Не удалось снять fullscreen с окна {}: {}", window, e);
            return;
        }
        sleep(self.activation_settle).await;
        if let Err(e) = windows.change_state(window, &[fullscreen], StateAction::Add) {
            warn!("Не удалось вернуть fullscreen окну {}: {}", window, e);
        }
    }
}
