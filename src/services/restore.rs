use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{BatchReport, GeometryMask, SnapshotSet, StateAction, WindowSnapshot};
use crate::services::window_system::WindowSystem;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// Возвращает окна в положение из снимка.
///
/// Порядок шагов важен: композиторы игнорируют запросы геометрии, пока окно
/// развёрнуто или полноэкранное, а fullscreen надёжно включается только
/// последним и после паузы.
pub struct RestoreOrchestrator {
    fullscreen_settle: Duration,
}

impl RestoreOrchestrator {
    pub fn new(fullscreen_settle: Duration) -> Self {
        Self { fullscreen_settle }
    }

    /// Восстановить все окна набора; сбой одного окна не останавливает остальные
    pub async fn restore(&self, windows: &dyn WindowSystem, set: &SnapshotSet) -> BatchReport {
        let mut report = BatchReport::default();

        for snapshot in set {
            let result = self.restore_window(windows, snapshot).await;
            if let Err(e) = &result {
                error!("Ошибка при восстановлении окна {}: {}", snapshot.handle, e);
            }
            report.record(snapshot.handle, result);
        }

        info!(
            "Восстановление завершено: {} из {} окон, ошибок: {}",
            report.succeeded,
            report.attempted,
            report.failed()
        );
        report
    }

    async fn restore_window(
        &self,
        windows: &dyn WindowSystem,
        snapshot: &WindowSnapshot,
    ) -> Result<()> {
        info!("Восстановление окна: {}", snapshot);

        let special = windows.special_flags();

        // 1-2. Текущие флаги и то, что останется после снятия maximize/fullscreen
        let current = windows.state_flags(snapshot.handle)?;
        debug_if_enabled!(
            "Окно {}: текущих флагов {}, без maximize/fullscreen {}",
            snapshot.handle,
            current.len(),
            special.filter(&current).len()
        );

        // 3. Полноэкранное окно сначала выводим из fullscreen и ждём
        if current.contains(&special.fullscreen) {
            info!("Снятие fullscreen с окна \"{}\"", snapshot.title);
            windows.change_state(snapshot.handle, &[special.fullscreen], StateAction::Remove)?;
            sleep(self.fullscreen_settle).await;
        }

        // 4. Без maximize запрос геометрии не применяется
        windows.change_state(
            snapshot.handle,
            &[special.maximized_vert, special.maximized_horz],
            StateAction::Remove,
        )?;

        // 5. Один запрос со всеми полями геометрии
        windows.move_resize(snapshot.handle, snapshot.geometry, GeometryMask::ALL)?;

        // 6. Флаги из снимка, а не только что прочитанные
        if !snapshot.flags.is_empty() {
            windows.change_state(snapshot.handle, &snapshot.flags, StateAction::Add)?;
        }

        // 7. fullscreen - последним и после паузы
        if snapshot.flags.contains(&special.fullscreen) {
            sleep(self.fullscreen_settle).await;
            windows.change_state(snapshot.handle, &[special.fullscreen], StateAction::Add)?;
        }

        Ok(())
    }
}
