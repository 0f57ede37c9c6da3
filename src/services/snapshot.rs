use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{BatchReport, SnapshotSet, WindowHandle, WindowSnapshot};
use crate::services::window_system::WindowSystem;
use std::collections::HashSet;
use tracing::{info, warn};

/// Хранит текущий набор снимков окон и умеет его перезахватывать
pub struct StateSnapshot {
    exclusions: HashSet<String>,
    current: Option<SnapshotSet>,
}

impl StateSnapshot {
    pub fn new(exclusions: HashSet<String>) -> Self {
        Self {
            exclusions,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&SnapshotSet> {
        self.current.as_ref()
    }

    /// Захватить положение и флаги всех окон верхнего уровня.
    ///
    /// Сбой чтения отдельного окна только пропускает это окно. Если не удалось
    /// получить даже список окон, прежний набор остаётся текущим.
    pub fn capture(&mut self, windows: &dyn WindowSystem) -> BatchReport {
        let mut report = BatchReport::default();

        let handles = match windows.top_level_windows() {
            Ok(handles) => handles,
            Err(e) => {
                warn!("Не удалось получить список окон, снимок не обновлён: {}", e);
                return report;
            }
        };

        let mut captured = Vec::with_capacity(handles.len());
        for handle in handles {
            match self.capture_window(windows, handle) {
                Ok(Some(snapshot)) => {
                    captured.push(snapshot);
                    report.record(handle, Ok(()));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Окно {} пропущено при захвате: {}", handle, e);
                    report.record(handle, Err(e));
                }
            }
        }

        info!(
            "Захвачено состояние {} окон (пропущено с ошибкой: {})",
            captured.len(),
            report.failed()
        );
        self.current = Some(SnapshotSet::new(captured));

        report
    }

    /// `Ok(None)` - окно в списке исключений
    fn capture_window(
        &self,
        windows: &dyn WindowSystem,
        handle: WindowHandle,
    ) -> Result<Option<WindowSnapshot>> {
        let title = windows.title(handle)?;
        if self.exclusions.contains(&title) {
            debug_if_enabled!("Окно \"{}\" ({}) исключено из снимка", title, handle);
            return Ok(None);
        }

        let geometry = windows.geometry(handle)?;
        let flags = windows.state_flags(handle)?;
        debug_if_enabled!(
            "Снимок окна \"{}\" ({}): {}, флагов: {}",
            title,
            handle,
            geometry,
            flags.len()
        );

        Ok(Some(WindowSnapshot {
            handle,
            title,
            geometry,
            flags,
        }))
    }
}
