pub mod topology;
pub mod window;

pub use topology::{Resolution, TopologyEvent};
pub use window::{
    Geometry, GeometryMask, SnapshotSet, SpecialFlags, StateAction, StateFlag, StateFlags,
    WindowHandle, WindowSnapshot,
};

/// Итог пакетной операции над окнами (захват или восстановление).
/// Сбой одного окна не прерывает пакет, а попадает в `failures`.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<(WindowHandle, crate::error::WinRestoreError)>,
}

impl BatchReport {
    pub fn record(&mut self, window: WindowHandle, result: crate::error::Result<()>) {
        self.attempted += 1;
        match result {
            Ok(()) => self.succeeded += 1,
            Err(e) => self.failures.push((window, e)),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}
