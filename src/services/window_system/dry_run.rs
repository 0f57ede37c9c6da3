use crate::error::Result;
use crate::events::{
    Geometry, GeometryMask, SpecialFlags, StateAction, StateFlag, StateFlags, WindowHandle,
};
use tracing::info;

use super::r#trait::WindowSystem;

/// Читает реальные окна, но вместо отправки запросов только пишет их в лог
pub struct DryRunWindowSystem<W> {
    inner: W,
}

impl<W: WindowSystem> DryRunWindowSystem<W> {
    pub fn new(inner: W) -> Self {
        info!("Dry-run режим - запросы к оконному менеджеру не отправляются");
        Self { inner }
    }
}

impl<W: WindowSystem> WindowSystem for DryRunWindowSystem<W> {
    fn top_level_windows(&self) -> Result<Vec<WindowHandle>> {
        self.inner.top_level_windows()
    }

    fn title(&self, window: WindowHandle) -> Result<String> {
        self.inner.title(window)
    }

    fn geometry(&self, window: WindowHandle) -> Result<Geometry> {
        self.inner.geometry(window)
    }

    fn state_flags(&self, window: WindowHandle) -> Result<StateFlags> {
        self.inner.state_flags(window)
    }

    fn special_flags(&self) -> SpecialFlags {
        self.inner.special_flags()
    }

    fn change_state(
        &self,
        window: WindowHandle,
        flags: &[StateFlag],
        action: StateAction,
    ) -> Result<()> {
        let atoms: Vec<u32> = flags.iter().map(|f| f.0).collect();
        info!("[DRY RUN] _NET_WM_STATE {:?} {:?} для окна {}", action, atoms, window);
        Ok(())
    }

    fn move_resize(
        &self,
        window: WindowHandle,
        geometry: Geometry,
        mask: GeometryMask,
    ) -> Result<()> {
        info!(
            "[DRY RUN] _NET_MOVERESIZE_WINDOW {} (маска 0x{:x}) для окна {}",
            geometry,
            mask.bits(),
            window
        );
        Ok(())
    }

    fn activate(&self, window: WindowHandle) -> Result<()> {
        info!("[DRY RUN] Активация окна {}", window);
        Ok(())
    }
}
