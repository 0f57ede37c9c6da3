use crate::error::Result;
use crate::events::{
    Geometry, GeometryMask, SpecialFlags, StateAction, StateFlag, StateFlags, WindowHandle,
};

use super::dry_run::DryRunWindowSystem;
use super::x11::X11WindowSystem;

/// Доступ к окнам оконной системы.
///
/// Реализация отвечает только за чтение и отправку запросов. Никакой логики
/// захвата, восстановления или выбора окон здесь быть не должно.
pub trait WindowSystem {
    /// Окна верхнего уровня корневого окна
    fn top_level_windows(&self) -> Result<Vec<WindowHandle>>;

    fn title(&self, window: WindowHandle) -> Result<String>;

    fn geometry(&self, window: WindowHandle) -> Result<Geometry>;

    /// Флаги состояния в том порядке, в котором их хранит оконный менеджер
    fn state_flags(&self, window: WindowHandle) -> Result<StateFlags>;

    fn special_flags(&self) -> SpecialFlags;

    fn change_state(
        &self,
        window: WindowHandle,
        flags: &[StateFlag],
        action: StateAction,
    ) -> Result<()>;

    fn move_resize(
        &self,
        window: WindowHandle,
        geometry: Geometry,
        mask: GeometryMask,
    ) -> Result<()>;

    /// Активировать и поднять окно
    fn activate(&self, window: WindowHandle) -> Result<()>;
}

/// Factory function to create the window system based on the dry_run flag
pub fn create_window_system(x11: X11WindowSystem, dry_run: bool) -> Box<dyn WindowSystem> {
    if dry_run {
        Box::new(DryRunWindowSystem::new(x11))
    } else {
        Box::new(x11)
    }
}
