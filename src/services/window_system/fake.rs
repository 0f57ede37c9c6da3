//! In-memory window system for tests.
//!
//! Mimics the compositor quirk the restore algorithm works around: geometry
//! requests are ignored while a window is fullscreen or maximized.

use crate::error::{Result, WinRestoreError};
use crate::events::{
    Geometry, GeometryMask, SpecialFlags, StateAction, StateFlag, StateFlags, WindowHandle,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tokio::time::Instant;

use super::r#trait::WindowSystem;

pub const MAX_VERT: StateFlag = StateFlag(100);
pub const MAX_HORZ: StateFlag = StateFlag(101);
pub const FULLSCREEN: StateFlag = StateFlag(102);
pub const ABOVE: StateFlag = StateFlag(103);
pub const STICKY: StateFlag = StateFlag(104);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListWindows,
    ChangeState(WindowHandle, Vec<StateFlag>, StateAction),
    MoveResize(WindowHandle, Geometry, GeometryMask),
    Activate(WindowHandle),
}

struct FakeWindow {
    handle: WindowHandle,
    title: Option<String>,
    geometry: Geometry,
    flags: Vec<StateFlag>,
}

#[derive(Default)]
struct FakeDesktop {
    windows: Vec<FakeWindow>,
    next_id: u32,
    calls: Vec<(Instant, Call)>,
    fail_listing: bool,
    fail_geometry: HashSet<WindowHandle>,
    fail_move: HashSet<WindowHandle>,
    fail_activate: HashSet<WindowHandle>,
}

impl FakeDesktop {
    fn window(&self, handle: WindowHandle) -> Result<&FakeWindow> {
        self.windows
            .iter()
            .find(|w| w.handle == handle)
            .ok_or_else(|| WinRestoreError::window(handle, "BadWindow"))
    }

    fn window_mut(&mut self, handle: WindowHandle) -> Result<&mut FakeWindow> {
        self.windows
            .iter_mut()
            .find(|w| w.handle == handle)
            .ok_or_else(|| WinRestoreError::window(handle, "BadWindow"))
    }
}

#[derive(Clone, Default)]
pub struct FakeWindowSystem {
    desktop: Rc<RefCell<FakeDesktop>>,
}

impl FakeWindowSystem {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.desktop.borrow_mut().next_id = 0x400001;
        fake
    }

    pub fn add_window(&self, title: &str, geometry: Geometry, flags: &[StateFlag]) -> WindowHandle {
        self.push_window(Some(title.to_string()), geometry, flags)
    }

    pub fn add_untitled_window(&self, geometry: Geometry) -> WindowHandle {
        self.push_window(None, geometry, &[])
    }

    fn push_window(
        &self,
        title: Option<String>,
        geometry: Geometry,
        flags: &[StateFlag],
    ) -> WindowHandle {
        let mut desktop = self.desktop.borrow_mut();
        let handle = WindowHandle(desktop.next_id);
        desktop.next_id += 1;
        desktop.windows.push(FakeWindow {
            handle,
            title,
            geometry,
            flags: flags.to_vec(),
        });
        handle
    }

    /// Внешнее изменение: оконный менеджер сам переложил окно
    pub fn rearrange(&self, handle: WindowHandle, geometry: Geometry, flags: &[StateFlag]) {
        let mut desktop = self.desktop.borrow_mut();
        if let Ok(window) = desktop.window_mut(handle) {
            window.geometry = geometry;
            window.flags = flags.to_vec();
        }
    }

    pub fn fail_listing(&self, fail: bool) {
        self.desktop.borrow_mut().fail_listing = fail;
    }

    pub fn fail_geometry(&self, handle: WindowHandle) {
        self.desktop.borrow_mut().fail_geometry.insert(handle);
    }

    pub fn fail_move(&self, handle: WindowHandle) {
        self.desktop.borrow_mut().fail_move.insert(handle);
    }

    pub fn fail_activate(&self, handle: WindowHandle) {
        self.desktop.borrow_mut().fail_activate.insert(handle);
    }

    pub fn geometry_of(&self, handle: WindowHandle) -> Geometry {
        self.desktop.borrow().window(handle).map(|w| w.geometry).unwrap()
    }

    pub fn flags_of(&self, handle: WindowHandle) -> Vec<StateFlag> {
        self.desktop.borrow().window(handle).map(|w| w.flags.clone()).unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.desktop.borrow().calls.iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.desktop.borrow().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.desktop.borrow().calls.iter().filter(|(_, c)| predicate(c)).count()
    }

    pub fn clear_calls(&self) {
        self.desktop.borrow_mut().calls.clear();
    }

    fn record(&self, call: Call) {
        self.desktop.borrow_mut().calls.push((Instant::now(), call));
    }
}

impl WindowSystem for FakeWindowSystem {
    fn top_level_windows(&self) -> Result<Vec<WindowHandle>> {
        self.record(Call::ListWindows);
        let desktop = self.desktop.borrow();
        if desktop.fail_listing {
            return Err(WinRestoreError::window(WindowHandle(0x1), "_NET_CLIENT_LIST недоступен"));
        }
        Ok(desktop.windows.iter().map(|w| w.handle).collect())
    }

    fn title(&self, window: WindowHandle) -> Result<String> {
        self.desktop
            .borrow()
            .window(window)?
            .title
            .clone()
            .ok_or_else(|| WinRestoreError::window(window, "нет _NET_WM_NAME"))
    }

    fn geometry(&self, window: WindowHandle) -> Result<Geometry> {
        let desktop = self.desktop.borrow();
        if desktop.fail_geometry.contains(&window) {
            return Err(WinRestoreError::window(window, "GetGeometry failed"));
        }
        Ok(desktop.window(window)?.geometry)
    }

    fn state_flags(&self, window: WindowHandle) -> Result<StateFlags> {
        Ok(self.desktop.borrow().window(window)?.flags.iter().copied().collect())
    }

    fn special_flags(&self) -> SpecialFlags {
        SpecialFlags {
            maximized_vert: MAX_VERT,
            maximized_horz: MAX_HORZ,
            fullscreen: FULLSCREEN,
        }
    }

    fn change_state(
        &self,
        window: WindowHandle,
        flags: &[StateFlag],
        action: StateAction,
    ) -> Result<()> {
        self.record(Call::ChangeState(window, flags.to_vec(), action));
        let mut desktop = self.desktop.borrow_mut();
        let target = desktop.window_mut(window)?;
        match action {
            StateAction::Add => {
                for flag in flags {
                    if !target.flags.contains(flag) {
                        target.flags.push(*flag);
                    }
                }
            }
            StateAction::Remove => target.flags.retain(|f| !flags.contains(f)),
        }
        Ok(())
    }

    fn move_resize(
        &self,
        window: WindowHandle,
        geometry: Geometry,
        mask: GeometryMask,
    ) -> Result<()> {
        self.record(Call::MoveResize(window, geometry, mask));
        let mut desktop = self.desktop.borrow_mut();
        if desktop.fail_move.contains(&window) {
            return Err(WinRestoreError::send(window, "_NET_MOVERESIZE_WINDOW", "BadWindow"));
        }
        let target = desktop.window_mut(window)?;
        let locked = target
            .flags
            .iter()
            .any(|f| *f == MAX_VERT || *f == MAX_HORZ || *f == FULLSCREEN);
        if !locked {
            target.geometry = geometry;
        }
        Ok(())
    }

    fn activate(&self, window: WindowHandle) -> Result<()> {
        self.record(Call::Activate(window));
        if self.desktop.borrow().fail_activate.contains(&window) {
            return Err(WinRestoreError::send(window, "_NET_ACTIVE_WINDOW", "BadWindow"));
        }
        Ok(())
    }
}
