use crate::debug_if_enabled;
use crate::error::{Result, WinRestoreError};
use crate::events::{
    Geometry, GeometryMask, SpecialFlags, StateAction, StateFlag, StateFlags, WindowHandle,
};
use std::sync::Arc;
use tracing::info;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ClientMessageEvent, ConfigureWindowAux, ConnectionExt as _, EventMask,
    GetPropertyReply, StackMode, Window,
};
use x11rb::rust_connection::RustConnection;

use super::r#trait::WindowSystem;

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        _NET_CLIENT_LIST,
        _NET_WM_NAME,
        UTF8_STRING,
        _NET_WM_STATE,
        _NET_WM_STATE_MAXIMIZED_VERT,
        _NET_WM_STATE_MAXIMIZED_HORZ,
        _NET_WM_STATE_FULLSCREEN,
        _NET_MOVERESIZE_WINDOW,
        _NET_ACTIVE_WINDOW,
    }
}

// Источник запроса в EWMH-сообщениях
const SOURCE_APPLICATION: u32 = 1;
const SOURCE_PAGER: u32 = 2;

pub struct X11WindowSystem {
    conn: Arc<RustConnection>,
    root: Window,
    atoms: Atoms,
}

impl X11WindowSystem {
    /// Подключиться к дисплею из `$DISPLAY`
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = Atoms::new(&conn)?.reply()?;

        info!("Подключено к X-серверу, экран {}, корневое окно 0x{:x}", screen_num, root);

        Ok(Self {
            conn: Arc::new(conn),
            root,
            atoms,
        })
    }

    pub fn connection(&self) -> Arc<RustConnection> {
        Arc::clone(&self.conn)
    }

    pub fn root(&self) -> Window {
        self.root
    }

    fn read_property(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
    ) -> std::result::Result<GetPropertyReply, String> {
        self.conn
            .get_property(false, window, property, type_, 0, u32::MAX)
            .map_err(|e| e.to_string())?
            .reply()
            .map_err(|e| e.to_string())
    }

    /// Отправить клиентское сообщение корневому окну от имени `window`
    fn send_message(
        &self,
        window: WindowHandle,
        request: &'static str,
        message_type: Atom,
        data: [u32; 5],
    ) -> Result<()> {
        let event = ClientMessageEvent::new(32, window.0, message_type, data);

        self.conn
            .send_event(
                false,
                self.root,
                EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
                event,
            )
            .map_err(|e| WinRestoreError::send(window, request, e))?
            .check()
            .map_err(|e| WinRestoreError::send(window, request, e))?;

        self.conn
            .flush()
            .map_err(|e| WinRestoreError::send(window, request, e))
    }
}

impl WindowSystem for X11WindowSystem {
    fn top_level_windows(&self) -> Result<Vec<WindowHandle>> {
        let root = WindowHandle(self.root);
        let reply = self
            .read_property(self.root, self.atoms._NET_CLIENT_LIST, AtomEnum::WINDOW.into())
            .map_err(|e| WinRestoreError::window(root, e))?;

        if reply.type_ != u32::from(AtomEnum::WINDOW) {
            return Err(WinRestoreError::window(
                root,
                format!("неожиданный тип _NET_CLIENT_LIST: {}", reply.type_),
            ));
        }

        let windows = reply
            .value32()
            .ok_or_else(|| WinRestoreError::window(root, "_NET_CLIENT_LIST не 32-битный"))?
            .map(WindowHandle)
            .collect();

        Ok(windows)
    }

    fn title(&self, window: WindowHandle) -> Result<String> {
        let reply = self
            .read_property(window.0, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)
            .map_err(|e| WinRestoreError::window(window, e))?;

        if reply.type_ != self.atoms.UTF8_STRING {
            return Err(WinRestoreError::window(
                window,
                format!("неожиданный тип _NET_WM_NAME: {}", reply.type_),
            ));
        }

        // Заголовок заканчивается на первом NUL, как C-строка
        let bytes = reply.value.split(|b| *b == 0).next().unwrap_or_default();
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn geometry(&self, window: WindowHandle) -> Result<Geometry> {
        let geometry = self
            .conn
            .get_geometry(window.0)
            .map_err(|e| WinRestoreError::window(window, e))?
            .reply()
            .map_err(|e| WinRestoreError::window(window, e))?;

        let translated = self
            .conn
            .translate_coordinates(window.0, geometry.root, geometry.x, geometry.y)
            .map_err(|e| WinRestoreError::window(window, e))?
            .reply()
            .map_err(|e| WinRestoreError::window(window, e))?;

        Ok(Geometry::new(
            i32::from(translated.dst_x),
            i32::from(translated.dst_y),
            u32::from(geometry.width),
            u32::from(geometry.height),
        ))
    }

    fn state_flags(&self, window: WindowHandle) -> Result<StateFlags> {
        let reply = self
            .read_property(window.0, self.atoms._NET_WM_STATE, AtomEnum::ATOM.into())
            .map_err(|e| WinRestoreError::window(window, e))?;

        // Свойство отсутствует - флагов нет
        if reply.type_ == u32::from(AtomEnum::NONE) {
            return Ok(StateFlags::new());
        }

        if reply.type_ != u32::from(AtomEnum::ATOM) {
            return Err(WinRestoreError::window(
                window,
                format!("неожиданный тип _NET_WM_STATE: {}", reply.type_),
            ));
        }

        let flags = reply
            .value32()
            .ok_or_else(|| WinRestoreError::window(window, "_NET_WM_STATE не 32-битный"))?
            .map(StateFlag)
            .collect();

        Ok(flags)
    }

    fn special_flags(&self) -> SpecialFlags {
        SpecialFlags {
            maximized_vert: StateFlag(self.atoms._NET_WM_STATE_MAXIMIZED_VERT),
            maximized_horz: StateFlag(self.atoms._NET_WM_STATE_MAXIMIZED_HORZ),
            fullscreen: StateFlag(self.atoms._NET_WM_STATE_FULLSCREEN),
        }
    }

    fn change_state(
        &self,
        window: WindowHandle,
        flags: &[StateFlag],
        action: StateAction,
    ) -> Result<()> {
        // Одно сообщение _NET_WM_STATE несёт не больше двух флагов
        for pair in flags.chunks(2) {
            let first = pair[0].0;
            let second = pair.get(1).map(|f| f.0).unwrap_or(0);

            debug_if_enabled!(
                "_NET_WM_STATE {:?} [{}, {}] для окна {}",
                action,
                first,
                second,
                window
            );

            self.send_message(
                window,
                "_NET_WM_STATE",
                self.atoms._NET_WM_STATE,
                [action as u32, first, second, SOURCE_APPLICATION, 0],
            )?;
        }

        Ok(())
    }

    fn move_resize(
        &self,
        window: WindowHandle,
        geometry: Geometry,
        mask: GeometryMask,
    ) -> Result<()> {
        // Отрицательные координаты передаются в дополнительном коде, как того требует протокол
        self.send_message(
            window,
            "_NET_MOVERESIZE_WINDOW",
            self.atoms._NET_MOVERESIZE_WINDOW,
            [
                mask.bits(),
                geometry.x as u32,
                geometry.y as u32,
                geometry.width,
                geometry.height,
            ],
        )
    }

    fn activate(&self, window: WindowHandle) -> Result<()> {
        self.send_message(
            window,
            "_NET_ACTIVE_WINDOW",
            self.atoms._NET_ACTIVE_WINDOW,
            [SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0],
        )?;

        // Аналог XMapRaised
        self.conn
            .map_window(window.0)
            .map_err(|e| WinRestoreError::send(window, "MapWindow", e))?;
        self.conn
            .configure_window(window.0, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))
            .map_err(|e| WinRestoreError::send(window, "ConfigureWindow", e))?;
        self.conn
            .flush()
            .map_err(|e| WinRestoreError::send(window, "ConfigureWindow", e))
    }
}

impl Drop for X11WindowSystem {
    fn drop(&mut self) {
        info!("Закрытие соединения с X-сервером");
    }
}
