use smallvec::SmallVec;
use std::fmt;
use tokio::time::Instant;

/// Непрозрачный идентификатор окна верхнего уровня
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub u32);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Геометрия окна в координатах корневого окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}{:+}{:+}", self.width, self.height, self.x, self.y)
    }
}

/// Какие поля геометрии оконный менеджер должен применить
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryMask {
    pub x: bool,
    pub y: bool,
    pub width: bool,
    pub height: bool,
}

impl GeometryMask {
    pub const ALL: Self = Self {
        x: true,
        y: true,
        width: true,
        height: true,
    };

    /// Биты 8..11 первого слова `_NET_MOVERESIZE_WINDOW` (gravity = 0)
    pub fn bits(&self) -> u32 {
        let mut bits = 0;
        if self.x {
            bits |= 1 << 8;
        }
        if self.y {
            bits |= 1 << 9;
        }
        if self.width {
            bits |= 1 << 10;
        }
        if self.height {
            bits |= 1 << 11;
        }
        bits
    }
}

/// Непрозрачный флаг состояния оконного менеджера (атом `_NET_WM_STATE_*`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateFlag(pub u32);

/// Флаги в порядке чтения: без сортировки и без удаления дубликатов
pub type StateFlags = SmallVec<[StateFlag; 4]>;

/// Флаги, которые алгоритм восстановления обрабатывает особо
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialFlags {
    pub maximized_vert: StateFlag,
    pub maximized_horz: StateFlag,
    pub fullscreen: StateFlag,
}

impl SpecialFlags {
    pub fn is_special(&self, flag: StateFlag) -> bool {
        flag == self.maximized_vert || flag == self.maximized_horz || flag == self.fullscreen
    }

    /// Набор без maximize/fullscreen
    pub fn filter(&self, flags: &[StateFlag]) -> StateFlags {
        flags.iter().copied().filter(|f| !self.is_special(*f)).collect()
    }
}

/// Действие над флагами, как его кодирует `_NET_WM_STATE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    Remove = 0,
    Add = 1,
}

/// Снимок одного окна, сделанный пока топология была исходной
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub handle: WindowHandle,
    pub title: String,
    pub geometry: Geometry,
    pub flags: StateFlags,
}

impl fmt::Display for WindowSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({}) -> {}", self.title, self.handle, self.geometry)
    }
}

/// Полный набор снимков текущего периода; заменяется целиком при каждом захвате
#[derive(Debug, Clone)]
pub struct SnapshotSet {
    windows: Vec<WindowSnapshot>,
    captured_at: Instant,
}

impl SnapshotSet {
    pub fn new(windows: Vec<WindowSnapshot>) -> Self {
        Self {
            windows,
            captured_at: Instant::now(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WindowSnapshot> {
        self.windows.iter()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }
}

impl<'a> IntoIterator for &'a SnapshotSet {
    type Item = &'a WindowSnapshot;
    type IntoIter = std::slice::Iter<'a, WindowSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.windows.iter()
    }
}
