use crate::events::WindowHandle;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WinRestoreError {
    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Не удалось подключиться к X-серверу: {0}")]
    X11Connect(#[from] x11rb::errors::ConnectError),

    #[error("Ошибка соединения с X-сервером: {0}")]
    X11Connection(#[from] x11rb::errors::ConnectionError),

    #[error("Ошибка ответа X-сервера: {0}")]
    X11Reply(#[from] x11rb::errors::ReplyError),

    /// Сбой чтения или записи состояния одного окна. Никогда не фатален.
    #[error("Окно {window}: {reason}")]
    Window { window: WindowHandle, reason: String },

    /// Запрос к оконному менеджеру не доставлен. Не повторяется в рамках прохода.
    #[error("Не удалось отправить {request} окну {window}: {reason}")]
    Send {
        window: WindowHandle,
        request: &'static str,
        reason: String,
    },

    /// Подписка на уведомления или нужное расширение недоступны. Фатально при старте.
    #[error("Ошибка инициализации протокола: {0}")]
    ProtocolSetup(String),

    #[error("Фоновая задача завершилась аварийно: {0}")]
    Task(String),

    #[error("Источник событий топологии закрыт")]
    SourceClosed,
}

impl WinRestoreError {
    pub fn window(window: WindowHandle, reason: impl ToString) -> Self {
        WinRestoreError::Window {
            window,
            reason: reason.to_string(),
        }
    }

    pub fn send(window: WindowHandle, request: &'static str, reason: impl ToString) -> Self {
        WinRestoreError::Send {
            window,
            request,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WinRestoreError>;

// Удобный макрос для ошибок инициализации
#[macro_export]
macro_rules! setup_error {
    ($($arg:tt)*) => {
        $crate::error::WinRestoreError::ProtocolSetup(format!($($arg)*))
    };
}
