use crate::error::Result;
use crate::setup_error;
use tracing::{info, warn};

/// Тип графической сессии, в которой запущено приложение
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    X11,
    /// Wayland с XWayland: RandR-уведомления приходят только от XWayland
    XWayland,
}

/// Проверить, что есть X-дисплей, к которому можно подключиться
pub fn check_display_session() -> Result<SessionKind> {
    info!("Проверка графической сессии...");

    let display_var = std::env::var("DISPLAY").ok();
    let session_type = std::env::var("XDG_SESSION_TYPE").ok();

    let kind = classify_session(display_var.as_deref(), session_type.as_deref())?;
    match kind {
        SessionKind::X11 => info!("X11-сессия, DISPLAY={}", display_var.unwrap_or_default()),
        SessionKind::XWayland => {
            warn!("⚠️  Сессия Wayland: доступны только окна XWayland");
            warn!("   Нативные Wayland-окна не будут сохранены и восстановлены");
        }
    }

    Ok(kind)
}

fn classify_session(display: Option<&str>, session_type: Option<&str>) -> Result<SessionKind> {
    match display {
        Some(d) if !d.is_empty() => {}
        _ => return Err(setup_error!("переменная DISPLAY не задана, X-сервер недоступен")),
    }

    match session_type {
        Some("wayland") => Ok(SessionKind::XWayland),
        _ => Ok(SessionKind::X11),
    }
}
