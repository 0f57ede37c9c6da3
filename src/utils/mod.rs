pub mod session;

pub use session::check_display_session;

// ✅ Макрос условного логирования для горячих путей (захват каждые несколько секунд)
#[macro_export]
macro_rules! debug_if_enabled {
    ($($arg:tt)*) => {
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!($($arg)*);
        }
    };
}
