use anyhow::{Context, Result};
use clap::{error::ErrorKind, Parser};
use std::path::PathBuf;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::{CliOverrides, Config, LoggingConfig};
use services::{create_topology_monitor, create_window_system, MainLoop, X11WindowSystem};

#[derive(Parser, Debug)]
#[command(name = "winrestore", version)]
#[command(
    about = "Сохраняет положение окон и восстанавливает его после отключения и повторного подключения мониторов"
)]
struct Args {
    /// Ширина исходной области экранов в пикселях
    #[arg(short = 'x', long = "width")]
    width: u32,

    /// Высота исходной области экранов в пикселях
    #[arg(short = 'y', long = "height")]
    height: u32,

    /// Период сохранения положения окон, мс (по умолчанию 5000)
    #[arg(short = 'r', long = "refresh")]
    refresh: Option<u64>,

    /// Тишина после последнего события RandR, после которой снимок обновляется,
    /// мс (по умолчанию 2000)
    #[arg(short = 's', long = "screen-timeout")]
    screen_timeout: Option<u64>,

    /// Тишина после возврата исходных экранов перед восстановлением, мс (по умолчанию 2000)
    #[arg(long = "restore-timeout")]
    restore_timeout: Option<u64>,

    /// Пауза перед повторной установкой fullscreen, мс (по умолчанию 1000)
    #[arg(long = "fullscreen-delay")]
    fullscreen_delay: Option<u64>,

    /// Заголовки окон через запятую, которые не сохраняются и не восстанавливаются
    #[arg(short = 'e', long = "exclude", value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// Заголовок окна, которое выводится на передний план при потере экранов
    #[arg(long = "activate")]
    activate: Option<String>,

    /// Пауза перед активацией окна, мс
    #[arg(long = "activate-delay")]
    activate_delay: Option<u64>,

    /// Путь к файлу конфигурации
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Уровень логирования
    #[arg(long)]
    log_level: Option<String>,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            width: Some(self.width),
            height: Some(self.height),
            poll_period_ms: self.refresh,
            capture_debounce_ms: self.screen_timeout,
            restore_settle_ms: self.restore_timeout,
            fullscreen_settle_ms: self.fullscreen_delay,
            exclude: self.exclude.clone(),
            escalation_target: self.activate.clone(),
            escalation_delay_ms: self.activate_delay,
            log_level: self.log_level.clone(),
        }
    }
}

/// Справка и любые ошибки разбора печатаются в stderr с кодом выхода 1
fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(err) if err.kind() == ErrorKind::DisplayVersion => {
            let _ = err.print();
            std::process::exit(0);
        }
        Err(err) => {
            eprint!("{}", err.render());
            std::process::exit(1);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = parse_args();

    let config = Config::load(args.config.as_deref(), args.overrides())?;

    // Инициализация системы логирования
    init_tracing(&config.logging)?;

    info!("Запуск winrestore v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        info!("Конфигурация загружена из: {:?}", path);
    }
    info!(
        "Исходное разрешение {}, исключения: {:?}",
        config.original_resolution(),
        config.windows.exclude
    );

    if args.dry_run {
        warn!("Режим сухого запуска - окна не перемещаются, смена экранов эмулируется");
    }

    // Проверка графической сессии
    utils::check_display_session()?;

    // Инициализация компонентов: ошибки здесь фатальны
    let x11 = X11WindowSystem::connect().context("Не удалось подключиться к X-серверу")?;
    let monitor = create_topology_monitor(&x11, config.original_resolution(), args.dry_run)
        .context("Не удалось подписаться на события RandR")?;
    let windows = create_window_system(x11, args.dry_run);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let main_loop = MainLoop::new(&config, windows, events_rx);
    let monitor_handle = tokio::spawn(monitor.run(events_tx));

    info!("Все компоненты инициализированы");

    tokio::select! {
        result = main_loop.run() => {
            if let Err(e) = result {
                error!("Ошибка в MainLoop: {}", e);
                return Err(e.into());
            }
        }
        result = monitor_handle => {
            match result {
                Ok(Ok(())) => warn!("TopologyMonitor завершил работу"),
                Ok(Err(e)) => {
                    error!("Ошибка в TopologyMonitor: {}", e);
                    return Err(e.into());
                }
                Err(e) => {
                    error!("Задача TopologyMonitor аварийно завершилась: {}", e);
                    return Err(e.into());
                }
            }
        }
        signal = signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
            }
        }
    }

    info!("winrestore завершил работу");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))?;

    // Диагностика идёт в stderr, stdout остаётся свободным
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match logging.format.as_str() {
        "compact" => tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .init(),
        _ => tracing_subscriber::registry().with(filter).with(layer).init(),
    }

    Ok(())
}
