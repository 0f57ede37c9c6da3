use crate::error::{Result, WinRestoreError};
use crate::events::TopologyEvent;
use crate::setup_error;
use std::sync::Arc;
use tokio::sync::{mpsc::UnboundedSender, oneshot};
use tracing::{debug, info};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xproto::Window;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use super::r#trait::TopologyMonitor;

pub struct RandrMonitor {
    conn: Arc<RustConnection>,
}

impl RandrMonitor {
    /// Проверить наличие RandR и подписать корневое окно на RRScreenChangeNotify
    pub fn new(conn: Arc<RustConnection>, root: Window) -> Result<Self> {
        info!("Инициализация RandrMonitor");

        let extension = conn
            .extension_information(randr::X11_EXTENSION_NAME)
            .map_err(|e| setup_error!("не удалось запросить расширение RandR: {}", e))?;
        if extension.is_none() {
            return Err(setup_error!("X11 RandR extension is not available"));
        }

        let version = conn
            .randr_query_version(1, 2)
            .map_err(|e| setup_error!("RRQueryVersion: {}", e))?
            .reply()
            .map_err(|e| setup_error!("RRQueryVersion: {}", e))?;
        info!("RandR {}.{}", version.major_version, version.minor_version);

        conn.randr_select_input(root, randr::NotifyMask::SCREEN_CHANGE)
            .map_err(|e| setup_error!("RRSelectInput: {}", e))?
            .check()
            .map_err(|e| setup_error!("RRSelectInput: {}", e))?;
        conn.flush()?;

        Ok(Self { conn })
    }

    /// Блокирующий цикл чтения событий X-сервера
    fn pump(conn: &RustConnection, tx: &UnboundedSender<TopologyEvent>) -> Result<()> {
        loop {
            let event = conn.wait_for_event()?;

            let Event::RandrScreenChangeNotify(notify) = event else {
                continue;
            };

            let topology = TopologyEvent::new(u32::from(notify.width), u32::from(notify.height));
            debug!("RRScreenChangeNotify: {}", topology.resolution);

            if tx.send(topology).is_err() {
                debug!("Получатель событий топологии закрыт, RandrMonitor завершается");
                return Ok(());
            }
        }
    }
}

#[async_trait::async_trait]
impl TopologyMonitor for RandrMonitor {
    async fn run(self: Box<Self>, tx: UnboundedSender<TopologyEvent>) -> Result<()> {
        info!("RandrMonitor запущен");

        // Отдельный поток, а не spawn_blocking: wait_for_event не прерывается,
        // и рантайм не должен ждать его при завершении процесса
        let (done_tx, done_rx) = oneshot::channel();
        let conn = self.conn;
        std::thread::Builder::new()
            .name("randr-events".to_string())
            .spawn(move || {
                let _ = done_tx.send(Self::pump(&conn, &tx));
            })?;

        done_rx.await.map_err(|_| {
            WinRestoreError::Task("поток randr-events завершился без результата".to_string())
        })?
    }
}
