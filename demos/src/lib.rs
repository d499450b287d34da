use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use gecko_xdmcp::client::XdmcpClient;
use gecko_xdmcp::packet::{Accept, Alive, Decline, Failed, Unwilling, Willing};
use gecko_xdmcp::Hook;
use log::{error, info};
use tokio::sync::{mpsc, Mutex};

/// 驱动一次完整 XDMCP 会话协商的 hook
/// Willing 之后发 Request，Accept 之后发 Manage，keep-alive 由外层循环负责
/// Unwilling / Decline / Failed 视为会话终结，向外发出关闭信号
pub struct SessionDriver {
    client: Arc<XdmcpClient>,
    /// 请求的 display 编号
    display_number: u16,
    /// display 类别标识
    display_class: String,
    /// display manager 可回连的本机地址
    addresses: Vec<IpAddr>,
    /// Accept 之后记录的会话 id
    session_id: Mutex<Option<u32>>,
    /// 会话终结时通知外层退出
    shutdown: mpsc::Sender<()>,
}

impl SessionDriver {
    pub fn new(
        client: Arc<XdmcpClient>,
        display_number: u16,
        display_class: String,
        addresses: Vec<IpAddr>,
        shutdown: mpsc::Sender<()>,
    ) -> Self {
        Self {
            client,
            display_number,
            display_class,
            addresses,
            session_id: Mutex::new(None),
            shutdown,
        }
    }

    /// 协商出的会话 id，Accept 之前为 None
    pub async fn session_id(&self) -> Option<u32> {
        *self.session_id.lock().await
    }
}

#[async_trait]
impl Hook for SessionDriver {
    async fn willing(&self, willing: &Willing) {
        info!("{} is willing: {}", willing.hostname, willing.status);
        if let Err(e) = self
            .client
            .send_request(
                self.display_number,
                &self.addresses,
                "",
                &[],
                &["MIT-MAGIC-COOKIE-1".to_string()],
                "unknown",
            )
            .await
        {
            error!("request failed: {}", e);
        }
    }

    async fn unwilling(&self, unwilling: &Unwilling) {
        info!("{} is unwilling: {}", unwilling.hostname, unwilling.status);
        let _ = self.shutdown.try_send(());
    }

    async fn accept(&self, accept: &Accept) {
        info!("session {} accepted", accept.session_id);
        *self.session_id.lock().await = Some(accept.session_id);
        if let Err(e) = self
            .client
            .send_manage(accept.session_id, self.display_number, &self.display_class)
            .await
        {
            error!("manage failed: {}", e);
        }
    }

    async fn decline(&self, decline: &Decline) {
        info!("session declined: {}", decline.status);
        let _ = self.shutdown.try_send(());
    }

    async fn failed(&self, failed: &Failed) {
        error!("session {} failed: {}", failed.session_id, failed.status);
        let _ = self.shutdown.try_send(());
    }

    async fn alive(&self, alive: &Alive) {
        if alive.session_running {
            info!("session {} alive", alive.session_id);
        } else {
            info!("session {} no longer running", alive.session_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn terminal_reply_signals_shutdown() {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let driver = SessionDriver::new(
            Arc::new(XdmcpClient::new()),
            0,
            "MIT-unspecified".to_string(),
            vec![],
            shutdown_tx,
        );

        driver
            .unwilling(&Unwilling {
                hostname: "dm.example.com".into(),
                status: "full".into(),
            })
            .await;
        assert!(shutdown_rx.recv().await.is_some());

        driver
            .failed(&Failed {
                session_id: 7,
                status: "session not started".into(),
            })
            .await;
        assert!(shutdown_rx.recv().await.is_some());
    }
}
