//! XDMCP 客户端会话
//! 会话本身不保存协商状态，何时发送哪种报文由调用方（编排层）决定

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use bytes::Bytes;
use log::{debug, warn};
use tokio::{io, net};

use crate::network::packet::{
    Connection, KeepAlive, Manage, Packet, Query, Request, FAMILY_INTERNET, FAMILY_INTERNET6,
};
use crate::network::{conn, ClientConnection};
use crate::Hook;

/// XDMCP 约定端口
pub const XDMCP_PORT: u16 = 177;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(#[from] conn::Error),
    #[error("I/O: {0}")]
    IO(#[from] io::Error),
    #[error("No reachable address for {0}")]
    NoReachableAddress(String),
    #[error("Client not started")]
    NotStarted,
}

/// XDMCP 客户端
pub struct XdmcpClient {
    /// display manager 主机名
    host: String,
    /// display manager 端口
    port: u16,
    /// 已建立的连接，start 之后可用
    conn: Option<ClientConnection>,
}

impl XdmcpClient {
    pub fn new() -> Self {
        Self {
            host: String::new(),
            port: XDMCP_PORT,
            conn: None,
        }
    }

    /// 设置 display manager 主机名
    /// start 之后调用不影响已建立的连接
    pub fn set_hostname(&mut self, hostname: &str) {
        self.host = hostname.to_string();
    }

    /// 设置 display manager 端口
    /// start 之后调用不影响已建立的连接
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    /// 解析主机名并建立 udp 连接，按解析顺序逐个尝试候选地址
    /// 已启动的客户端重复调用直接返回成功
    pub async fn start(&mut self) -> Result<(), Error> {
        if self.conn.is_some() {
            return Ok(());
        }

        let candidates = net::lookup_host((self.host.as_str(), self.port)).await?;
        for addr in candidates {
            match ClientConnection::connect(addr).await {
                Ok(conn) => {
                    debug!("XDMCP socket connected to {}", addr);
                    self.conn = Some(conn);
                    return Ok(());
                }
                Err(e) => warn!("unable to connect XDMCP socket to {}: {}", addr, e),
            }
        }

        Err(Error::NoReachableAddress(self.host.clone()))
    }

    /// 连接的本地地址，start 之前为 None
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.conn.as_ref().and_then(|conn| conn.local_addr().ok())
    }

    fn connection(&self) -> Result<&ClientConnection, Error> {
        self.conn.as_ref().ok_or(Error::NotStarted)
    }

    async fn send_packet(&self, packet: Packet) -> Result<(), Error> {
        let conn = self.connection()?;
        debug!("sending {}", packet);
        conn.send_packet(&packet).await?;
        Ok(())
    }

    /// 三种查询报文共用的发送入口，只有 opcode 不同
    async fn send_query_packet(
        &self,
        build: fn(Query) -> Packet,
        authentication_names: &[String],
    ) -> Result<(), Error> {
        self.send_packet(build(Query {
            authentication_names: authentication_names.to_vec(),
        }))
        .await
    }

    /// 向 display manager 查询是否愿意提供会话
    pub async fn send_query(&self, authentication_names: &[String]) -> Result<(), Error> {
        self.send_query_packet(Packet::Query, authentication_names)
            .await
    }

    /// 广播查询
    pub async fn send_broadcast_query(&self, authentication_names: &[String]) -> Result<(), Error> {
        self.send_query_packet(Packet::BroadcastQuery, authentication_names)
            .await
    }

    /// 经转发节点的间接查询
    pub async fn send_indirect_query(&self, authentication_names: &[String]) -> Result<(), Error> {
        self.send_query_packet(Packet::IndirectQuery, authentication_names)
            .await
    }

    /// 请求 display manager 建立会话
    /// addresses 为 display manager 可回连的本机地址，按地址族映射连接类型
    pub async fn send_request(
        &self,
        display_number: u16,
        addresses: &[IpAddr],
        authentication_name: &str,
        authentication_data: &[u8],
        authorization_names: &[String],
        manufacturer_display_id: &str,
    ) -> Result<(), Error> {
        let connections = addresses
            .iter()
            .map(|address| match address {
                IpAddr::V4(v4) => Connection {
                    family: FAMILY_INTERNET,
                    address: Bytes::copy_from_slice(&v4.octets()),
                },
                IpAddr::V6(v6) => Connection {
                    family: FAMILY_INTERNET6,
                    address: Bytes::copy_from_slice(&v6.octets()),
                },
            })
            .collect();

        self.send_packet(Packet::Request(Request {
            display_number,
            connections,
            authentication_name: authentication_name.to_string(),
            authentication_data: Bytes::copy_from_slice(authentication_data),
            authorization_names: authorization_names.to_vec(),
            manufacturer_display_id: manufacturer_display_id.to_string(),
        }))
        .await
    }

    /// 确认接管 Accept 应答中的会话
    pub async fn send_manage(
        &self,
        session_id: u32,
        display_number: u16,
        display_class: &str,
    ) -> Result<(), Error> {
        self.send_packet(Packet::Manage(Manage {
            session_id,
            display_number,
            display_class: display_class.to_string(),
        }))
        .await
    }

    /// 探测会话是否仍然存活
    pub async fn send_keep_alive(&self, display_number: u16, session_id: u32) -> Result<(), Error> {
        self.send_packet(Packet::KeepAlive(KeepAlive {
            display_number,
            session_id,
        }))
        .await
    }

    /// 读取并处理一个入站数据报，每个数据报至多触发一次回调
    /// 解码失败只告警不中断会话，socket 错误返回 Err
    pub async fn dispatch_once<H: Hook>(&self, hook: &H) -> Result<(), Error> {
        let conn = self.connection()?;
        let packet = match conn.recv_packet().await {
            Ok(packet) => packet,
            Err(conn::Error::Packet(e)) => {
                warn!("ignoring malformed XDMCP packet: {}", e);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        debug!("received {}", packet);
        match packet {
            Packet::Willing(willing) => hook.willing(&willing).await,
            Packet::Unwilling(unwilling) => hook.unwilling(&unwilling).await,
            Packet::Accept(accept) => hook.accept(&accept).await,
            Packet::Decline(decline) => hook.decline(&decline).await,
            Packet::Failed(failed) => hook.failed(&failed).await,
            Packet::Alive(alive) => hook.alive(&alive).await,
            // 其余报文只该由客户端发出，入站时忽略
            packet => debug!("ignoring unexpected {:?} packet", packet.opcode()),
        }

        Ok(())
    }

    /// 持续处理入站数据报，socket 出错才返回
    pub async fn event_loop<H: Hook>(&self, hook: Arc<H>) -> Result<(), Error> {
        loop {
            self.dispatch_once(hook.as_ref()).await?;
        }
    }
}

impl Default for XdmcpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::BytesMut;
    use tokio::net::UdpSocket;

    use super::*;
    use crate::network::packet::{Accept, Alive, Decline, Failed, Unwilling, Willing};

    /// 按回调触发顺序记录事件的 hook
    #[derive(Default)]
    struct RecordingHook {
        events: Mutex<Vec<String>>,
    }

    impl RecordingHook {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Hook for RecordingHook {
        async fn willing(&self, willing: &Willing) {
            self.push(format!("willing {}", willing.hostname));
        }
        async fn unwilling(&self, _unwilling: &Unwilling) {
            self.push("unwilling".into());
        }
        async fn accept(&self, accept: &Accept) {
            self.push(format!("accept {}", accept.session_id));
        }
        async fn decline(&self, _decline: &Decline) {
            self.push("decline".into());
        }
        async fn failed(&self, _failed: &Failed) {
            self.push("failed".into());
        }
        async fn alive(&self, _alive: &Alive) {
            self.push("alive".into());
        }
    }

    /// 绑定一个扮演 display manager 的 udp socket，返回已连上它的客户端
    async fn started_client() -> (XdmcpClient, UdpSocket) {
        let manager = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = manager.local_addr().unwrap().port();

        let mut client = XdmcpClient::new();
        client.set_hostname("127.0.0.1");
        client.set_port(port);
        client.start().await.unwrap();

        (client, manager)
    }

    /// 以 display manager 的身份向客户端回包
    async fn reply(manager: &UdpSocket, client: &XdmcpClient, packet: Packet) {
        let mut stream = BytesMut::new();
        packet.write(&mut stream).unwrap();
        let port = client.local_addr().unwrap().port();
        manager
            .send_to(&stream, ("127.0.0.1", port))
            .await
            .unwrap();
    }

    /// 从 display manager 一侧收一个数据报并解码
    async fn receive(manager: &UdpSocket) -> Packet {
        let mut buffer = vec![0u8; 65535];
        let (read, _) = manager.recv_from(&mut buffer).await.unwrap();
        buffer.truncate(read);
        Packet::read(buffer.into()).unwrap()
    }

    #[tokio::test]
    async fn query_reaches_manager() {
        let (client, manager) = started_client().await;

        client
            .send_query(&["MIT-MAGIC-COOKIE-1".to_string()])
            .await
            .unwrap();

        match receive(&manager).await {
            Packet::Query(query) => {
                assert_eq!(
                    query.authentication_names,
                    vec!["MIT-MAGIC-COOKIE-1".to_string()]
                )
            }
            packet => panic!("unexpected packet: {}", packet),
        }
    }

    #[tokio::test]
    async fn request_maps_address_families() {
        let (client, manager) = started_client().await;

        let addresses = vec![
            "192.168.0.7".parse::<IpAddr>().unwrap(),
            "fe80::1".parse::<IpAddr>().unwrap(),
        ];
        client
            .send_request(1, &addresses, "", &[], &["MIT-MAGIC-COOKIE-1".to_string()], "")
            .await
            .unwrap();

        match receive(&manager).await {
            Packet::Request(request) => {
                assert_eq!(request.display_number, 1);
                assert_eq!(request.connections.len(), 2);
                assert_eq!(request.connections[0].family, FAMILY_INTERNET);
                assert_eq!(request.connections[0].address.len(), 4);
                assert_eq!(request.connections[1].family, FAMILY_INTERNET6);
                assert_eq!(request.connections[1].address.len(), 16);
            }
            packet => panic!("unexpected packet: {}", packet),
        }
    }

    #[tokio::test]
    async fn dispatch_willing_works() {
        let (client, manager) = started_client().await;
        let hook = RecordingHook::default();

        reply(
            &manager,
            &client,
            Packet::Willing(Willing {
                authentication_name: "".into(),
                hostname: "dm.example.com".into(),
                status: "0 users".into(),
            }),
        )
        .await;

        client.dispatch_once(&hook).await.unwrap();

        assert_eq!(hook.events(), vec!["willing dm.example.com".to_string()]);
    }

    #[tokio::test]
    async fn dispatch_survives_unknown_opcode() {
        let (client, manager) = started_client().await;
        let hook = RecordingHook::default();

        // 报文头合法，opcode 99 不在协议内
        let port = client.local_addr().unwrap().port();
        manager
            .send_to(&[0x00, 0x01, 0x00, 0x63, 0x00, 0x00], ("127.0.0.1", port))
            .await
            .unwrap();
        client.dispatch_once(&hook).await.unwrap();
        assert!(hook.events().is_empty());

        // 会话继续可用
        reply(
            &manager,
            &client,
            Packet::Alive(Alive {
                session_running: true,
                session_id: 9,
            }),
        )
        .await;
        client.dispatch_once(&hook).await.unwrap();
        assert_eq!(hook.events(), vec!["alive".to_string()]);
    }

    #[tokio::test]
    async fn dispatch_ignores_inbound_query() {
        let (client, manager) = started_client().await;
        let hook = RecordingHook::default();

        // 客户端侧报文从对端进来，合法但没有对应回调
        reply(
            &manager,
            &client,
            Packet::Query(Query {
                authentication_names: vec![],
            }),
        )
        .await;
        client.dispatch_once(&hook).await.unwrap();

        assert!(hook.events().is_empty());
    }

    #[tokio::test]
    async fn send_before_start_rejected() {
        let client = XdmcpClient::new();

        let result = client.send_query(&[]).await;

        assert!(matches!(result, Err(Error::NotStarted)));
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let (mut client, _manager) = started_client().await;
        let addr = client.local_addr().unwrap();

        client.start().await.unwrap();

        assert_eq!(client.local_addr().unwrap(), addr);
    }
}
