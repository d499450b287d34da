use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use bytes::BytesMut;
use log::warn;
use tokio::{io, net::UdpSocket};

use super::packet::{self, Packet};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Packet error: {0}")]
    Packet(#[from] packet::Error),
    #[error("I/O: {0}")]
    IO(#[from] io::Error),
}

/// 客户端与 display manager 之间的连接
/// 单纯的 udp 数据报读写
/// 以 packet 为单位读写
pub(crate) struct ClientConnection {
    /// udp socket，已 connect 到 display manager 的地址
    socket: UdpSocket,
}

impl ClientConnection {
    /// 绑定同地址族的任意本地端口，并 connect 到目标地址
    pub(crate) async fn connect(addr: SocketAddr) -> Result<Self, Error> {
        let bind_addr: SocketAddr = match addr {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(addr).await?;

        Ok(Self { socket })
    }

    pub(crate) fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }

    /// 将一个 packet 编码后作为单个数据报发出
    /// 数据报只发出了一部分时记录告警，不做重试
    pub(crate) async fn send_packet(&self, packet: &Packet) -> Result<(), Error> {
        let mut stream = BytesMut::new();
        let length = packet.write(&mut stream)?;

        let written = self.socket.send(&stream).await?;
        if written != length {
            warn!("partial datagram write: {} of {} octets", written, length);
        }
        Ok(())
    }

    /// 读取一个数据报并解码为 packet
    pub(crate) async fn recv_packet(&self) -> Result<Packet, Error> {
        let mut buffer = vec![0u8; packet::MAXIMUM_PACKET_LENGTH];
        let read = self.socket.recv(&mut buffer).await?;
        buffer.truncate(read);

        Ok(Packet::read(buffer.into())?)
    }
}
