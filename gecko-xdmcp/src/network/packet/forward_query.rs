use bytes::{Bytes, BytesMut};

use crate::network::packet::{self, Error};

/// 由转发者（如 NAT 网关）代替客户端发出的查询报文体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardQuery {
    /// 原始客户端地址
    pub client_address: Bytes,
    /// 原始客户端端口
    pub client_port: Bytes,
    /// 客户端支持的认证协议名
    pub authentication_names: Vec<String>,
}

impl ForwardQuery {
    pub(crate) fn read(stream: &mut Bytes) -> Result<Self, Error> {
        let client_address = packet::read_bytes(stream)?;
        let client_port = packet::read_bytes(stream)?;
        let authentication_names = packet::read_string_array(stream)?;

        Ok(ForwardQuery {
            client_address,
            client_port,
            authentication_names,
        })
    }

    pub(crate) fn write(&self, stream: &mut BytesMut) -> Result<(), Error> {
        packet::write_bytes(stream, &self.client_address);
        packet::write_bytes(stream, &self.client_port);
        packet::write_string_array(stream, &self.authentication_names)
    }

    pub(crate) fn len(&self) -> usize {
        2 + self.client_address.len()
            + 2
            + self.client_port.len()
            + 1
            + self
                .authentication_names
                .iter()
                .map(|name| 2 + name.len())
                .sum::<usize>()
    }
}
