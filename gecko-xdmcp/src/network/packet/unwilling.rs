use bytes::{Bytes, BytesMut};

use crate::network::packet::{self, Error};

/// display manager 拒绝提供会话时的应答报文体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unwilling {
    /// display manager 主机名
    pub hostname: String,
    /// 人类可读的拒绝原因
    pub status: String,
}

impl Unwilling {
    pub(crate) fn read(stream: &mut Bytes) -> Result<Self, Error> {
        let hostname = packet::read_string(stream)?;
        let status = packet::read_string(stream)?;

        Ok(Unwilling { hostname, status })
    }

    pub(crate) fn write(&self, stream: &mut BytesMut) {
        packet::write_string(stream, &self.hostname);
        packet::write_string(stream, &self.status);
    }

    pub(crate) fn len(&self) -> usize {
        2 + self.hostname.len() + 2 + self.status.len()
    }
}
