use bytes::{Bytes, BytesMut};

use crate::network::packet::{self, Error};

/// 会话请求被拒绝时的应答报文体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decline {
    /// 人类可读的拒绝原因
    pub status: String,
    /// 认证协议名
    pub authentication_name: String,
    /// 认证数据，对编解码不透明
    pub authentication_data: Bytes,
}

impl Decline {
    pub(crate) fn read(stream: &mut Bytes) -> Result<Self, Error> {
        let status = packet::read_string(stream)?;
        let authentication_name = packet::read_string(stream)?;
        let authentication_data = packet::read_bytes(stream)?;

        Ok(Decline {
            status,
            authentication_name,
            authentication_data,
        })
    }

    pub(crate) fn write(&self, stream: &mut BytesMut) {
        packet::write_string(stream, &self.status);
        packet::write_string(stream, &self.authentication_name);
        packet::write_bytes(stream, &self.authentication_data);
    }

    pub(crate) fn len(&self) -> usize {
        2 + self.status.len()
            + 2
            + self.authentication_name.len()
            + 2
            + self.authentication_data.len()
    }
}
