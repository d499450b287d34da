use bytes::{BufMut, Bytes, BytesMut};

use crate::network::packet::{self, Error};

/// 会话启动失败的应答报文体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failed {
    /// 失败的会话 id
    pub session_id: u32,
    /// 人类可读的失败原因
    pub status: String,
}

impl Failed {
    pub(crate) fn read(stream: &mut Bytes) -> Result<Self, Error> {
        let session_id = packet::read_u32(stream)?;
        let status = packet::read_string(stream)?;

        Ok(Failed { session_id, status })
    }

    pub(crate) fn write(&self, stream: &mut BytesMut) {
        stream.put_u32(self.session_id);
        packet::write_string(stream, &self.status);
    }

    pub(crate) fn len(&self) -> usize {
        4 + 2 + self.status.len()
    }
}
