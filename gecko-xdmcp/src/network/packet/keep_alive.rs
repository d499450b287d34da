use bytes::{BufMut, Bytes, BytesMut};

use crate::network::packet::{self, Error};

/// 客户端确认会话存活的探测报文体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAlive {
    /// 会话所在的 display 编号
    pub display_number: u16,
    /// 会话 id
    pub session_id: u32,
}

impl KeepAlive {
    pub(crate) fn read(stream: &mut Bytes) -> Result<Self, Error> {
        let display_number = packet::read_u16(stream)?;
        let session_id = packet::read_u32(stream)?;

        Ok(KeepAlive {
            display_number,
            session_id,
        })
    }

    pub(crate) fn write(&self, stream: &mut BytesMut) {
        stream.put_u16(self.display_number);
        stream.put_u32(self.session_id);
    }

    pub(crate) fn len(&self) -> usize {
        2 + 4
    }
}
