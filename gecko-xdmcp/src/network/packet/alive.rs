use bytes::{BufMut, Bytes, BytesMut};

use crate::network::packet::{self, Error};

/// display manager 对 KeepAlive 探测的应答报文体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alive {
    /// 会话是否仍在运行，报文中为一个 CARD8，非零即真
    pub session_running: bool,
    /// 会话 id
    pub session_id: u32,
}

impl Alive {
    pub(crate) fn read(stream: &mut Bytes) -> Result<Self, Error> {
        let session_running = packet::read_u8(stream)? != 0;
        let session_id = packet::read_u32(stream)?;

        Ok(Alive {
            session_running,
            session_id,
        })
    }

    pub(crate) fn write(&self, stream: &mut BytesMut) {
        stream.put_u8(self.session_running as u8);
        stream.put_u32(self.session_id);
    }

    pub(crate) fn len(&self) -> usize {
        1 + 4
    }
}
