use bytes::{BufMut, Bytes, BytesMut};

use crate::network::packet::{self, Error};

/// display manager 拒绝接管会话的应答报文体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refuse {
    /// 被拒绝的会话 id
    pub session_id: u32,
}

impl Refuse {
    pub(crate) fn read(stream: &mut Bytes) -> Result<Self, Error> {
        let session_id = packet::read_u32(stream)?;

        Ok(Refuse { session_id })
    }

    pub(crate) fn write(&self, stream: &mut BytesMut) {
        stream.put_u32(self.session_id);
    }

    pub(crate) fn len(&self) -> usize {
        4
    }
}
