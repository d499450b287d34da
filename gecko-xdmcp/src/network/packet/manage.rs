use bytes::{BufMut, Bytes, BytesMut};

use crate::network::packet::{self, Error};

/// 客户端确认接管会话的报文体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manage {
    /// Accept 报文带回的会话 id
    pub session_id: u32,
    /// 客户端请求的 display 编号
    pub display_number: u16,
    /// display 类别标识
    pub display_class: String,
}

impl Manage {
    pub(crate) fn read(stream: &mut Bytes) -> Result<Self, Error> {
        let session_id = packet::read_u32(stream)?;
        let display_number = packet::read_u16(stream)?;
        let display_class = packet::read_string(stream)?;

        Ok(Manage {
            session_id,
            display_number,
            display_class,
        })
    }

    pub(crate) fn write(&self, stream: &mut BytesMut) {
        stream.put_u32(self.session_id);
        stream.put_u16(self.display_number);
        packet::write_string(stream, &self.display_class);
    }

    pub(crate) fn len(&self) -> usize {
        4 + 2 + 2 + self.display_class.len()
    }
}
