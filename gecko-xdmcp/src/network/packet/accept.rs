use bytes::{BufMut, Bytes, BytesMut};

use crate::network::packet::{self, Error};

/// 会话请求被接受时的应答报文体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accept {
    /// display manager 分配的会话 id
    pub session_id: u32,
    /// 认证协议名
    pub authentication_name: String,
    /// 认证数据，对编解码不透明
    pub authentication_data: Bytes,
    /// 授权协议名
    pub authorization_name: String,
    /// 授权数据，对编解码不透明
    pub authorization_data: Bytes,
}

impl Accept {
    pub(crate) fn read(stream: &mut Bytes) -> Result<Self, Error> {
        let session_id = packet::read_u32(stream)?;
        let authentication_name = packet::read_string(stream)?;
        let authentication_data = packet::read_bytes(stream)?;
        let authorization_name = packet::read_string(stream)?;
        let authorization_data = packet::read_bytes(stream)?;

        Ok(Accept {
            session_id,
            authentication_name,
            authentication_data,
            authorization_name,
            authorization_data,
        })
    }

    pub(crate) fn write(&self, stream: &mut BytesMut) {
        stream.put_u32(self.session_id);
        packet::write_string(stream, &self.authentication_name);
        packet::write_bytes(stream, &self.authentication_data);
        packet::write_string(stream, &self.authorization_name);
        packet::write_bytes(stream, &self.authorization_data);
    }

    pub(crate) fn len(&self) -> usize {
        4 + 2
            + self.authentication_name.len()
            + 2
            + self.authentication_data.len()
            + 2
            + self.authorization_name.len()
            + 2
            + self.authorization_data.len()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn accept_parsing_works() {
        let mut stream = Bytes::from_static(&[
            0x00, 0x00, 0x00, 0x64, // session id
            0x00, 0x00, // authentication name, empty
            0x00, 0x00, // authentication data, empty
            0x00, 0x12, // authorization name length
            b'M', b'I', b'T', b'-', b'M', b'A', b'G', b'I', b'C', b'-', b'C', b'O', b'O',
            b'K', b'I', b'E', b'-', b'1', // authorization name
            0x00, 0x04, 0xde, 0xad, 0xbe, 0xef, // authorization data
        ]);

        let accept = Accept::read(&mut stream).unwrap();

        assert_eq!(
            accept,
            Accept {
                session_id: 100,
                authentication_name: "".into(),
                authentication_data: Bytes::new(),
                authorization_name: "MIT-MAGIC-COOKIE-1".into(),
                authorization_data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
            }
        );
    }
}
