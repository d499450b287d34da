use bytes::{Bytes, BytesMut};

use crate::network::packet::{self, Error};

/// display manager 愿意提供会话时的应答报文体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Willing {
    /// 会话使用的认证协议名
    pub authentication_name: String,
    /// display manager 主机名
    pub hostname: String,
    /// 人类可读的状态描述
    pub status: String,
}

impl Willing {
    pub(crate) fn read(stream: &mut Bytes) -> Result<Self, Error> {
        let authentication_name = packet::read_string(stream)?;
        let hostname = packet::read_string(stream)?;
        let status = packet::read_string(stream)?;

        Ok(Willing {
            authentication_name,
            hostname,
            status,
        })
    }

    pub(crate) fn write(&self, stream: &mut BytesMut) {
        packet::write_string(stream, &self.authentication_name);
        packet::write_string(stream, &self.hostname);
        packet::write_string(stream, &self.status);
    }

    pub(crate) fn len(&self) -> usize {
        2 + self.authentication_name.len() + 2 + self.hostname.len() + 2 + self.status.len()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn willing_parsing_works() {
        let mut stream = Bytes::from_static(&[
            0x00, 0x00, // authentication name, empty
            0x00, 0x0e, // hostname length
            b'd', b'm', b'.', b'e', b'x', b'a', b'm', b'p', b'l', b'e', b'.', b'c', b'o',
            b'm', // hostname
            0x00, 0x07, // status length
            b'0', b' ', b'u', b's', b'e', b'r', b's', // status
        ]);

        let willing = Willing::read(&mut stream).unwrap();

        assert_eq!(
            willing,
            Willing {
                authentication_name: "".into(),
                hostname: "dm.example.com".into(),
                status: "0 users".into(),
            }
        );
        assert_eq!(willing.len(), 27);
    }
}
