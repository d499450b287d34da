use bytes::{Bytes, BytesMut};

use crate::network::packet::{self, Error};

/// BroadcastQuery / Query / IndirectQuery 共用的报文体
/// 三种报文只有 opcode 不同
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// 客户端支持的认证协议名
    pub authentication_names: Vec<String>,
}

impl Query {
    pub(crate) fn read(stream: &mut Bytes) -> Result<Self, Error> {
        let authentication_names = packet::read_string_array(stream)?;

        Ok(Query {
            authentication_names,
        })
    }

    pub(crate) fn write(&self, stream: &mut BytesMut) -> Result<(), Error> {
        packet::write_string_array(stream, &self.authentication_names)
    }

    pub(crate) fn len(&self) -> usize {
        1 + self
            .authentication_names
            .iter()
            .map(|name| 2 + name.len())
            .sum::<usize>()
    }
}
