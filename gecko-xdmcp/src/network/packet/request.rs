use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, Bytes, BytesMut};

use crate::network::packet::{self, Error};

/// IPv4 连接类型，即 X 授权里的 FamilyInternet
pub const FAMILY_INTERNET: u16 = 0;
/// IPv6 连接类型，即 FamilyInternet6
pub const FAMILY_INTERNET6: u16 = 6;

/// 会话请求报文体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// 客户端请求的 display 编号
    pub display_number: u16,
    /// display manager 可回连的客户端地址列表
    pub connections: Vec<Connection>,
    /// 认证协议名
    pub authentication_name: String,
    /// 认证数据，对编解码不透明
    pub authentication_data: Bytes,
    /// 客户端支持的授权协议名
    pub authorization_names: Vec<String>,
    /// 厂商 display 标识
    pub manufacturer_display_id: String,
}

/// display manager 回连客户端所用的一个地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// 地址族
    pub family: u16,
    /// 地址字节
    pub address: Bytes,
}

impl Request {
    pub(crate) fn read(stream: &mut Bytes) -> Result<Self, Error> {
        let display_number = packet::read_u16(stream)?;

        // 连接类型与连接地址各带一个计数，协议要求两者一致
        let type_count = packet::read_u8(stream)?;
        let mut families = Vec::with_capacity(type_count as usize);
        for _ in 0..type_count {
            families.push(packet::read_u16(stream)?);
        }
        let address_count = packet::read_u8(stream)?;
        if address_count != type_count {
            return Err(Error::ConnectionCountMismatch {
                types: type_count,
                addresses: address_count,
            });
        }
        let mut connections = Vec::with_capacity(families.len());
        for family in families {
            connections.push(Connection {
                family,
                address: packet::read_bytes(stream)?,
            });
        }

        let authentication_name = packet::read_string(stream)?;
        let authentication_data = packet::read_bytes(stream)?;
        let authorization_names = packet::read_string_array(stream)?;
        let manufacturer_display_id = packet::read_string(stream)?;

        Ok(Request {
            display_number,
            connections,
            authentication_name,
            authentication_data,
            authorization_names,
            manufacturer_display_id,
        })
    }

    pub(crate) fn write(&self, stream: &mut BytesMut) -> Result<(), Error> {
        if self.connections.len() > u8::MAX as usize {
            return Err(Error::ArrayTooLong(self.connections.len()));
        }

        stream.put_u16(self.display_number);
        stream.put_u8(self.connections.len() as u8);
        for connection in &self.connections {
            stream.put_u16(connection.family);
        }
        stream.put_u8(self.connections.len() as u8);
        for connection in &self.connections {
            packet::write_bytes(stream, &connection.address);
        }
        packet::write_string(stream, &self.authentication_name);
        packet::write_bytes(stream, &self.authentication_data);
        packet::write_string_array(stream, &self.authorization_names)?;
        packet::write_string(stream, &self.manufacturer_display_id);
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        2 + 1
            + 2 * self.connections.len()
            + 1
            + self
                .connections
                .iter()
                .map(|connection| 2 + connection.address.len())
                .sum::<usize>()
            + 2
            + self.authentication_name.len()
            + 2
            + self.authentication_data.len()
            + 1
            + self
                .authorization_names
                .iter()
                .map(|name| 2 + name.len())
                .sum::<usize>()
            + 2
            + self.manufacturer_display_id.len()
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.family == FAMILY_INTERNET && self.address.len() == 4 {
            let address = Ipv4Addr::new(
                self.address[0],
                self.address[1],
                self.address[2],
                self.address[3],
            );
            write!(f, "{}", address)
        } else if self.family == FAMILY_INTERNET6 && self.address.len() == 16 {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&self.address);
            write!(f, "{}", Ipv6Addr::from(octets))
        } else {
            write!(f, "({}, {})", self.family, packet::hex(&self.address))
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};

    use super::*;

    #[test]
    fn request_encoding_works() {
        let request = Request {
            display_number: 1,
            connections: vec![Connection {
                family: FAMILY_INTERNET,
                address: Bytes::from_static(&[192, 168, 0, 1]),
            }],
            authentication_name: "".into(),
            authentication_data: Bytes::new(),
            authorization_names: vec!["MIT-MAGIC-COOKIE-1".into()],
            manufacturer_display_id: "".into(),
        };

        let mut stream = BytesMut::new();
        request.write(&mut stream).unwrap();

        assert_eq!(
            &stream[..],
            &[
                0x00, 0x01, // display number
                0x01, // connection type count
                0x00, 0x00, // connection type. FamilyInternet
                0x01, // connection address count
                0x00, 0x04, 192, 168, 0, 1, // connection address
                0x00, 0x00, // authentication name, empty
                0x00, 0x00, // authentication data, empty
                0x01, // authorization name count
                0x00, 0x12, // authorization name length
                b'M', b'I', b'T', b'-', b'M', b'A', b'G', b'I', b'C', b'-', b'C', b'O', b'O',
                b'K', b'I', b'E', b'-', b'1', // authorization name
                0x00, 0x00, // manufacturer display id, empty
            ]
        );
        assert_eq!(request.len(), stream.len());
    }

    #[test]
    fn connection_count_mismatch_rejected() {
        let mut stream = Bytes::from_static(&[
            0x00, 0x01, // display number
            0x02, // connection type count
            0x00, 0x00, // connection type. FamilyInternet
            0x00, 0x06, // connection type. FamilyInternet6
            0x01, // connection address count, does not match
            0x00, 0x04, 10, 0, 0, 1, // connection address
        ]);

        assert!(matches!(
            Request::read(&mut stream),
            Err(Error::ConnectionCountMismatch {
                types: 2,
                addresses: 1
            })
        ));
    }

    #[test]
    fn connection_rendering_works() {
        let v4 = Connection {
            family: FAMILY_INTERNET,
            address: Bytes::from_static(&[192, 168, 0, 1]),
        };
        assert_eq!(v4.to_string(), "192.168.0.1");

        let v6 = Connection {
            family: FAMILY_INTERNET6,
            address: Bytes::from_static(&[
                0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
            ]),
        };
        assert_eq!(v6.to_string(), "fe80::1");

        // 未知地址族按原始字节渲染
        let other = Connection {
            family: 3,
            address: Bytes::from_static(&[0xaa, 0xbb]),
        };
        assert_eq!(other.to_string(), "(3, AABB)");
    }
}
