//! XDMCP 报文编解码
//! 报文头固定 6 字节：version、opcode、length 各 2 字节，所有整数均为大端序
//! length 只统计报文体字节数，不含报文头

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

pub use accept::*;
pub use alive::*;
pub use decline::*;
pub use failed::*;
pub use forward_query::*;
pub use keep_alive::*;
pub use manage::*;
pub use query::*;
pub use refuse::*;
pub use request::*;
pub use unwilling::*;
pub use willing::*;

pub mod accept;
pub mod alive;
pub mod decline;
pub mod failed;
pub mod forward_query;
pub mod keep_alive;
pub mod manage;
pub mod query;
pub mod refuse;
pub mod request;
pub mod unwilling;
pub mod willing;

/// 协议版本，固定为 1
pub const VERSION: u16 = 1;
/// 单个数据报的最大字节数，协议的长度字段为 16 位
pub const MAXIMUM_PACKET_LENGTH: usize = 65535;
/// 报文头字节数
const HEADER_LENGTH: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported protocol version: {0}")]
    ProtocolVersionMismatch(u16),
    #[error("Unknown opcode: {0}")]
    UnknownOpcode(u16),
    #[error("Packet truncated")]
    Truncated,
    #[error("{0} octets of trailing data after packet end")]
    TrailingData(usize),
    #[error("Length field declares {declared} octets but fields consumed {actual}")]
    LengthMismatch { declared: u16, actual: usize },
    #[error("Malformed UTF-8 string")]
    MalformedString,
    #[error("Connection type count {types} does not match address count {addresses}")]
    ConnectionCountMismatch { types: u8, addresses: u8 },
    #[error("Array of {0} entries does not fit in a count octet")]
    ArrayTooLong(usize),
    #[error("Packet of {0} octets exceeds the maximum datagram size")]
    BufferTooSmall(usize),
}

/// 报文类型
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    BroadcastQuery = 1,
    Query = 2,
    IndirectQuery = 3,
    ForwardQuery = 4,
    Willing = 5,
    Unwilling = 6,
    Request = 7,
    Accept = 8,
    Decline = 9,
    Manage = 10,
    Refuse = 11,
    Failed = 12,
    KeepAlive = 13,
    Alive = 14,
}

impl TryFrom<u16> for Opcode {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Opcode::BroadcastQuery),
            2 => Ok(Opcode::Query),
            3 => Ok(Opcode::IndirectQuery),
            4 => Ok(Opcode::ForwardQuery),
            5 => Ok(Opcode::Willing),
            6 => Ok(Opcode::Unwilling),
            7 => Ok(Opcode::Request),
            8 => Ok(Opcode::Accept),
            9 => Ok(Opcode::Decline),
            10 => Ok(Opcode::Manage),
            11 => Ok(Opcode::Refuse),
            12 => Ok(Opcode::Failed),
            13 => Ok(Opcode::KeepAlive),
            14 => Ok(Opcode::Alive),
            opcode => Err(Error::UnknownOpcode(opcode)),
        }
    }
}

fn read_u8(stream: &mut Bytes) -> Result<u8, Error> {
    if stream.is_empty() {
        return Err(Error::Truncated);
    }
    Ok(stream.get_u8())
}

fn read_u16(stream: &mut Bytes) -> Result<u16, Error> {
    if stream.len() < 2 {
        return Err(Error::Truncated);
    }

    Ok(stream.get_u16())
}

fn read_u32(stream: &mut Bytes) -> Result<u32, Error> {
    if stream.len() < 4 {
        return Err(Error::Truncated);
    }

    Ok(stream.get_u32())
}

/// 读取带 16 位长度前缀的字节串
fn read_bytes(stream: &mut Bytes) -> Result<Bytes, Error> {
    // 后续可取出的字节的长度
    let len = read_u16(stream)? as usize;

    if len > stream.len() {
        return Err(Error::Truncated);
    }

    Ok(stream.split_to(len))
}

fn read_string(stream: &mut Bytes) -> Result<String, Error> {
    let s = read_bytes(stream)?;
    match String::from_utf8(s.to_vec()) {
        Ok(v) => Ok(v),
        Err(_) => Err(Error::MalformedString),
    }
}

/// 读取带 8 位计数前缀的字符串数组
fn read_string_array(stream: &mut Bytes) -> Result<Vec<String>, Error> {
    let count = read_u8(stream)? as usize;
    let mut strings = Vec::with_capacity(count);
    for _ in 0..count {
        strings.push(read_string(stream)?);
    }

    Ok(strings)
}

fn write_bytes(stream: &mut BytesMut, bytes: &[u8]) {
    stream.put_u16(bytes.len() as u16);
    stream.extend_from_slice(bytes);
}

fn write_string(stream: &mut BytesMut, string: &str) {
    write_bytes(stream, string.as_bytes())
}

/// 写入带 8 位计数前缀的字符串数组
fn write_string_array(stream: &mut BytesMut, strings: &[String]) -> Result<(), Error> {
    if strings.len() > u8::MAX as usize {
        return Err(Error::ArrayTooLong(strings.len()));
    }

    stream.put_u8(strings.len() as u8);
    for string in strings {
        write_string(stream, string);
    }
    Ok(())
}

/// 字节串的十六进制渲染
fn hex(data: &[u8]) -> String {
    data.iter().map(|octet| format!("{:02X}", octet)).collect()
}

/// 单引号括起、空格连接的字符串列表渲染
fn quoted_list(strings: &[String]) -> String {
    strings
        .iter()
        .map(|s| format!("'{}'", s))
        .collect::<Vec<_>>()
        .join(" ")
}

/// XDMCP 报文
/// BroadcastQuery / Query / IndirectQuery 三种报文共用同一种报文体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    BroadcastQuery(Query),
    Query(Query),
    IndirectQuery(Query),
    ForwardQuery(ForwardQuery),
    Willing(Willing),
    Unwilling(Unwilling),
    Request(Request),
    Accept(Accept),
    Decline(Decline),
    Manage(Manage),
    Refuse(Refuse),
    Failed(Failed),
    KeepAlive(KeepAlive),
    Alive(Alive),
}

impl Packet {
    /// 解码一个完整数据报
    /// 对任意输入都不会越界、不会 panic，所有失败都以 Error 返回
    pub fn read(mut stream: Bytes) -> Result<Self, Error> {
        let version = read_u16(&mut stream)?;
        let opcode = read_u16(&mut stream)?;
        let length = read_u16(&mut stream)? as usize;

        if version != VERSION {
            return Err(Error::ProtocolVersionMismatch(version));
        }
        let opcode = Opcode::try_from(opcode)?;

        // 长度字段必须与数据报剩余字节数一致
        if length > stream.len() {
            return Err(Error::Truncated);
        }
        if length < stream.len() {
            return Err(Error::TrailingData(stream.len() - length));
        }

        let packet = match opcode {
            Opcode::BroadcastQuery => Packet::BroadcastQuery(Query::read(&mut stream)?),
            Opcode::Query => Packet::Query(Query::read(&mut stream)?),
            Opcode::IndirectQuery => Packet::IndirectQuery(Query::read(&mut stream)?),
            Opcode::ForwardQuery => Packet::ForwardQuery(ForwardQuery::read(&mut stream)?),
            Opcode::Willing => Packet::Willing(Willing::read(&mut stream)?),
            Opcode::Unwilling => Packet::Unwilling(Unwilling::read(&mut stream)?),
            Opcode::Request => Packet::Request(Request::read(&mut stream)?),
            Opcode::Accept => Packet::Accept(Accept::read(&mut stream)?),
            Opcode::Decline => Packet::Decline(Decline::read(&mut stream)?),
            Opcode::Manage => Packet::Manage(Manage::read(&mut stream)?),
            Opcode::Refuse => Packet::Refuse(Refuse::read(&mut stream)?),
            Opcode::Failed => Packet::Failed(Failed::read(&mut stream)?),
            Opcode::KeepAlive => Packet::KeepAlive(KeepAlive::read(&mut stream)?),
            Opcode::Alive => Packet::Alive(Alive::read(&mut stream)?),
        };

        // 字段解析完仍有剩余，说明长度字段与字段内容不符
        if !stream.is_empty() {
            return Err(Error::LengthMismatch {
                declared: length as u16,
                actual: length - stream.len(),
            });
        }

        Ok(packet)
    }

    /// 编码为单个数据报，返回写入的总字节数（含报文头）
    /// 失败时缓冲区内容未定义
    pub fn write(&self, stream: &mut BytesMut) -> Result<usize, Error> {
        let length = self.len();
        let total = HEADER_LENGTH + length;
        if total > MAXIMUM_PACKET_LENGTH {
            return Err(Error::BufferTooSmall(total));
        }

        stream.put_u16(VERSION);
        stream.put_u16(self.opcode() as u16);
        stream.put_u16(length as u16);

        match self {
            Packet::BroadcastQuery(query) => query.write(stream)?,
            Packet::Query(query) => query.write(stream)?,
            Packet::IndirectQuery(query) => query.write(stream)?,
            Packet::ForwardQuery(forward_query) => forward_query.write(stream)?,
            Packet::Willing(willing) => willing.write(stream),
            Packet::Unwilling(unwilling) => unwilling.write(stream),
            Packet::Request(request) => request.write(stream)?,
            Packet::Accept(accept) => accept.write(stream),
            Packet::Decline(decline) => decline.write(stream),
            Packet::Manage(manage) => manage.write(stream),
            Packet::Refuse(refuse) => refuse.write(stream),
            Packet::Failed(failed) => failed.write(stream),
            Packet::KeepAlive(keep_alive) => keep_alive.write(stream),
            Packet::Alive(alive) => alive.write(stream),
        }

        Ok(total)
    }

    /// 报文体字节数
    fn len(&self) -> usize {
        match self {
            Packet::BroadcastQuery(query) => query.len(),
            Packet::Query(query) => query.len(),
            Packet::IndirectQuery(query) => query.len(),
            Packet::ForwardQuery(forward_query) => forward_query.len(),
            Packet::Willing(willing) => willing.len(),
            Packet::Unwilling(unwilling) => unwilling.len(),
            Packet::Request(request) => request.len(),
            Packet::Accept(accept) => accept.len(),
            Packet::Decline(decline) => decline.len(),
            Packet::Manage(manage) => manage.len(),
            Packet::Refuse(refuse) => refuse.len(),
            Packet::Failed(failed) => failed.len(),
            Packet::KeepAlive(keep_alive) => keep_alive.len(),
            Packet::Alive(alive) => alive.len(),
        }
    }

    #[inline]
    pub fn opcode(&self) -> Opcode {
        match self {
            Packet::BroadcastQuery(_) => Opcode::BroadcastQuery,
            Packet::Query(_) => Opcode::Query,
            Packet::IndirectQuery(_) => Opcode::IndirectQuery,
            Packet::ForwardQuery(_) => Opcode::ForwardQuery,
            Packet::Willing(_) => Opcode::Willing,
            Packet::Unwilling(_) => Opcode::Unwilling,
            Packet::Request(_) => Opcode::Request,
            Packet::Accept(_) => Opcode::Accept,
            Packet::Decline(_) => Opcode::Decline,
            Packet::Manage(_) => Opcode::Manage,
            Packet::Refuse(_) => Opcode::Refuse,
            Packet::Failed(_) => Opcode::Failed,
            Packet::KeepAlive(_) => Opcode::KeepAlive,
            Packet::Alive(_) => Opcode::Alive,
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packet::BroadcastQuery(query) => write!(
                f,
                "BroadcastQuery(authentication_names=[{}])",
                quoted_list(&query.authentication_names)
            ),
            Packet::Query(query) => write!(
                f,
                "Query(authentication_names=[{}])",
                quoted_list(&query.authentication_names)
            ),
            Packet::IndirectQuery(query) => write!(
                f,
                "IndirectQuery(authentication_names=[{}])",
                quoted_list(&query.authentication_names)
            ),
            Packet::ForwardQuery(forward_query) => write!(
                f,
                "ForwardQuery(client_address={} client_port={} authentication_names=[{}])",
                hex(&forward_query.client_address),
                hex(&forward_query.client_port),
                quoted_list(&forward_query.authentication_names)
            ),
            Packet::Willing(willing) => write!(
                f,
                "Willing(authentication_name='{}' hostname='{}' status='{}')",
                willing.authentication_name, willing.hostname, willing.status
            ),
            Packet::Unwilling(unwilling) => write!(
                f,
                "Unwilling(hostname='{}' status='{}')",
                unwilling.hostname, unwilling.status
            ),
            Packet::Request(request) => {
                let connections = request
                    .connections
                    .iter()
                    .map(|connection| connection.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(
                    f,
                    "Request(display_number={} connections=[{}] authentication_name='{}' authentication_data={} authorization_names=[{}] manufacturer_display_id='{}')",
                    request.display_number,
                    connections,
                    request.authentication_name,
                    hex(&request.authentication_data),
                    quoted_list(&request.authorization_names),
                    request.manufacturer_display_id
                )
            }
            Packet::Accept(accept) => write!(
                f,
                "Accept(session_id={} authentication_name='{}' authentication_data={} authorization_name='{}' authorization_data={})",
                accept.session_id,
                accept.authentication_name,
                hex(&accept.authentication_data),
                accept.authorization_name,
                hex(&accept.authorization_data)
            ),
            Packet::Decline(decline) => write!(
                f,
                "Decline(status='{}' authentication_name='{}' authentication_data={})",
                decline.status,
                decline.authentication_name,
                hex(&decline.authentication_data)
            ),
            Packet::Manage(manage) => write!(
                f,
                "Manage(session_id={} display_number={} display_class='{}')",
                manage.session_id, manage.display_number, manage.display_class
            ),
            Packet::Refuse(refuse) => write!(f, "Refuse(session_id={})", refuse.session_id),
            Packet::Failed(failed) => write!(
                f,
                "Failed(session_id={} status='{}')",
                failed.session_id, failed.status
            ),
            Packet::KeepAlive(keep_alive) => write!(
                f,
                "KeepAlive(display_number={} session_id={})",
                keep_alive.display_number, keep_alive.session_id
            ),
            Packet::Alive(alive) => write!(
                f,
                "Alive(session_running={} session_id={})",
                alive.session_running, alive.session_id
            ),
        }
    }
}
