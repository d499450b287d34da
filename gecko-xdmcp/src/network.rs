//! 网络层
//! 本层只关心 UDP 数据报的读写，不包含任何会话状态逻辑

pub(crate) use conn::ClientConnection;

pub mod conn;
pub mod packet;
