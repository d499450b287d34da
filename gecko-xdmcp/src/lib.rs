//! 一个 XDMCP 客户端库，用户可以使用此库构建自己的 X display 终端客户端

use async_trait::async_trait;
use network::packet::{Accept, Alive, Decline, Failed, Unwilling, Willing};

pub mod client;
pub mod config;
pub mod error;
mod network;

pub use network::{conn, packet};

/// 会话事件发生时的回调，由用户实现
///
#[async_trait]
pub trait Hook: Send + Sync + 'static {
    /// display manager 愿意提供会话
    async fn willing(&self, willing: &Willing);
    /// display manager 拒绝提供会话
    async fn unwilling(&self, unwilling: &Unwilling);
    /// 会话请求被接受
    async fn accept(&self, accept: &Accept);
    /// 会话请求被拒绝
    async fn decline(&self, decline: &Decline);
    /// 会话启动失败
    async fn failed(&self, failed: &Failed);
    /// keep-alive 探测应答
    async fn alive(&self, alive: &Alive);
}

pub struct HookNoop;

#[async_trait]
impl Hook for HookNoop {
    /// display manager 愿意提供会话
    async fn willing(&self, _willing: &Willing) {}
    /// display manager 拒绝提供会话
    async fn unwilling(&self, _unwilling: &Unwilling) {}
    /// 会话请求被接受
    async fn accept(&self, _accept: &Accept) {}
    /// 会话请求被拒绝
    async fn decline(&self, _decline: &Decline) {}
    /// 会话启动失败
    async fn failed(&self, _failed: &Failed) {}
    /// keep-alive 探测应答
    async fn alive(&self, _alive: &Alive) {}
}
