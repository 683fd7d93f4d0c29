//! 微信公众号服务端SDK
//!
//! - access_token / ticket 的缓存优先获取 (Redis 或进程内缓存,7200 秒TTL)
//! - JS-SDK 页面签名与服务器回调签名校验
//! - 推送消息 (text / image / event) 解析与分发
//! - 自定义菜单管理
//!
//! # 使用示例
//!
//! ```no_run
//! use wechat_mp::{RedisConfig, WechatClient, WechatConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = WechatClient::connect(WechatConfig::from_env()?, &RedisConfig::from_env()?)?;
//!
//! client.on_text(|message| {
//!     tracing::info!(发送方 = %message.header.from_user_name, "收到文本消息");
//! });
//!
//! let signature = client.sign("https://example.com/page").await?;
//! println!("{}", signature.signature);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod models;
pub mod services;
pub mod utils;

pub use client::WechatClient;
pub use models::{
    AccessToken, ApiError, ConfigError, InboundMessage, Menu, MenuButton, MenuResponse,
    MessageError, RedisConfig, Signature, StorageError, Ticket, WechatConfig, WechatError,
};
