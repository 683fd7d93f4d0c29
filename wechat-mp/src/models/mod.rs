//! 数据模型模块
//!
//! 包含所有核心数据结构:
//! - errors: 错误类型定义 (配置、API、存储、消息解析)
//! - credential: access_token / ticket 及其缓存约定
//! - signature: JS-SDK 签名结果
//! - message: 微信推送消息 (text / image / event)
//! - menu: 自定义菜单
//! - wechat_config / redis_config: 运行配置

pub mod credential;
pub mod errors;
pub mod menu;
pub mod message;
pub mod redis_config;
pub mod signature;
pub mod wechat_config;

// 重导出常用类型,简化外部引用
pub use credential::{
    AccessToken, Credential, Ticket, ACCESS_TOKEN_KEY, CREDENTIAL_TTL_SECONDS, TICKET_KEY,
};
pub use errors::{ApiError, ConfigError, MessageError, StorageError, WechatError};
pub use menu::{Menu, MenuButton, MenuResponse};
pub use message::{
    EventMessage, ImageMessage, InboundMessage, MessageHeader, MessageKind, TextMessage,
};
pub use redis_config::RedisConfig;
pub use signature::Signature;
pub use wechat_config::{WechatConfig, DEFAULT_API_HOST, HTTPS_PORT};
