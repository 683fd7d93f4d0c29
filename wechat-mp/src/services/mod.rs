//! 服务层模块
//!
//! - `transport`: 微信接口HTTP传输 (超时、端口选择、errcode归一化)
//! - `credential_cache` / `memory_cache`: 凭证缓存 (Redis / 进程内)
//! - `single_flight`: 同一凭证的并发刷新合并
//! - `token_manager` / `ticket_manager`: access_token 与 ticket 的缓存优先获取
//! - `signature`: JS-SDK 签名与回调签名校验
//! - `message_dispatcher`: 推送消息解析与分发
//! - `menu_service`: 自定义菜单
//!
//! # 服务架构
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                WechatClient                  │
//! └───┬───────────┬──────────────┬───────────┬───┘
//!     │           │              │           │
//!     ▼           ▼              ▼           ▼
//! Signature   MenuService   TicketManager  MessageDispatcher
//!     │           │              │
//!     └───────────┴──────┬───────┘
//!                        ▼
//!                   TokenManager
//!                        │
//!            ┌───────────┴───────────┐
//!            ▼                       ▼
//!        Transport            CredentialCache
//!     (微信 API)              (Redis / 内存)
//! ```

pub mod credential_cache;
pub mod memory_cache;
pub mod menu_service;
pub mod message_dispatcher;
pub mod signature;
pub mod single_flight;
pub mod ticket_manager;
pub mod token_manager;
pub mod transport;

pub use credential_cache::{load_credential, store_credential, CredentialCache, RedisCredentialCache};
pub use memory_cache::MemoryCredentialCache;
pub use menu_service::MenuService;
pub use message_dispatcher::MessageDispatcher;
pub use signature::{compute_signature, generate_nonce, verify_callback, SignatureEngine};
pub use single_flight::SingleFlight;
pub use ticket_manager::TicketManager;
pub use token_manager::TokenManager;
pub use transport::{check_errcode, HttpTransport, Transport};
