use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::models::errors::ConfigError;
use crate::models::redis_config::parse_env;

/// 微信公众平台API主机
pub const DEFAULT_API_HOST: &str = "api.weixin.qq.com";

/// HTTPS端口,Transport 据此选择TLS
pub const HTTPS_PORT: u16 = 443;

/// 单次请求超时
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(7);

/// JS-SDK 使用的 ticket 类型
pub const DEFAULT_TICKET_TYPE: &str = "jsapi";

/// 公众号配置
///
/// `app_id` / `app_secret` 是刷新 access_token 的前提,
/// 由 [`WechatConfig::validate`] 在构造时检查一次。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WechatConfig {
    pub app_id: String,

    #[serde(skip_serializing)]
    pub app_secret: String,

    /// 服务器配置中填写的 Token,用于校验回调签名
    #[serde(skip_serializing)]
    pub token: Option<String>,

    pub api_host: String,

    /// 443 走HTTPS,其余端口走明文HTTP
    pub api_port: u16,

    pub request_timeout: Duration,

    /// `/cgi-bin/ticket/getticket` 的 type 参数
    pub ticket_type: String,
}

impl WechatConfig {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            token: None,
            api_host: DEFAULT_API_HOST.to_string(),
            api_port: HTTPS_PORT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ticket_type: DEFAULT_TICKET_TYPE.to_string(),
        }
    }

    /// 设置回调校验 Token (构建器模式)
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// 指定API主机与端口 (构建器模式)
    ///
    /// 主要用于测试环境指向本地模拟服务器
    pub fn with_api_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.api_host = host.into();
        self.api_port = port;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_ticket_type(mut self, ticket_type: impl Into<String>) -> Self {
        self.ticket_type = ticket_type.into();
        self
    }

    /// 从环境变量加载配置
    ///
    /// | 变量 | 说明 |
    /// |------|------|
    /// | `WECHAT_APP_ID` | 必需 |
    /// | `WECHAT_APP_SECRET` | 必需 |
    /// | `WECHAT_TOKEN` | 可选,回调校验 |
    /// | `WECHAT_API_HOST` | 可选,默认 `api.weixin.qq.com` |
    /// | `WECHAT_API_PORT` | 可选,默认 443 |
    /// | `WECHAT_TICKET_TYPE` | 可选,默认 `jsapi` |
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(错误 = %e, "未加载 .env 文件,仅使用进程环境变量");
        }

        let mut config = Self::new(
            env::var("WECHAT_APP_ID").unwrap_or_default(),
            env::var("WECHAT_APP_SECRET").unwrap_or_default(),
        );

        if let Ok(token) = env::var("WECHAT_TOKEN") {
            if !token.is_empty() {
                config = config.with_token(token);
            }
        }

        if let Ok(host) = env::var("WECHAT_API_HOST") {
            if !host.is_empty() {
                config.api_host = host;
            }
        }

        if let Some(port) = parse_env("WECHAT_API_PORT")? {
            config.api_port = port;
        }

        if let Ok(ticket_type) = env::var("WECHAT_TICKET_TYPE") {
            if !ticket_type.is_empty() {
                config.ticket_type = ticket_type;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// 检查刷新凭证的前提条件
    ///
    /// # 错误
    /// AppId 或 AppSecret 为空时返回 `ConfigError::MissingCredential`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::MissingCredential("AppId".to_string()));
        }
        if self.app_secret.trim().is_empty() {
            return Err(ConfigError::MissingCredential("AppSecret".to_string()));
        }
        Ok(())
    }
}
