use serde::{Deserialize, Serialize};
use std::env;

use crate::models::errors::ConfigError;

/// Redis连接配置
///
/// 凭证缓存所在的Redis实例。多个进程共享同一实例时,
/// access_token 与 ticket 也随之共享。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis服务器主机地址
    pub host: String,

    /// Redis服务器端口,默认 6379
    pub port: u16,

    /// 认证密码 (可选)
    pub password: Option<String>,

    /// 数据库索引 (可选,默认0)
    pub database: Option<u8>,
}

impl RedisConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            password: None,
            database: None,
        }
    }

    /// 设置密码 (构建器模式)
    pub fn with_password(mut self, password: String) -> Self {
        self.password = Some(password);
        self
    }

    /// 设置数据库索引 (构建器模式)
    pub fn with_database(mut self, database: u8) -> Self {
        self.database = Some(database);
        self
    }

    /// 从环境变量加载配置
    ///
    /// 先尝试加载 `.env`,随后读取 `REDIS_HOST` / `REDIS_PORT` /
    /// `REDIS_PASSWORD` / `REDIS_DB`,缺失项使用默认值。
    ///
    /// # 错误
    /// 端口或数据库索引无法解析时返回 `ConfigError::InvalidValue`
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(错误 = %e, "未加载 .env 文件,仅使用进程环境变量");
        }

        let mut config = Self::new(
            env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_string()),
            parse_env("REDIS_PORT")?.unwrap_or(6379),
        );

        if let Ok(password) = env::var("REDIS_PASSWORD") {
            if !password.is_empty() {
                config = config.with_password(password);
            }
        }

        if let Some(database) = parse_env("REDIS_DB")? {
            config = config.with_database(database);
        }

        Ok(config)
    }

    /// 生成Redis连接URL
    ///
    /// # URL格式
    /// - 无密码: `redis://{host}:{port}/{db}`
    /// - 有密码: `redis://:{password}@{host}:{port}/{db}`
    ///
    /// # 示例
    /// ```
    /// use wechat_mp::models::RedisConfig;
    ///
    /// let config = RedisConfig::new("localhost".to_string(), 6379)
    ///     .with_password("secret".to_string())
    ///     .with_database(1);
    ///
    /// assert_eq!(config.to_connection_url(), "redis://:secret@localhost/1");
    /// ```
    pub fn to_connection_url(&self) -> String {
        let auth = match &self.password {
            Some(pwd) => format!(":{}@", pwd),
            None => String::new(),
        };

        format!(
            "redis://{}{}{}/{}",
            auth,
            self.host,
            format_port(self.port),
            self.database.unwrap_or(0)
        )
    }

    /// 获取配置摘要 (用于日志,不记录密码)
    pub fn summary_for_logging(&self) -> String {
        let auth_hint = if self.password.is_some() {
            " (authenticated)"
        } else {
            ""
        };
        format!(
            "{}:{}/{}{}",
            self.host,
            self.port,
            self.database.unwrap_or(0),
            auth_hint
        )
    }
}

/// 读取并解析可选的环境变量
pub(crate) fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        _ => Ok(None),
    }
}

/// 默认端口6379省略端口号(符合Redis URL惯例)
fn format_port(port: u16) -> String {
    if port == 6379 {
        String::new()
    } else {
        format!(":{}", port)
    }
}

impl Default for RedisConfig {
    /// 默认配置: localhost:6379, 无密码, 数据库0
    fn default() -> Self {
        Self::new("localhost".to_string(), 6379)
    }
}
