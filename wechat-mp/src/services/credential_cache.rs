use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;

use crate::models::{Credential, RedisConfig, StorageError, WechatError, CREDENTIAL_TTL_SECONDS};
use crate::utils::time_utils::unix_timestamp;

/// 凭证缓存
///
/// 支持TTL的外部键值存储,值为不透明的序列化字符串。
/// 过期淘汰完全由存储自身负责,本模块不提供删除路径。
#[async_trait]
pub trait CredentialCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn expire(&self, key: &str, ttl_seconds: i64) -> Result<(), StorageError>;
}

/// 读取缓存中的凭证
///
/// # 返回值
/// - `Ok(Some(credential))`: 命中且未过期
/// - `Ok(None)`: 未命中,或本地记录的获取时间显示已过期
///
/// # 错误
/// 命中但内容无法反序列化时返回 `StorageError::SerializationError`,
/// 调用方不得回退到重新获取
pub async fn load_credential<T: Credential>(
    cache: &dyn CredentialCache,
    key: &str,
) -> Result<Option<T>, WechatError> {
    let Some(raw) = cache.get(key).await? else {
        tracing::debug!(缓存键 = %key, "凭证缓存未命中");
        return Ok(None);
    };

    let credential: T = serde_json::from_str(&raw).map_err(|e| {
        tracing::error!(缓存键 = %key, 错误 = %e, "凭证缓存内容损坏");
        StorageError::SerializationError(format!("{}: {}", key, e))
    })?;

    let now = unix_timestamp();
    let Some(expired) = credential.is_expired_at(now) else {
        tracing::error!(
            缓存键 = %key,
            获取时间 = ?credential.obtained_at(),
            有效期 = credential.expires_in(),
            "缓存凭证的有效期溢出,内容已损坏"
        );
        return Err(StorageError::SerializationError(format!(
            "{}: obtained_at + expires_in 溢出",
            key
        ))
        .into());
    };
    if expired {
        tracing::warn!(
            缓存键 = %key,
            获取时间 = ?credential.obtained_at(),
            有效期 = credential.expires_in(),
            "缓存凭证已超过有效期,视为未命中"
        );
        return Ok(None);
    }

    tracing::debug!(
        缓存键 = %key,
        凭证样本 = %credential.sample_for_logging(),
        "凭证缓存命中"
    );
    Ok(Some(credential))
}

/// 写入凭证并设置 7200 秒TTL
///
/// 顺序固定: 先 SET,再 EXPIRE。
pub async fn store_credential<T: Credential>(
    cache: &dyn CredentialCache,
    key: &str,
    credential: &T,
) -> Result<(), WechatError> {
    let raw = serde_json::to_string(credential).map_err(StorageError::from)?;

    cache.set(key, &raw).await?;
    cache.expire(key, CREDENTIAL_TTL_SECONDS).await?;

    tracing::info!(
        缓存键 = %key,
        过期秒数 = CREDENTIAL_TTL_SECONDS,
        凭证样本 = %credential.sample_for_logging(),
        "凭证已写入缓存"
    );
    Ok(())
}

/// Redis凭证缓存
///
/// 管理连接池,只负责字符串的读写与过期设置。
pub struct RedisCredentialCache {
    pool: Pool,
}

impl RedisCredentialCache {
    /// 初始化Redis连接池
    ///
    /// # 参数
    /// - `redis_url`: Redis连接URL,格式: `redis://host:port` 或 `redis://host:port/db`
    ///
    /// # 错误
    /// 返回 `StorageError::RedisConnectionFailed` 如果连接池创建失败
    pub fn new(redis_url: &str) -> Result<Self, StorageError> {
        let config = Config::from_url(redis_url);
        let pool = config.create_pool(Some(Runtime::Tokio1)).map_err(|e| {
            tracing::error!(错误 = %e, "创建Redis连接池失败");
            StorageError::RedisConnectionFailed(e.to_string())
        })?;

        Ok(Self { pool })
    }

    pub fn from_config(config: &RedisConfig) -> Result<Self, StorageError> {
        let cache = Self::new(&config.to_connection_url())?;
        tracing::info!(Redis = %config.summary_for_logging(), "Redis凭证缓存已就绪");
        Ok(cache)
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, StorageError> {
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::RedisConnectionFailed(e.to_string()))
    }
}

#[async_trait]
impl CredentialCache for RedisCredentialCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl_seconds: i64) -> Result<(), StorageError> {
        let mut conn = self.connection().await?;
        conn.expire::<_, ()>(key, ttl_seconds).await?;
        Ok(())
    }
}
