use std::sync::Arc;

use crate::models::{
    AccessToken, ApiError, ConfigError, Credential, WechatConfig, WechatError, ACCESS_TOKEN_KEY,
};
use crate::services::credential_cache::{load_credential, store_credential, CredentialCache};
use crate::services::single_flight::SingleFlight;
use crate::services::transport::{check_errcode, Transport};
use crate::utils::time_utils::unix_timestamp;

/// access_token 管理器
///
/// 缓存优先: 命中直接返回,未命中才请求 `/cgi-bin/token`。
/// 同一时刻的并发未命中合并为一次刷新,只有这一次刷新写缓存。
pub struct TokenManager {
    app_id: String,
    app_secret: String,
    api_port: u16,
    transport: Arc<dyn Transport>,
    cache: Arc<dyn CredentialCache>,
    flight: SingleFlight<AccessToken>,
}

impl TokenManager {
    /// 创建管理器
    ///
    /// # 错误
    /// AppId / AppSecret 缺失时返回 `ConfigError::MissingCredential`,
    /// 此时无法刷新凭证,属于不可重试的配置错误
    pub fn new(
        config: &WechatConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn CredentialCache>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            api_port: config.api_port,
            transport,
            cache,
            flight: SingleFlight::new(),
        })
    }

    /// 获取 access_token
    ///
    /// 1. 读取缓存,命中即返回 (不发起网络请求)
    /// 2. 未命中则请求微信接口,errcode 非0直接返回错误且不写缓存
    /// 3. 成功后 SET + EXPIRE 7200 秒,再返回
    ///
    /// # 错误
    /// - `StorageError::SerializationError`: 缓存内容损坏,不会回退到重新获取
    /// - `ApiError::Wechat`: 微信返回业务错误
    /// - 其余传输层错误原样返回
    pub async fn get_access_token(&self) -> Result<AccessToken, WechatError> {
        let cached = load_credential::<AccessToken>(self.cache.as_ref(), ACCESS_TOKEN_KEY).await?;
        if let Some(token) = cached {
            return Ok(token);
        }

        let transport = Arc::clone(&self.transport);
        let cache = Arc::clone(&self.cache);
        let path = self.token_path();
        let port = self.api_port;

        self.flight
            .run(ACCESS_TOKEN_KEY, move || Self::refresh(transport, cache, path, port))
            .await
    }

    fn token_path(&self) -> String {
        format!(
            "/cgi-bin/token?grant_type=client_credential&appid={}&secret={}",
            self.app_id, self.app_secret
        )
    }

    async fn refresh(
        transport: Arc<dyn Transport>,
        cache: Arc<dyn CredentialCache>,
        path: String,
        port: u16,
    ) -> Result<AccessToken, WechatError> {
        // 未命中与加入刷新之间,上一次刷新可能已经写入缓存
        let cached = load_credential::<AccessToken>(cache.as_ref(), ACCESS_TOKEN_KEY).await?;
        if let Some(token) = cached {
            return Ok(token);
        }

        tracing::info!("access_token 未命中缓存,向微信请求新凭证");

        let response = check_errcode(transport.get(&path, port).await?)?;
        let mut token: AccessToken = serde_json::from_value(response).map_err(|e| {
            ApiError::InvalidResponse(format!("access_token 响应缺少字段: {}", e))
        })?;
        token.stamp(unix_timestamp());

        store_credential(cache.as_ref(), ACCESS_TOKEN_KEY, &token).await?;

        tracing::info!(
            凭证样本 = %token.sample_for_logging(),
            有效期 = token.expires_in,
            "access_token 刷新成功"
        );
        Ok(token)
    }
}
