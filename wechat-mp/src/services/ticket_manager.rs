use std::sync::Arc;

use crate::models::{ApiError, Credential, Ticket, WechatConfig, WechatError, TICKET_KEY};
use crate::services::credential_cache::{load_credential, store_credential, CredentialCache};
use crate::services::single_flight::SingleFlight;
use crate::services::token_manager::TokenManager;
use crate::services::transport::{check_errcode, Transport};
use crate::utils::time_utils::unix_timestamp;

/// ticket 管理器
///
/// 与 [`TokenManager`] 相同的缓存优先流程。刷新时先解析 access_token
/// (同样缓存优先),调用方感知不到这层依赖。
pub struct TicketManager {
    ticket_type: String,
    api_port: u16,
    tokens: Arc<TokenManager>,
    transport: Arc<dyn Transport>,
    cache: Arc<dyn CredentialCache>,
    flight: SingleFlight<Ticket>,
}

impl TicketManager {
    pub fn new(
        config: &WechatConfig,
        tokens: Arc<TokenManager>,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn CredentialCache>,
    ) -> Self {
        Self {
            ticket_type: config.ticket_type.clone(),
            api_port: config.api_port,
            tokens,
            transport,
            cache,
            flight: SingleFlight::new(),
        }
    }

    /// 获取 ticket
    ///
    /// 刷新顺序严格为: 读缓存 → 获取 access_token → 请求 getticket → 写缓存。
    ///
    /// # 错误
    /// access_token 获取失败时原样返回该错误,不会请求 getticket
    pub async fn get_ticket(&self) -> Result<Ticket, WechatError> {
        let cached = load_credential::<Ticket>(self.cache.as_ref(), TICKET_KEY).await?;
        if let Some(ticket) = cached {
            return Ok(ticket);
        }

        let tokens = Arc::clone(&self.tokens);
        let transport = Arc::clone(&self.transport);
        let cache = Arc::clone(&self.cache);
        let ticket_type = self.ticket_type.clone();
        let port = self.api_port;

        self.flight
            .run(TICKET_KEY, move || {
                Self::refresh(tokens, transport, cache, ticket_type, port)
            })
            .await
    }

    async fn refresh(
        tokens: Arc<TokenManager>,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn CredentialCache>,
        ticket_type: String,
        port: u16,
    ) -> Result<Ticket, WechatError> {
        let cached = load_credential::<Ticket>(cache.as_ref(), TICKET_KEY).await?;
        if let Some(ticket) = cached {
            return Ok(ticket);
        }

        let token = tokens.get_access_token().await?;

        tracing::info!(类型 = %ticket_type, "ticket 未命中缓存,向微信请求新凭证");

        let path = ticket_path(&token.access_token, &ticket_type);
        let response = check_errcode(transport.get(&path, port).await?)?;
        let mut ticket: Ticket = serde_json::from_value(response)
            .map_err(|e| ApiError::InvalidResponse(format!("ticket 响应缺少字段: {}", e)))?;
        ticket.stamp(unix_timestamp());

        store_credential(cache.as_ref(), TICKET_KEY, &ticket).await?;

        tracing::info!(
            类型 = %ticket_type,
            凭证样本 = %ticket.sample_for_logging(),
            有效期 = ticket.expires_in,
            "ticket 刷新成功"
        );
        Ok(ticket)
    }
}

fn ticket_path(access_token: &str, ticket_type: &str) -> String {
    format!(
        "/cgi-bin/ticket/getticket?access_token={}&type={}",
        access_token, ticket_type
    )
}
