use std::sync::Arc;

use crate::models::{
    AccessToken, ConfigError, EventMessage, ImageMessage, InboundMessage, Menu, MenuResponse,
    MessageError, RedisConfig, Signature, TextMessage, Ticket, WechatConfig, WechatError,
};
use crate::services::{
    signature, CredentialCache, HttpTransport, MemoryCredentialCache, MenuService,
    MessageDispatcher, RedisCredentialCache, SignatureEngine, TicketManager, TokenManager,
    Transport,
};

/// 公众号客户端
///
/// 组合凭证管理、签名、消息分发与菜单服务,每个实例独立持有自己的分发器。
/// 传输层与缓存通过构造参数注入,便于替换为测试实现。
pub struct WechatClient {
    config: WechatConfig,
    tokens: Arc<TokenManager>,
    tickets: Arc<TicketManager>,
    signer: SignatureEngine,
    dispatcher: MessageDispatcher,
    menus: MenuService,
}

impl WechatClient {
    /// 初始化客户端
    ///
    /// # 错误
    /// AppId / AppSecret 缺失时返回 `ConfigError::MissingCredential`
    pub fn new(
        config: WechatConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn CredentialCache>,
    ) -> Result<Self, WechatError> {
        let tokens = Arc::new(TokenManager::new(
            &config,
            Arc::clone(&transport),
            Arc::clone(&cache),
        )?);
        let tickets = Arc::new(TicketManager::new(
            &config,
            Arc::clone(&tokens),
            Arc::clone(&transport),
            cache,
        ));
        let signer = SignatureEngine::new(config.app_id.clone(), Arc::clone(&tickets));
        let menus = MenuService::new(config.api_port, Arc::clone(&tokens), transport);

        tracing::info!(
            AppId = %config.app_id,
            API主机 = %config.api_host,
            API端口 = config.api_port,
            ticket类型 = %config.ticket_type,
            "WechatClient initialized"
        );

        Ok(Self {
            config,
            tokens,
            tickets,
            signer,
            dispatcher: MessageDispatcher::new(),
            menus,
        })
    }

    /// 使用HTTP传输与Redis缓存初始化
    pub fn connect(config: WechatConfig, redis: &RedisConfig) -> Result<Self, WechatError> {
        let transport = Arc::new(HttpTransport::from_config(&config)?);
        let cache = Arc::new(RedisCredentialCache::from_config(redis)?);
        Self::new(config, transport, cache)
    }

    /// 使用HTTP传输与进程内缓存初始化 (单进程部署)
    pub fn in_memory(config: WechatConfig) -> Result<Self, WechatError> {
        let transport = Arc::new(HttpTransport::from_config(&config)?);
        Self::new(config, transport, Arc::new(MemoryCredentialCache::new()))
    }

    pub fn config(&self) -> &WechatConfig {
        &self.config
    }

    pub async fn get_access_token(&self) -> Result<AccessToken, WechatError> {
        self.tokens.get_access_token().await
    }

    pub async fn get_ticket(&self) -> Result<Ticket, WechatError> {
        self.tickets.get_ticket().await
    }

    pub async fn sign(&self, url: &str) -> Result<Signature, WechatError> {
        self.signer.sign(url).await
    }

    pub fn on_text<F>(&self, handler: F) -> &Self
    where
        F: Fn(&TextMessage) + Send + Sync + 'static,
    {
        self.dispatcher.on_text(handler);
        self
    }

    pub fn on_image<F>(&self, handler: F) -> &Self
    where
        F: Fn(&ImageMessage) + Send + Sync + 'static,
    {
        self.dispatcher.on_image(handler);
        self
    }

    pub fn on_event<F>(&self, handler: F) -> &Self
    where
        F: Fn(&EventMessage) + Send + Sync + 'static,
    {
        self.dispatcher.on_event(handler);
        self
    }

    /// 解析推送XML并分发给对应订阅者
    pub fn parse_inbound(&self, xml: &str) -> Result<InboundMessage, MessageError> {
        self.dispatcher.handle(xml)
    }

    pub fn dispatcher(&self) -> &MessageDispatcher {
        &self.dispatcher
    }

    /// 校验微信服务器回调签名
    ///
    /// # 错误
    /// 未配置 Token 时返回 `ConfigError::MissingCredential`
    pub fn verify_callback(
        &self,
        signature: &str,
        timestamp: &str,
        nonce: &str,
    ) -> Result<bool, ConfigError> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingCredential("Token".to_string()))?;

        let valid = signature::verify_callback(token, signature, timestamp, nonce);
        if !valid {
            tracing::warn!(时间戳 = %timestamp, "回调签名校验失败");
        }
        Ok(valid)
    }

    pub async fn create_menu(&self, menu: &Menu) -> Result<(), WechatError> {
        self.menus.create_menu(menu).await
    }

    pub async fn query_menu(&self) -> Result<MenuResponse, WechatError> {
        self.menus.query_menu().await
    }

    pub async fn delete_menu(&self) -> Result<(), WechatError> {
        self.menus.delete_menu().await
    }
}
