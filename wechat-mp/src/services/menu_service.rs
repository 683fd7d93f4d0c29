use std::sync::Arc;

use crate::models::{ApiError, Menu, MenuResponse, WechatError};
use crate::services::token_manager::TokenManager;
use crate::services::transport::{check_errcode, Transport};

/// 自定义菜单服务
///
/// 每次调用先解析 access_token (缓存优先),再请求菜单接口。
pub struct MenuService {
    api_port: u16,
    tokens: Arc<TokenManager>,
    transport: Arc<dyn Transport>,
}

impl MenuService {
    pub fn new(api_port: u16, tokens: Arc<TokenManager>, transport: Arc<dyn Transport>) -> Self {
        Self {
            api_port,
            tokens,
            transport,
        }
    }

    /// 创建菜单 (覆盖现有菜单)
    pub async fn create_menu(&self, menu: &Menu) -> Result<(), WechatError> {
        let body = serde_json::to_value(menu).map_err(ApiError::from)?;
        let path = self.path_with_token("/cgi-bin/menu/create").await?;

        check_errcode(self.transport.post(&path, self.api_port, &body).await?)?;

        tracing::info!(一级菜单数量 = menu.button.len(), "自定义菜单已创建");
        Ok(())
    }

    /// 查询当前菜单
    pub async fn query_menu(&self) -> Result<MenuResponse, WechatError> {
        let path = self.path_with_token("/cgi-bin/menu/get").await?;
        let response = check_errcode(self.transport.get(&path, self.api_port).await?)?;

        let menu: MenuResponse = serde_json::from_value(response)
            .map_err(|e| ApiError::InvalidResponse(format!("菜单响应格式错误: {}", e)))?;
        Ok(menu)
    }

    /// 删除全部菜单 (含个性化菜单)
    pub async fn delete_menu(&self) -> Result<(), WechatError> {
        let path = self.path_with_token("/cgi-bin/menu/delete").await?;
        check_errcode(self.transport.get(&path, self.api_port).await?)?;

        tracing::info!("自定义菜单已删除");
        Ok(())
    }

    async fn path_with_token(&self, endpoint: &str) -> Result<String, WechatError> {
        let token = self.tokens.get_access_token().await?;
        Ok(format!("{}?access_token={}", endpoint, token.access_token))
    }
}
