use serde::{Deserialize, Serialize};

/// 自定义菜单
///
/// 一级菜单最多3个,每个一级菜单最多5个子菜单,由微信服务端校验。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub button: Vec<MenuButton>,
}

/// 菜单按钮
///
/// `type` 为空时表示带子菜单的一级菜单。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuButton {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id: Option<String>,

    /// 小程序 appid (miniprogram 类型)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagepath: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_button: Vec<MenuButton>,
}

impl MenuButton {
    /// 点击推事件按钮
    pub fn click(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind: Some("click".to_string()),
            name: name.into(),
            key: Some(key.into()),
            ..Default::default()
        }
    }

    /// 跳转URL按钮
    pub fn view(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: Some("view".to_string()),
            name: name.into(),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// 带子菜单的一级菜单
    pub fn group(name: impl Into<String>, sub_button: Vec<MenuButton>) -> Self {
        Self {
            name: name.into(),
            sub_button,
            ..Default::default()
        }
    }
}

/// `/cgi-bin/menu/get` 响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuResponse {
    pub menu: Menu,

    /// 个性化菜单,原样保留
    #[serde(rename = "conditionalmenu", default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_menus: Vec<serde_json::Value>,
}
