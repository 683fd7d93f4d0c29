use serde::{Deserialize, Serialize};

/// JS-SDK 页面签名
///
/// 纯计算结果,不持久化,每次调用重新生成。
/// 序列化字段名与前端 `wx.config` 所需参数保持一致。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(rename = "nonceStr")]
    pub nonce_str: String,

    #[serde(rename = "appid")]
    pub app_id: String,

    /// unix秒
    pub timestamp: i64,

    /// SHA-1 十六进制摘要
    pub signature: String,

    pub url: String,
}
