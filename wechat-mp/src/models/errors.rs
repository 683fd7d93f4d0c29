use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 配置相关错误
///
/// 缺少公众号凭证或请求参数时立即失败,不会重试。
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum ConfigError {
    /// 缺少公众号凭证 (AppId / AppSecret)
    ///
    /// 在构造 TokenManager 时检查一次,不在每次调用时检查
    #[error("缺少公众号配置: {0}")]
    MissingCredential(String),

    /// 请求参数缺失
    ///
    /// GET 缺少 path,或 POST 缺少 path / body,不会发起网络请求
    #[error("请求参数缺失: {0}")]
    MissingParameters(String),

    /// 配置值无效
    ///
    /// 环境变量存在但无法解析 (如端口号不是数字)
    #[error("配置值无效: {key} = {value}")]
    InvalidValue { key: String, value: String },
}

/// API调用相关错误
///
/// 处理与微信公众平台API交互时的各种失败场景。
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum ApiError {
    /// 网络请求失败
    ///
    /// 可能原因:
    /// - 网络连接中断
    /// - 微信服务器不可达
    /// - DNS解析失败
    #[error("网络请求失败: {0}")]
    NetworkFailed(String),

    /// 请求超时
    ///
    /// 超过固定超时时间仍未收到完整响应,未读完的响应体被丢弃
    #[error("请求超时 ({timeout_ms}ms): {path}")]
    Timeout { path: String, timeout_ms: u64 },

    /// HTTP状态码错误
    #[error("HTTP错误 {status}: {message}")]
    HttpStatusError { status: u16, message: String },

    /// JSON解析失败
    ///
    /// 响应体不是合法JSON
    #[error("响应数据解析失败: {0}")]
    JsonParseFailed(String),

    /// 响应格式无效
    ///
    /// errcode 为 0 但缺少期望的字段 (如 access_token)
    #[error("响应格式无效: {0}")]
    InvalidResponse(String),

    /// 微信返回的业务错误
    ///
    /// 响应中 errcode 非 0,携带完整的原始响应
    #[error("微信接口错误 {errcode}: {errmsg}")]
    Wechat {
        errcode: i64,
        errmsg: String,
        payload: serde_json::Value,
    },
}

/// 凭证缓存相关错误
///
/// 处理与Redis交互时的失败场景
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum StorageError {
    /// Redis连接失败
    #[error("Redis连接失败: {0}")]
    RedisConnectionFailed(String),

    /// 序列化/反序列化失败
    ///
    /// 缓存命中但内容无法解析时返回此错误,不会回退到重新获取
    #[error("数据序列化失败: {0}")]
    SerializationError(String),

    /// Redis操作超时
    #[error("Redis操作超时: {0}")]
    OperationTimeout(String),

    /// Redis命令执行失败
    ///
    /// 具体的Redis命令(GET/SET/EXPIRE)执行出错
    #[error("Redis命令执行失败: {0}")]
    CommandFailed(String),
}

/// 推送消息解析错误
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum MessageError {
    /// XML格式错误
    #[error("XML解析失败: {0}")]
    XmlParseFailed(String),

    /// 缺少必需字段
    #[error("缺少必需字段: {0}")]
    MissingField(String),

    /// 字段值无效
    #[error("字段 {field} 的值无效: {value}")]
    InvalidField { field: String, value: String },
}

/// 统一错误类型
///
/// 各层 (TokenManager → TicketManager → SignatureEngine) 原样向上传递遇到的第一个错误。
/// 实现 `Clone`,以便并发等待同一次刷新的调用方共享同一个失败结果。
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "error")]
pub enum WechatError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Message(#[from] MessageError),
}

impl WechatError {
    /// 微信业务错误码 (仅 `ApiError::Wechat` 时存在)
    pub fn errcode(&self) -> Option<i64> {
        match self {
            WechatError::Api(ApiError::Wechat { errcode, .. }) => Some(*errcode),
            _ => None,
        }
    }

    /// 是否为超时错误
    pub fn is_timeout(&self) -> bool {
        matches!(self, WechatError::Api(ApiError::Timeout { .. }))
    }
}

/// 实现从reqwest::Error到ApiError的转换
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout {
                path: err
                    .url()
                    .map(|url| url.path().to_string())
                    .unwrap_or_default(),
                timeout_ms: 0,
            }
        } else if err.is_connect() {
            ApiError::NetworkFailed(format!("无法连接到服务器: {}", err))
        } else if err.is_decode() {
            ApiError::JsonParseFailed(err.to_string())
        } else {
            ApiError::NetworkFailed(err.to_string())
        }
    }
}

/// 实现从redis::RedisError到StorageError的转换
impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() {
            StorageError::RedisConnectionFailed("连接被拒绝".to_string())
        } else if err.is_timeout() {
            StorageError::OperationTimeout(err.to_string())
        } else {
            StorageError::CommandFailed(err.to_string())
        }
    }
}

/// 实现从serde_json::Error到相关错误的转换
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::JsonParseFailed(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}

impl From<quick_xml::DeError> for MessageError {
    fn from(err: quick_xml::DeError) -> Self {
        MessageError::XmlParseFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errcode_only_for_wechat_errors() {
        let err: WechatError = ApiError::Wechat {
            errcode: 40013,
            errmsg: "invalid appid".to_string(),
            payload: serde_json::json!({"errcode": 40013, "errmsg": "invalid appid"}),
        }
        .into();
        assert_eq!(err.errcode(), Some(40013));

        let err: WechatError = ApiError::NetworkFailed("boom".to_string()).into();
        assert_eq!(err.errcode(), None);
    }

    #[test]
    fn test_is_timeout() {
        let err: WechatError = ApiError::Timeout {
            path: "/cgi-bin/token".to_string(),
            timeout_ms: 7000,
        }
        .into();
        assert!(err.is_timeout());
        assert!(!WechatError::from(ConfigError::MissingParameters("path".into())).is_timeout());
    }

    #[test]
    fn test_error_serialization_is_tagged() {
        let err: WechatError = StorageError::SerializationError("bad json".to_string()).into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "Storage");
        assert_eq!(json["error"]["error"], "SerializationError");
        assert_eq!(json["error"]["details"], "bad json");
    }

    #[test]
    fn test_serde_json_error_maps_to_parse_failure() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(
            ApiError::from(parse_err),
            ApiError::JsonParseFailed(_)
        ));
    }
}
