use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::models::{ApiError, ConfigError, WechatConfig, WechatError, HTTPS_PORT};

/// 微信API传输层
///
/// 面向固定主机的 GET / POST,响应体统一解析为JSON。
/// 业务错误码 (errcode) 不在此层判断,见 [`check_errcode`]。
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET请求
    ///
    /// # 错误
    /// - `ConfigError::MissingParameters`: path 为空,不发起请求
    /// - `ApiError::Timeout`: 超时
    /// - `ApiError::NetworkFailed`: 连接失败
    /// - `ApiError::JsonParseFailed`: 响应不是JSON
    async fn get(&self, path: &str, port: u16) -> Result<Value, WechatError>;

    /// POST JSON请求
    ///
    /// path 为空或 body 为 `null` 时返回 `ConfigError::MissingParameters`
    async fn post(&self, path: &str, port: u16, body: &Value) -> Result<Value, WechatError>;
}

/// 判断微信响应是否为业务错误
///
/// 响应携带非0的 `errcode` 即视为失败,与HTTP层是否成功无关。
/// 缺少 `errcode` 的响应 (如 `/cgi-bin/token` 成功时) 视为成功。
pub fn check_errcode(response: Value) -> Result<Value, ApiError> {
    match response.get("errcode").and_then(Value::as_i64) {
        Some(errcode) if errcode != 0 => {
            let errmsg = response
                .get("errmsg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            tracing::warn!(错误码 = errcode, 错误信息 = %errmsg, "微信接口返回业务错误");

            Err(ApiError::Wechat {
                errcode,
                errmsg,
                payload: response,
            })
        }
        _ => Ok(response),
    }
}

/// 基于reqwest的传输实现
///
/// 每次请求整体 (发送 + 读取响应体) 受同一个超时约束,
/// 超时后未读完的响应体直接丢弃,不重试。
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    host: String,
    timeout: Duration,
}

impl HttpTransport {
    /// 创建传输层
    ///
    /// # 参数
    /// - `host`: API主机,不含协议与端口
    /// - `timeout`: 单次请求超时
    pub fn new(host: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().build()?;
        let host = host.into();

        tracing::info!(
            API主机 = %host,
            超时毫秒 = timeout.as_millis() as u64,
            "HTTP传输层初始化完成"
        );

        Ok(Self {
            client,
            host,
            timeout,
        })
    }

    pub fn from_config(config: &WechatConfig) -> Result<Self, ApiError> {
        Self::new(config.api_host.clone(), config.request_timeout)
    }

    /// 拼接完整URL
    ///
    /// 443端口使用HTTPS,其余端口使用明文HTTP。
    ///
    /// # 示例
    /// ```
    /// use std::time::Duration;
    /// use wechat_mp::services::HttpTransport;
    ///
    /// let transport = HttpTransport::new("api.weixin.qq.com", Duration::from_secs(7)).unwrap();
    /// assert_eq!(
    ///     transport.url_for("/cgi-bin/menu/get", 443),
    ///     "https://api.weixin.qq.com/cgi-bin/menu/get"
    /// );
    /// assert_eq!(
    ///     transport.url_for("/cgi-bin/menu/get", 80),
    ///     "http://api.weixin.qq.com:80/cgi-bin/menu/get"
    /// );
    /// ```
    pub fn url_for(&self, path: &str, port: u16) -> String {
        if port == HTTPS_PORT {
            format!("https://{}{}", self.host, path)
        } else {
            format!("http://{}:{}{}", self.host, port, path)
        }
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<Value, WechatError> {
        let endpoint = endpoint_for_logging(path);
        let started = Instant::now();

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, ApiError>((status, body))
        };

        let (status, body) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result.map_err(|e| {
                tracing::error!(接口 = %endpoint, 错误 = %e, "HTTP请求失败");
                e
            })?,
            Err(_) => {
                tracing::warn!(
                    接口 = %endpoint,
                    超时毫秒 = self.timeout.as_millis() as u64,
                    "HTTP请求超时"
                );
                return Err(ApiError::Timeout {
                    path: endpoint.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }
                .into());
            }
        };

        tracing::debug!(
            接口 = %endpoint,
            状态码 = status.as_u16(),
            响应字节 = body.len(),
            耗时毫秒 = started.elapsed().as_millis() as u64,
            "收到HTTP响应"
        );

        if !status.is_success() {
            let message: String = String::from_utf8_lossy(&body).chars().take(200).collect();
            return Err(ApiError::HttpStatusError {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        serde_json::from_slice(&body).map_err(|e| {
            tracing::error!(接口 = %endpoint, 错误 = %e, "响应不是合法JSON");
            WechatError::from(ApiError::from(e))
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, port: u16) -> Result<Value, WechatError> {
        if path.is_empty() {
            return Err(ConfigError::MissingParameters("path".to_string()).into());
        }

        let request = self.client.get(self.url_for(path, port));
        self.execute(request, path).await
    }

    async fn post(&self, path: &str, port: u16, body: &Value) -> Result<Value, WechatError> {
        if path.is_empty() || body.is_null() {
            let missing = match (path.is_empty(), body.is_null()) {
                (true, true) => "path, data",
                (true, false) => "path",
                _ => "data",
            };
            return Err(ConfigError::MissingParameters(missing.to_string()).into());
        }

        let request = self.client.post(self.url_for(path, port)).json(body);
        self.execute(request, path).await
    }
}

/// 日志中只记录路径,不记录查询参数 (appid / secret / access_token)
fn endpoint_for_logging(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transport() -> HttpTransport {
        HttpTransport::new("api.weixin.qq.com", Duration::from_secs(7)).unwrap()
    }

    #[test]
    fn test_url_for_selects_scheme_by_port() {
        let transport = transport();
        assert_eq!(
            transport.url_for("/cgi-bin/token?grant_type=client_credential", 443),
            "https://api.weixin.qq.com/cgi-bin/token?grant_type=client_credential"
        );
        assert_eq!(
            transport.url_for("/cgi-bin/token", 8080),
            "http://api.weixin.qq.com:8080/cgi-bin/token"
        );
    }

    #[test]
    fn test_endpoint_for_logging_strips_query() {
        assert_eq!(
            endpoint_for_logging("/cgi-bin/token?appid=wx&secret=s"),
            "/cgi-bin/token"
        );
        assert_eq!(endpoint_for_logging("/cgi-bin/menu/get"), "/cgi-bin/menu/get");
    }

    #[test]
    fn test_check_errcode_passes_success() {
        let response = json!({"access_token": "abc", "expires_in": 7200});
        assert_eq!(check_errcode(response.clone()), Ok(response));

        let response = json!({"errcode": 0, "errmsg": "ok", "ticket": "t"});
        assert_eq!(check_errcode(response.clone()), Ok(response));
    }

    #[test]
    fn test_check_errcode_rejects_nonzero() {
        let response = json!({"errcode": 40001, "errmsg": "invalid credential"});
        match check_errcode(response.clone()) {
            Err(ApiError::Wechat {
                errcode,
                errmsg,
                payload,
            }) => {
                assert_eq!(errcode, 40001);
                assert_eq!(errmsg, "invalid credential");
                assert_eq!(payload, response);
            }
            other => panic!("expected wechat error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_without_path_fails_fast() {
        let err = transport().get("", 443).await.unwrap_err();
        assert_eq!(
            err,
            WechatError::Config(ConfigError::MissingParameters("path".to_string()))
        );
    }

    #[tokio::test]
    async fn test_post_without_data_fails_fast() {
        let err = transport()
            .post("/cgi-bin/menu/create", 443, &Value::Null)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WechatError::Config(ConfigError::MissingParameters("data".to_string()))
        );

        let err = transport().post("", 443, &Value::Null).await.unwrap_err();
        assert_eq!(
            err,
            WechatError::Config(ConfigError::MissingParameters("path, data".to_string()))
        );
    }
}
