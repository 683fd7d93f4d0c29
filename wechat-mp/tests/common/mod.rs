//! 测试公共模块
//!
//! 提供Mock传输层和测试工具,集成测试不依赖微信服务器与Redis。

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use wechat_mp::models::{ApiError, WechatError};
use wechat_mp::services::{MemoryCredentialCache, Transport};
use wechat_mp::{WechatClient, WechatConfig};

pub const APP_ID: &str = "wx_test_app";
pub const APP_SECRET: &str = "test_secret";

pub const TOKEN_ENDPOINT: &str = "/cgi-bin/token";
pub const TICKET_ENDPOINT: &str = "/cgi-bin/ticket/getticket";

/// 已记录的一次请求
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub port: u16,
    pub body: Option<Value>,
}

impl RecordedCall {
    /// 不含查询参数的接口路径
    pub fn endpoint(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }
}

/// Mock传输层
///
/// 按接口路径 (不含查询参数) 返回预设响应,并记录每一次调用:
/// - respond: 设置接口的固定响应
/// - fail: 设置接口的固定错误
/// - with_delay: 每次调用前等待,用于并发场景
pub struct MockTransport {
    responses: Arc<Mutex<HashMap<String, Result<Value, WechatError>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn respond(&self, endpoint: &str, response: Value) {
        self.responses
            .lock()
            .await
            .insert(endpoint.to_string(), Ok(response));
    }

    pub async fn fail(&self, endpoint: &str, error: WechatError) {
        self.responses
            .lock()
            .await
            .insert(endpoint.to_string(), Err(error));
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// 指定接口被调用的次数
    pub async fn call_count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.endpoint() == endpoint)
            .count()
    }

    async fn record(
        &self,
        method: &'static str,
        path: &str,
        port: u16,
        body: Option<Value>,
    ) -> Result<Value, WechatError> {
        self.calls.lock().await.push(RecordedCall {
            method,
            path: path.to_string(),
            port,
            body,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let endpoint = path.split('?').next().unwrap_or(path);
        self.responses
            .lock()
            .await
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| {
                Err(ApiError::NetworkFailed(format!("未设置Mock响应: {}", endpoint)).into())
            })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str, port: u16) -> Result<Value, WechatError> {
        self.record("GET", path, port, None).await
    }

    async fn post(&self, path: &str, port: u16, body: &Value) -> Result<Value, WechatError> {
        self.record("POST", path, port, Some(body.clone())).await
    }
}

pub fn test_config() -> WechatConfig {
    WechatConfig::new(APP_ID, APP_SECRET)
}

pub fn token_response(token: &str) -> Value {
    json!({ "access_token": token, "expires_in": 7200 })
}

pub fn ticket_response(ticket: &str) -> Value {
    json!({ "errcode": 0, "errmsg": "ok", "ticket": ticket, "expires_in": 7200 })
}

/// 传输层已预设 access_token 与 ticket 成功响应的测试环境
pub struct TestHarness {
    pub transport: Arc<MockTransport>,
    pub cache: Arc<MemoryCredentialCache>,
    pub client: WechatClient,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_transport(MockTransport::new()).await
    }

    pub async fn with_transport(transport: MockTransport) -> Self {
        transport.respond(TOKEN_ENDPOINT, token_response("ACCESS_TOKEN")).await;
        transport.respond(TICKET_ENDPOINT, ticket_response("JSAPI_TICKET")).await;

        let transport = Arc::new(transport);
        let cache = Arc::new(MemoryCredentialCache::new());
        let client = WechatClient::new(test_config(), transport.clone(), cache.clone())
            .expect("测试配置有效");

        Self {
            transport,
            cache,
            client,
        }
    }
}
