//! HttpTransport 集成测试 (本地模拟HTTP服务)

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wechat_mp::models::{ApiError, ConfigError, WechatError};
use wechat_mp::services::{HttpTransport, MemoryCredentialCache, Transport};
use wechat_mp::{WechatClient, WechatConfig};

fn transport(timeout: Duration) -> HttpTransport {
    HttpTransport::new("127.0.0.1", timeout).unwrap()
}

#[tokio::test]
async fn test_get_parses_json_over_plain_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .and(query_param("appid", "wx_app"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "T", "expires_in": 7200 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let value = transport(Duration::from_secs(7))
        .get(
            "/cgi-bin/token?grant_type=client_credential&appid=wx_app&secret=s",
            server.address().port(),
        )
        .await
        .unwrap();

    assert_eq!(value["access_token"], "T");
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;
    let body = json!({ "button": [{ "type": "click", "name": "n", "key": "k" }] });
    Mock::given(method("POST"))
        .and(path("/cgi-bin/menu/create"))
        .and(body_json(body.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "errcode": 0, "errmsg": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let value = transport(Duration::from_secs(7))
        .post(
            "/cgi-bin/menu/create?access_token=T",
            server.address().port(),
            &body,
        )
        .await
        .unwrap();

    assert_eq!(value["errcode"], 0);
}

#[tokio::test]
async fn test_errcode_response_is_returned_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "errcode": 40001, "errmsg": "invalid credential" })),
        )
        .mount(&server)
        .await;

    let value = transport(Duration::from_secs(7))
        .get("/cgi-bin/menu/get?access_token=T", server.address().port())
        .await
        .unwrap();

    assert_eq!(value["errcode"], 40001);
}

#[tokio::test]
async fn test_malformed_json_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = transport(Duration::from_secs(7))
        .get("/cgi-bin/token", server.address().port())
        .await
        .unwrap_err();

    assert!(matches!(err, WechatError::Api(ApiError::JsonParseFailed(_))));
}

#[tokio::test]
async fn test_non_success_status_is_an_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = transport(Duration::from_secs(7))
        .get("/cgi-bin/token", server.address().port())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        WechatError::Api(ApiError::HttpStatusError {
            status: 502,
            message: "bad gateway".to_string(),
        })
    );
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "T", "expires_in": 7200 }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = transport(Duration::from_millis(100))
        .get("/cgi-bin/token?appid=wx_app&secret=s", server.address().port())
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(
        err,
        WechatError::Api(ApiError::Timeout {
            path: "/cgi-bin/token".to_string(),
            timeout_ms: 100,
        })
    );
}

#[tokio::test]
async fn test_missing_parameters_fail_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let transport = transport(Duration::from_secs(7));
    let port = server.address().port();

    assert_eq!(
        transport.get("", port).await.unwrap_err(),
        WechatError::Config(ConfigError::MissingParameters("path".to_string()))
    );
    assert_eq!(
        transport
            .post("/cgi-bin/menu/create", port, &serde_json::Value::Null)
            .await
            .unwrap_err(),
        WechatError::Config(ConfigError::MissingParameters("data".to_string()))
    );
}

#[tokio::test]
async fn test_client_end_to_end_against_local_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "LOCAL_TOKEN", "expires_in": 7200 })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/ticket/getticket"))
        .and(query_param("access_token", "LOCAL_TOKEN"))
        .and(query_param("type", "jsapi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 0,
            "errmsg": "ok",
            "ticket": "LOCAL_TICKET",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = WechatConfig::new("wx_app", "secret")
        .with_api_endpoint("127.0.0.1", server.address().port());
    let client = WechatClient::new(
        config.clone(),
        std::sync::Arc::new(HttpTransport::from_config(&config).unwrap()),
        std::sync::Arc::new(MemoryCredentialCache::new()),
    )
    .unwrap();

    let first = client.sign("https://example.com/").await.unwrap();
    let second = client.sign("https://example.com/").await.unwrap();

    assert_eq!(first.app_id, "wx_app");
    assert_eq!(second.url, "https://example.com/");
}
