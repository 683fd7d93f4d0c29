use rand::{distributions::Alphanumeric, Rng};
use sha1::{Digest, Sha1};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::models::{Signature, WechatError};
use crate::services::ticket_manager::TicketManager;
use crate::utils::time_utils::unix_timestamp;

/// 随机串长度 (微信要求不少于10位)
pub const NONCE_LENGTH: usize = 16;

/// 计算 JS-SDK 签名
///
/// 待签名串的字段顺序固定:
/// `jsapi_ticket=<ticket>&noncestr=<nonce>&timestamp=<timestamp>&url=<url>`,
/// 经 SHA-1 后输出小写十六进制。
pub fn compute_signature(ticket: &str, nonce: &str, timestamp: i64, url: &str) -> String {
    let plain = format!(
        "jsapi_ticket={}&noncestr={}&timestamp={}&url={}",
        ticket, nonce, timestamp, url
    );
    sha1_hex(plain.as_bytes())
}

/// 校验服务器回调签名
///
/// 将 token、timestamp、nonce 按字典序排序后拼接,SHA-1 结果与 `signature` 比较。
/// 比较耗时与不匹配的位置无关。
pub fn verify_callback(token: &str, signature: &str, timestamp: &str, nonce: &str) -> bool {
    let mut parts = [token, timestamp, nonce];
    parts.sort_unstable();
    let expected = sha1_hex(parts.concat().as_bytes());
    let provided = signature.to_ascii_lowercase();
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// 生成随机串 (字母与数字)
pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

fn sha1_hex(input: &[u8]) -> String {
    hex::encode(Sha1::digest(input))
}

/// JS-SDK 签名引擎
pub struct SignatureEngine {
    app_id: String,
    tickets: Arc<TicketManager>,
}

impl SignatureEngine {
    pub fn new(app_id: impl Into<String>, tickets: Arc<TicketManager>) -> Self {
        Self {
            app_id: app_id.into(),
            tickets,
        }
    }

    /// 为页面URL生成签名
    ///
    /// ticket 获取失败时原样返回该错误。
    pub async fn sign(&self, url: &str) -> Result<Signature, WechatError> {
        self.sign_with(url, &generate_nonce(), unix_timestamp())
            .await
    }

    /// 使用给定的随机串与时间戳生成签名
    pub async fn sign_with(
        &self,
        url: &str,
        nonce: &str,
        timestamp: i64,
    ) -> Result<Signature, WechatError> {
        let ticket = self.tickets.get_ticket().await?;
        let signature = compute_signature(&ticket.ticket, nonce, timestamp, url);

        tracing::debug!(页面 = %url, 时间戳 = timestamp, "JS-SDK 签名完成");

        Ok(Signature {
            nonce_str: nonce.to_string(),
            app_id: self.app_id.clone(),
            timestamp,
            signature,
            url: url.to_string(),
        })
    }
}
