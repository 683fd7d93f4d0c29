use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// access_token 在凭证缓存中的固定key
pub const ACCESS_TOKEN_KEY: &str = "AccessTokenKey";

/// ticket 在凭证缓存中的固定key
pub const TICKET_KEY: &str = "TickitKey";

/// 凭证缓存TTL,与微信凭证实际有效期一致
pub const CREDENTIAL_TTL_SECONDS: i64 = 7200;

/// 可缓存的时效凭证
///
/// access_token 与 ticket 共享同一套 "读缓存 → 刷新 → 写缓存" 流程,
/// 差异只在字段名与获取接口。
pub trait Credential: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// 凭证值
    fn value(&self) -> &str;

    /// 有效期 (秒)
    fn expires_in(&self) -> i64;

    /// 获取时间 (unix秒),旧缓存条目可能没有
    fn obtained_at(&self) -> Option<i64>;

    /// 记录获取时间
    fn stamp(&mut self, now: i64);

    /// 按本地记录的获取时间判断是否已过期
    ///
    /// 没有获取时间的条目完全依赖缓存TTL淘汰,视为未过期。
    /// 获取时间与有效期相加溢出说明缓存内容已损坏,返回 `None`。
    fn is_expired_at(&self, now: i64) -> Option<bool> {
        match self.obtained_at() {
            Some(obtained_at) => obtained_at
                .checked_add(self.expires_in())
                .map(|expires_at| expires_at <= now),
            None => Some(false),
        }
    }

    /// 凭证样本 (用于日志,不记录完整值)
    fn sample_for_logging(&self) -> String {
        let value = self.value();
        let prefix: String = value.chars().take(6).collect();
        format!("{}*** ({} chars)", prefix, value.chars().count())
    }
}

/// 公众号 access_token
///
/// 对应 `/cgi-bin/token` 的成功响应。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obtained_at: Option<i64>,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>, expires_in: i64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in,
            obtained_at: None,
        }
    }
}

impl Credential for AccessToken {
    fn value(&self) -> &str {
        &self.access_token
    }

    fn expires_in(&self) -> i64 {
        self.expires_in
    }

    fn obtained_at(&self) -> Option<i64> {
        self.obtained_at
    }

    fn stamp(&mut self, now: i64) {
        self.obtained_at = Some(now);
    }
}

/// JS-SDK ticket
///
/// 对应 `/cgi-bin/ticket/getticket` 的成功响应 (errcode/errmsg 不保存)。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket: String,
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obtained_at: Option<i64>,
}

impl Ticket {
    pub fn new(ticket: impl Into<String>, expires_in: i64) -> Self {
        Self {
            ticket: ticket.into(),
            expires_in,
            obtained_at: None,
        }
    }
}

impl Credential for Ticket {
    fn value(&self) -> &str {
        &self.ticket
    }

    fn expires_in(&self) -> i64 {
        self.expires_in
    }

    fn obtained_at(&self) -> Option<i64> {
        self.obtained_at
    }

    fn stamp(&mut self, now: i64) {
        self.obtained_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_from_wechat_response() {
        let json = r#"{"access_token":"ACCESS_TOKEN","expires_in":7200}"#;
        let token: AccessToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "ACCESS_TOKEN");
        assert_eq!(token.expires_in, 7200);
        assert!(token.obtained_at.is_none());
    }

    #[test]
    fn test_ticket_ignores_errcode_fields() {
        let json = r#"{"errcode":0,"errmsg":"ok","ticket":"bxLdikRXVbTPdHSM05e5u5sUoXNKd8","expires_in":7200}"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.ticket, "bxLdikRXVbTPdHSM05e5u5sUoXNKd8");

        let cached = serde_json::to_string(&ticket).unwrap();
        assert!(!cached.contains("errcode"));
        assert!(!cached.contains("obtained_at"));
    }

    #[test]
    fn test_expiry_without_obtained_at_relies_on_ttl() {
        let token = AccessToken::new("abc", 7200);
        assert_eq!(token.is_expired_at(i64::MAX / 2), Some(false));
    }

    #[test]
    fn test_expiry_with_obtained_at() {
        let mut token = AccessToken::new("abc", 7200);
        token.stamp(1_000);
        assert_eq!(token.is_expired_at(8_199), Some(false));
        assert_eq!(token.is_expired_at(8_200), Some(true));
    }

    #[test]
    fn test_expiry_overflow_is_reported() {
        let mut token = AccessToken::new("abc", i64::MAX);
        token.stamp(10);
        assert_eq!(token.is_expired_at(20), None);

        let mut ticket = Ticket::new("t", 7200);
        ticket.stamp(i64::MAX);
        assert_eq!(ticket.is_expired_at(20), None);
    }

    #[test]
    fn test_sample_for_logging_hides_value() {
        let token = AccessToken::new("0123456789abcdef", 7200);
        let sample = token.sample_for_logging();
        assert_eq!(sample, "012345*** (16 chars)");
        assert!(!sample.contains("abcdef"));
    }
}
