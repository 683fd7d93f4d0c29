//! 进程内凭证缓存
//!
//! 语义对齐Redis的 GET / SET / EXPIRE:
//! - SET 覆盖旧值并清除TTL
//! - EXPIRE 对不存在的key无效果,TTL <= 0 立即删除
//! - 读取时惰性淘汰已过期的条目
//!
//! 适用于单进程部署与测试。

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::models::StorageError;
use crate::services::credential_cache::CredentialCache;

struct Entry {
    value: String,
    ttl_seconds: Option<i64>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Default)]
pub struct MemoryCredentialCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最近一次 EXPIRE 设置的TTL (秒),未设置或已淘汰返回 `None`
    pub async fn ttl_of(&self, key: &str) -> Option<i64> {
        let mut entries = self.entries.lock().await;
        Self::live_entry(&mut entries, key).and_then(|entry| entry.ttl_seconds)
    }

    pub async fn contains(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        Self::live_entry(&mut entries, key).is_some()
    }

    fn live_entry<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a Entry> {
        if entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(Instant::now()))
        {
            entries.remove(key);
            return None;
        }
        entries.get(key)
    }
}

#[async_trait]
impl CredentialCache for MemoryCredentialCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut entries = self.entries.lock().await;
        Ok(Self::live_entry(&mut entries, key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().await.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                ttl_seconds: None,
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, ttl_seconds: i64) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().await;

        if ttl_seconds <= 0 {
            entries.remove(key);
            return Ok(());
        }

        if let Some(entry) = entries.get_mut(key) {
            entry.ttl_seconds = Some(ttl_seconds);
            // 超出 Instant 可表示范围的TTL视为永不过期
            entry.expires_at = Instant::now().checked_add(Duration::from_secs(ttl_seconds as u64));
        }
        Ok(())
    }
}
