//! 凭证刷新合并 (single-flight)
//!
//! 同一个key上并发的刷新请求只会触发一次底层操作:
//! 第一个调用方发起刷新,其余调用方等待同一个进行中的future并得到相同结果。
//! 条目由刷新future自身在产出结果前移除,调用方被取消也不会留下已完成的条目,
//! 下一次未命中会重新发起。

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;

use crate::models::WechatError;

type SharedRefresh<T> = Shared<BoxFuture<'static, Result<T, WechatError>>>;
type FlightMap<T> = Mutex<HashMap<String, (u64, SharedRefresh<T>)>>;

pub struct SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    in_flight: Arc<FlightMap<T>>,
    next_id: AtomicU64,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// 执行或加入 `key` 上的刷新
    ///
    /// `refresh` 只在当前没有进行中的刷新时被调用。
    pub async fn run<F, Fut>(&self, key: &str, refresh: F) -> Result<T, WechatError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, WechatError>> + Send + 'static,
    {
        let flight = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(key) {
                Some((_, existing)) => {
                    tracing::debug!(缓存键 = %key, "加入进行中的凭证刷新");
                    existing.clone()
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let started = Self::settle(
                        Arc::downgrade(&self.in_flight),
                        key.to_string(),
                        id,
                        refresh(),
                    )
                    .boxed()
                    .shared();
                    in_flight.insert(key.to_string(), (id, started.clone()));
                    started
                }
            }
        };

        flight.await
    }

    /// 完成刷新后移除自己的条目,再产出结果
    ///
    /// 只移除编号相同的条目,避免误删之后新发起的刷新。
    async fn settle<Fut>(
        in_flight: Weak<FlightMap<T>>,
        key: String,
        id: u64,
        refresh: Fut,
    ) -> Result<T, WechatError>
    where
        Fut: Future<Output = Result<T, WechatError>> + Send + 'static,
    {
        let result = refresh.await;

        if let Some(in_flight) = in_flight.upgrade() {
            let mut in_flight = in_flight.lock().await;
            if in_flight.get(&key).is_some_and(|(current, _)| *current == id) {
                in_flight.remove(&key);
            }
        }

        result
    }

    /// 当前进行中的刷新数量
    pub async fn in_flight_count(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
