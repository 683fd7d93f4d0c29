use std::sync::{Arc, PoisonError, RwLock};

use crate::models::{
    EventMessage, ImageMessage, InboundMessage, MessageError, MessageKind, TextMessage,
};

type Handler<M> = Arc<dyn Fn(&M) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    text: Vec<Handler<TextMessage>>,
    image: Vec<Handler<ImageMessage>>,
    event: Vec<Handler<EventMessage>>,
}

/// 推送消息分发器
///
/// 每个客户端持有自己的分发器,订阅随实例存活,不支持取消订阅。
/// 同一类型的多个订阅者按注册顺序同步调用。
#[derive(Default)]
pub struct MessageDispatcher {
    subscribers: RwLock<Subscribers>,
}

impl MessageDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_text<F>(&self, handler: F) -> &Self
    where
        F: Fn(&TextMessage) + Send + Sync + 'static,
    {
        self.write().text.push(Arc::new(handler));
        self
    }

    pub fn on_image<F>(&self, handler: F) -> &Self
    where
        F: Fn(&ImageMessage) + Send + Sync + 'static,
    {
        self.write().image.push(Arc::new(handler));
        self
    }

    pub fn on_event<F>(&self, handler: F) -> &Self
    where
        F: Fn(&EventMessage) + Send + Sync + 'static,
    {
        self.write().event.push(Arc::new(handler));
        self
    }

    pub fn parse(&self, xml: &str) -> Result<InboundMessage, MessageError> {
        InboundMessage::from_xml(xml).map_err(|e| {
            tracing::warn!(错误 = %e, "推送消息解析失败");
            e
        })
    }

    /// 分发消息,返回被调用的订阅者数量
    ///
    /// `Other` 类型不会分发,返回 0。
    pub fn dispatch(&self, message: &InboundMessage) -> usize {
        let invoked = match message {
            InboundMessage::Text(m) => invoke(&self.snapshot(|s| &s.text), m),
            InboundMessage::Image(m) => invoke(&self.snapshot(|s| &s.image), m),
            InboundMessage::Event(m) => invoke(&self.snapshot(|s| &s.event), m),
            InboundMessage::Other(header) => {
                tracing::debug!(消息类型 = %header.msg_type, "未支持的消息类型,已丢弃");
                return 0;
            }
        };

        tracing::debug!(
            消息类型 = %message.header().msg_type,
            发送方 = %message.header().from_user_name,
            订阅者数量 = invoked,
            "推送消息已分发"
        );
        invoked
    }

    /// 解析并分发
    pub fn handle(&self, xml: &str) -> Result<InboundMessage, MessageError> {
        let message = self.parse(xml)?;
        self.dispatch(&message);
        Ok(message)
    }

    pub fn subscriber_count(&self, kind: MessageKind) -> usize {
        let subscribers = self.read();
        match kind {
            MessageKind::Text => subscribers.text.len(),
            MessageKind::Image => subscribers.image.len(),
            MessageKind::Event => subscribers.event.len(),
        }
    }

    /// 复制订阅列表后立即释放读锁,订阅者内部可以继续注册
    fn snapshot<M>(&self, pick: impl Fn(&Subscribers) -> &Vec<Handler<M>>) -> Vec<Handler<M>> {
        let subscribers = self.read();
        pick(&subscribers).clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Subscribers> {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Subscribers> {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn invoke<M>(handlers: &[Handler<M>], message: &M) -> usize {
    for handler in handlers {
        handler(message);
    }
    handlers.len()
}
