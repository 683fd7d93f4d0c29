use serde::{Deserialize, Serialize};

use crate::models::errors::MessageError;

/// 已支持分发的消息类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
    Event,
}

impl MessageKind {
    /// 从 `MsgType` 字段解析,未知类型返回 `None`
    pub fn from_msg_type(msg_type: &str) -> Option<Self> {
        match msg_type {
            "text" => Some(MessageKind::Text),
            "image" => Some(MessageKind::Image),
            "event" => Some(MessageKind::Event),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Event => "event",
        }
    }
}

/// 所有推送消息共有的字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageHeader {
    /// 开发者微信号
    pub to_user_name: String,

    /// 发送方账号 (OpenID)
    pub from_user_name: String,

    /// 消息创建时间 (unix秒)
    pub create_time: i64,

    pub msg_type: String,
}

/// 文本消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextMessage {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub content: String,
    pub msg_id: String,
}

/// 图片消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageMessage {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub pic_url: String,
    pub msg_id: String,
    pub media_id: String,
}

/// 事件推送 (关注、取消关注、菜单点击等)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventMessage {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub event: String,

    /// 关注事件不带 EventKey,此时为空字符串
    pub event_key: String,
}

/// 微信服务器推送的消息
///
/// 封闭的标签联合: 已知类型各自携带完整字段,
/// 未知类型显式归入 `Other`,仅保留公共字段且不会被分发。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InboundMessage {
    Text(TextMessage),
    Image(ImageMessage),
    Event(EventMessage),
    Other(MessageHeader),
}

/// XML原始结构,所有字段可选,由 `InboundMessage::from_xml` 校验
#[derive(Debug, Default, Deserialize)]
#[serde(rename = "xml")]
struct RawMessage {
    #[serde(rename = "ToUserName")]
    to_user_name: Option<String>,
    #[serde(rename = "FromUserName")]
    from_user_name: Option<String>,
    #[serde(rename = "CreateTime")]
    create_time: Option<String>,
    #[serde(rename = "MsgType")]
    msg_type: Option<String>,
    #[serde(rename = "Content")]
    content: Option<String>,
    #[serde(rename = "MsgId")]
    msg_id: Option<String>,
    #[serde(rename = "PicUrl")]
    pic_url: Option<String>,
    #[serde(rename = "MediaId")]
    media_id: Option<String>,
    #[serde(rename = "Event")]
    event: Option<String>,
    #[serde(rename = "EventKey")]
    event_key: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, MessageError> {
    value.ok_or_else(|| MessageError::MissingField(field.to_string()))
}

impl InboundMessage {
    /// 解析推送XML
    ///
    /// 四个公共字段缺失任何一个都属于解析失败;
    /// 已知类型缺少其专属字段同样视为解析失败。
    ///
    /// # 示例
    /// ```
    /// use wechat_mp::models::InboundMessage;
    ///
    /// let xml = "<xml><ToUserName><![CDATA[gh_1]]></ToUserName>\
    ///     <FromUserName><![CDATA[o_1]]></FromUserName>\
    ///     <CreateTime>1348831860</CreateTime>\
    ///     <MsgType><![CDATA[text]]></MsgType>\
    ///     <Content><![CDATA[hi]]></Content>\
    ///     <MsgId>1234567890123456</MsgId></xml>";
    /// let message = InboundMessage::from_xml(xml).unwrap();
    /// assert!(matches!(message, InboundMessage::Text(ref m) if m.content == "hi"));
    /// ```
    pub fn from_xml(xml: &str) -> Result<Self, MessageError> {
        let raw: RawMessage = quick_xml::de::from_str(xml)?;

        let create_time = required(raw.create_time, "CreateTime")?;
        let header = MessageHeader {
            to_user_name: required(raw.to_user_name, "ToUserName")?,
            from_user_name: required(raw.from_user_name, "FromUserName")?,
            create_time: create_time.trim().parse().map_err(|_| MessageError::InvalidField {
                field: "CreateTime".to_string(),
                value: create_time.clone(),
            })?,
            msg_type: required(raw.msg_type, "MsgType")?,
        };

        let message = match MessageKind::from_msg_type(&header.msg_type) {
            Some(MessageKind::Text) => InboundMessage::Text(TextMessage {
                content: required(raw.content, "Content")?,
                msg_id: required(raw.msg_id, "MsgId")?,
                header,
            }),
            Some(MessageKind::Image) => InboundMessage::Image(ImageMessage {
                pic_url: required(raw.pic_url, "PicUrl")?,
                msg_id: required(raw.msg_id, "MsgId")?,
                media_id: required(raw.media_id, "MediaId")?,
                header,
            }),
            Some(MessageKind::Event) => InboundMessage::Event(EventMessage {
                event: required(raw.event, "Event")?,
                event_key: raw.event_key.unwrap_or_default(),
                header,
            }),
            None => InboundMessage::Other(header),
        };

        Ok(message)
    }

    pub fn header(&self) -> &MessageHeader {
        match self {
            InboundMessage::Text(m) => &m.header,
            InboundMessage::Image(m) => &m.header,
            InboundMessage::Event(m) => &m.header,
            InboundMessage::Other(header) => header,
        }
    }

    /// 消息类型,`Other` 返回 `None`
    pub fn kind(&self) -> Option<MessageKind> {
        match self {
            InboundMessage::Text(_) => Some(MessageKind::Text),
            InboundMessage::Image(_) => Some(MessageKind::Image),
            InboundMessage::Event(_) => Some(MessageKind::Event),
            InboundMessage::Other(_) => None,
        }
    }
}
