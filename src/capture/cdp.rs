// Chrome DevTools 协议连接 - 通过 WebSocket 收发命令与事件
//
// 连接由单个页面独占，命令按顺序发送；等待响应期间收到的事件先缓存

use base64::{engine::general_purpose, Engine as _};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Viewport;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Chrome 启动后在 stderr 打印的调试地址前缀
const DEVTOOLS_BANNER: &str = "DevTools listening on ";

/// 从 Chrome stderr 的一行中取出浏览器级 WebSocket 地址
pub fn parse_devtools_url(line: &str) -> Option<String> {
    let url = line.trim().strip_prefix(DEVTOOLS_BANNER)?.trim();
    url.starts_with("ws://").then(|| url.to_string())
}

/// 查找第一个可见元素，返回其在页面中的矩形；找不到时返回 null
pub fn element_lookup_script(selector: &str) -> String {
    // JSON 字符串同时是合法的 JS 字符串字面量
    let literal = Value::String(selector.to_string()).to_string();
    format!(
        r#"(() => {{
  const el = document.querySelector({literal});
  if (!el) return null;
  const style = window.getComputedStyle(el);
  const rect = el.getBoundingClientRect();
  if (style.display === 'none' || style.visibility === 'hidden' || rect.width === 0 || rect.height === 0) return null;
  return {{ x: rect.left + window.scrollX, y: rect.top + window.scrollY, width: rect.width, height: rect.height }};
}})()"#
    )
}

/// 整页截图区域：页面内容尺寸，不小于视口
pub fn full_page_clip(layout_metrics: &Value, viewport: Viewport) -> Value {
    let content = if layout_metrics["cssContentSize"].is_object() {
        &layout_metrics["cssContentSize"]
    } else {
        &layout_metrics["contentSize"]
    };
    let width = content["width"]
        .as_f64()
        .unwrap_or_default()
        .max(viewport.width as f64);
    let height = content["height"]
        .as_f64()
        .unwrap_or_default()
        .max(viewport.height as f64);

    json!({ "x": 0, "y": 0, "width": width.ceil(), "height": height.ceil(), "scale": 1 })
}

/// Page.captureScreenshot 的结果解码为 PNG 字节
pub fn decode_screenshot(result: &Value) -> Result<Vec<u8>> {
    let data = result["data"]
        .as_str()
        .ok_or_else(|| Error::Capture("截图响应缺少 data 字段".to_string()))?;
    general_purpose::STANDARD
        .decode(data)
        .map_err(|e| Error::Capture(format!("截图数据解码失败: {}", e)))
}

/// 单个 DevTools WebSocket 连接
pub struct CdpConnection {
    socket: Socket,
    next_id: u64,
    session_id: Option<String>,
    events: VecDeque<Value>,
}

impl CdpConnection {
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let (socket, _) = connect_async(ws_url)
            .await
            .map_err(|e| Error::Capture(format!("无法连接 DevTools {}: {}", ws_url, e)))?;
        debug!("DevTools 已连接: {}", ws_url);

        Ok(Self {
            socket,
            next_id: 0,
            session_id: None,
            events: VecDeque::new(),
        })
    }

    /// 之后的命令都发往该页面会话
    pub fn attach(&mut self, session_id: String) {
        self.session_id = Some(session_id);
    }

    /// 发送命令并等待对应 id 的响应
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;

        let mut message = json!({ "id": id, "method": method, "params": params });
        if let Some(session_id) = &self.session_id {
            message["sessionId"] = json!(session_id);
        }

        self.socket
            .send(Message::Text(message.to_string()))
            .await
            .map_err(|e| Error::Capture(format!("DevTools 发送 {} 失败: {}", method, e)))?;

        loop {
            let message = self.read_message().await?;
            if message["id"].as_u64() == Some(id) {
                if let Some(error) = message.get("error") {
                    return Err(Error::Capture(format!(
                        "{} 失败: {}",
                        method,
                        error["message"].as_str().unwrap_or("unknown")
                    )));
                }
                return Ok(message["result"].clone());
            }
            if message.get("method").is_some() {
                self.events.push_back(message);
            }
        }
    }

    /// 等待满足条件的事件，超时返回 false
    pub async fn wait_for_event<F>(
        &mut self,
        method: &str,
        timeout: Duration,
        mut predicate: F,
    ) -> Result<bool>
    where
        F: FnMut(&Value) -> bool + Send,
    {
        if let Some(pos) = self
            .events
            .iter()
            .position(|e| e["method"] == method && predicate(&e["params"]))
        {
            self.events.drain(..=pos);
            return Ok(true);
        }
        self.events.clear();

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let message = match tokio::time::timeout_at(deadline, self.read_message()).await {
                Ok(message) => message?,
                Err(_) => return Ok(false),
            };
            if message["method"] == method && predicate(&message["params"]) {
                return Ok(true);
            }
        }
    }

    async fn read_message(&mut self) -> Result<Value> {
        loop {
            match self.socket.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(&text)
                        .map_err(|e| Error::Capture(format!("DevTools 消息无法解析: {}", e)));
                }
                Some(Ok(Message::Close(_))) | None => {
                    return Err(Error::Capture("DevTools 连接已关闭".to_string()));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(Error::Capture(format!("DevTools 读取失败: {}", e)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_devtools_url() {
        let line = "DevTools listening on ws://127.0.0.1:40123/devtools/browser/0b6f-4c1e\n";
        assert_eq!(
            parse_devtools_url(line).as_deref(),
            Some("ws://127.0.0.1:40123/devtools/browser/0b6f-4c1e")
        );
        assert!(parse_devtools_url("[0101/000000.000:ERROR:gpu_init.cc] failed").is_none());
        assert!(parse_devtools_url("DevTools listening on http://x").is_none());
    }

    #[test]
    fn test_lookup_script_escapes_selector() {
        let script = element_lookup_script("[class*='chart'], a[title=\"x\"]");
        assert!(script.contains(r#"document.querySelector("[class*='chart'], a[title=\"x\"]")"#));
        assert!(script.contains("getBoundingClientRect"));
    }

    #[test]
    fn test_full_page_clip_uses_content_height() {
        let metrics = json!({
            "cssContentSize": { "x": 0, "y": 0, "width": 1280.0, "height": 5312.4 },
            "contentSize": { "x": 0, "y": 0, "width": 2560.0, "height": 10624.8 }
        });
        let clip = full_page_clip(&metrics, Viewport::default());
        assert_eq!(clip["height"], 5313.0);
        assert_eq!(clip["scale"], 1);

        // 内容比视口短时保持视口大小
        let short = json!({ "contentSize": { "width": 300.0, "height": 200.0 } });
        let clip = full_page_clip(&short, Viewport { width: 1280, height: 800 });
        assert_eq!(clip["width"], 1280.0);
        assert_eq!(clip["height"], 800.0);
    }

    #[test]
    fn test_decode_screenshot() {
        let encoded = general_purpose::STANDARD.encode(b"\x89PNG");
        assert_eq!(decode_screenshot(&json!({ "data": encoded })).unwrap(), b"\x89PNG");
        assert!(decode_screenshot(&json!({})).is_err());
        assert!(decode_screenshot(&json!({ "data": "%%%" })).is_err());
    }
}
