use std::collections::HashSet;

use axum::{
    extract::{
        ws::{Message as WsMessage, Utf8Bytes, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use application::CreateChatRequest;
use domain::ChatEvent;

use crate::state::AppState;

/// 客户端帧。`join` 声明自己订阅的房间（所属会话 id + 自己的昵称），
/// `chat` 是邀请流程用的「socket 直接建会话」。
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum ClientFrame {
    Join {
        rooms: Vec<String>,
    },
    Chat {
        #[serde(rename = "type")]
        kind: String,
        members: Option<Vec<String>>,
        #[serde(default)]
        title: String,
    },
}

#[derive(Debug, Serialize)]
struct ErrorFrame<'a> {
    event: &'static str,
    message: &'a str,
}

pub async fn socket_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| connection(socket, state))
}

enum Step {
    Client(Option<Result<WsMessage, axum::Error>>),
    Event(Result<ChatEvent, RecvError>),
}

/// 单条连接的主循环：一边收客户端帧维护房间表，一边把广播事件
/// 过滤后转发出去。事件在写库之后才会出现在这里，丢就丢了。
async fn connection(mut socket: WebSocket, state: AppState) {
    let mut events = state.broadcaster.subscribe();
    let mut joined: HashSet<String> = HashSet::new();

    loop {
        // select 表达式结束后对 socket 的独占借用即释放，
        // 之后才能在同一个 socket 上回写
        let step = tokio::select! {
            incoming = socket.recv() => Step::Client(incoming),
            event = events.recv() => Step::Event(event),
        };

        match step {
            Step::Client(Some(Ok(WsMessage::Text(text)))) => {
                if handle_client_frame(&mut socket, &state, &mut joined, text.as_str())
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Step::Client(Some(Ok(WsMessage::Close(_)))) | Step::Client(None) => break,
            Step::Client(Some(Ok(_))) => {} // 二进制、ping/pong 一律忽略
            Step::Client(Some(Err(err))) => {
                tracing::debug!(error = %err, "websocket receive failed");
                break;
            }
            Step::Event(Ok(event)) => {
                if deliver(&mut socket, &mut joined, event).await.is_err() {
                    break;
                }
            }
            Step::Event(Err(RecvError::Lagged(skipped))) => {
                // 落后的连接丢事件，历史靠 REST 补
                tracing::warn!(skipped, "websocket subscriber lagged");
            }
            Step::Event(Err(RecvError::Closed)) => break,
        }
    }
}

async fn handle_client_frame(
    socket: &mut WebSocket,
    state: &AppState,
    joined: &mut HashSet<String>,
    raw: &str,
) -> Result<(), axum::Error> {
    let frame: ClientFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::debug!(error = %err, "ignoring malformed websocket frame");
            return Ok(());
        }
    };

    match frame {
        ClientFrame::Join { rooms } => {
            joined.extend(rooms);
            Ok(())
        }
        ClientFrame::Chat {
            kind,
            members,
            title,
        } => {
            let result = state
                .chat_service
                .create_chat(CreateChatRequest {
                    kind,
                    title,
                    members,
                })
                .await;

            match result {
                Ok(chat) => {
                    // 创建方立即收到确认并进入新房间；
                    // 其他成员走下面的广播路径
                    joined.insert(chat.id.to_string());
                    send_json(socket, &ChatEvent::chat_created(chat)).await
                }
                Err(err) => {
                    send_json(
                        socket,
                        &ErrorFrame {
                            event: "error",
                            message: &err.to_string(),
                        },
                    )
                    .await
                }
            }
        }
    }
}

/// 房间过滤：消息事件看会话房间，会话创建事件看成员的昵称房间。
async fn deliver(
    socket: &mut WebSocket,
    joined: &mut HashSet<String>,
    event: ChatEvent,
) -> Result<(), axum::Error> {
    match &event {
        ChatEvent::Message { chat_id, .. } => {
            if !joined.contains(&chat_id.to_string()) {
                return Ok(());
            }
        }
        ChatEvent::Chat { chat } => {
            let room = chat.id.to_string();
            if joined.contains(&room) {
                // 本连接就是创建方，确认帧已经发过
                return Ok(());
            }
            if !chat.members.iter().any(|m| joined.contains(m.as_str())) {
                return Ok(());
            }
            // 收到新会话即自动入房，后续消息不再依赖客户端重新 join
            joined.insert(room);
        }
    }
    send_json(socket, &event).await
}

async fn send_json<T: Serialize>(socket: &mut WebSocket, payload: &T) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(payload) {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!(error = %err, "failed to serialize websocket payload");
            return Ok(());
        }
    };
    socket.send(WsMessage::Text(Utf8Bytes::from(json))).await
}
