use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use log::*;

/// GET upgrade to a websocket that echoes every text frame back
pub async fn echo(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(echo_socket)
}

async fn echo_socket(mut socket: WebSocket) {
    debug!("Websocket echo connection opened");

    // Runs until the stream ends. After a Close frame the protocol layer
    // queues its reply, and the following recv flushes it before yielding None.
    while let Some(frame) = socket.recv().await {
        match frame {
            Ok(WsMessage::Text(text)) => {
                if let Err(e) = socket.send(WsMessage::Text(echo_reply(&text))).await {
                    debug!("Websocket echo send failed: {e}");
                    break;
                }
            }
            Ok(WsMessage::Close(frame)) => debug!("Websocket echo peer closed: {frame:?}"),
            // Pings are answered by the protocol layer; binary frames are ignored.
            Ok(_) => {}
            Err(e) => {
                debug!("Websocket echo receive failed: {e}");
                break;
            }
        }
    }

    debug!("Websocket echo connection closed");
}

fn echo_reply(text: &str) -> String {
    format!("Message received: {text}")
}
