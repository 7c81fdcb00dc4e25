//! WebSocket transport over `tokio-tungstenite`.

use async_trait::async_trait;
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{header::AUTHORIZATION, HeaderValue},
        Error as WsError, Message,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info};
use url::Url;

use super::{Frame, FrameSink, FrameStream, Transport, TransportError, TransportResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An authenticated WebSocket connection to the realtime endpoint.
pub struct WebSocketTransport {
    inner: WsStream,
}

impl WebSocketTransport {
    /// Connect to `url`, authenticating with `Authorization: Bearer <api_key>`.
    pub async fn connect(url: &Url, api_key: &str) -> TransportResult<Self> {
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(TransportError::InvalidRequest(format!(
                    "unsupported scheme `{other}`"
                )))
            }
        }

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (inner, response) = connect_async(request)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        info!(url = %url, status = %response.status(), "Connected to realtime endpoint");

        Ok(Self { inner })
    }
}

impl Transport for WebSocketTransport {
    type Sink = WebSocketSink;
    type Stream = WebSocketReceiver;

    fn split(self) -> (Self::Sink, Self::Stream) {
        let (sink, stream) = self.inner.split();
        (WebSocketSink { inner: sink }, WebSocketReceiver { inner: stream })
    }
}

pub struct WebSocketSink {
    inner: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameSink for WebSocketSink {
    async fn send(&mut self, frame: Frame) -> TransportResult<()> {
        let message = match frame {
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Binary(bytes) => Message::Binary(bytes.into()),
        };
        self.inner.send(message).await.map_err(|e| match e {
            WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
            other => TransportError::Send(other.to_string()),
        })
    }

    async fn close(&mut self) -> TransportResult<()> {
        match self.inner.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(TransportError::Send(e.to_string())),
        }
    }
}

pub struct WebSocketReceiver {
    inner: SplitStream<WsStream>,
}

#[async_trait]
impl FrameStream for WebSocketReceiver {
    async fn next_frame(&mut self) -> Option<TransportResult<Frame>> {
        loop {
            let message = match self.inner.next().await? {
                Ok(message) => message,
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
                Err(e) => return Some(Err(TransportError::Receive(e.to_string()))),
            };

            match message {
                Message::Text(text) => return Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Message::Binary(bytes) => return Some(Ok(Frame::Binary(bytes.to_vec()))),
                Message::Close(frame) => {
                    debug!(?frame, "Server closed the connection");
                    return None;
                }
                // tungstenite answers pings itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }
}
