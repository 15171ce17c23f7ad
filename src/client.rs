//! # Cache Client
//!
//! An async client over a single connection. Each request encodes a command
//! array, writes it out, and reads exactly one reply frame back through a
//! client-side [`Parser`], which accepts every reply kind the server can
//! produce (simple strings, errors, integers, bulk strings, arrays).

use crate::constants::READ_BUFFER_LEN;
use crate::errors::ConnectionError;
use crate::resp::{self, Frame, Mode, Parser};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Expiry option for [`Client::set_with_expiry`]
#[derive(Debug, Clone, Copy)]
pub enum Expiry {
    /// `EX <seconds>`
    Seconds(u64),
    /// `PX <millis>`
    Millis(u64),
}

/// A client bound to one server connection
#[derive(Debug)]
pub struct Client {
    stream: TcpStream,
    parser: Parser,
}

impl Client {
    /// Connects to a server.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ConnectionError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            stream,
            parser: Parser::new(Mode::Client),
        })
    }

    /// `PING [message]`
    pub async fn ping(&mut self, message: Option<&str>) -> Result<Frame, ConnectionError> {
        match message {
            None => self.request(&["PING"]).await,
            Some(message) => self.request(&["PING", message]).await,
        }
    }

    /// `ECHO message`
    pub async fn echo(&mut self, message: &str) -> Result<Frame, ConnectionError> {
        self.request(&["ECHO", message]).await
    }

    /// `SET key value`
    pub async fn set(&mut self, key: &str, value: &str) -> Result<Frame, ConnectionError> {
        self.request(&["SET", key, value]).await
    }

    /// `SET key value EX seconds` / `SET key value PX millis`
    pub async fn set_with_expiry(
        &mut self,
        key: &str,
        value: &str,
        expiry: Expiry,
    ) -> Result<Frame, ConnectionError> {
        let (keyword, amount) = match expiry {
            Expiry::Seconds(n) => ("EX", n.to_string()),
            Expiry::Millis(n) => ("PX", n.to_string()),
        };
        self.request(&["SET", key, value, keyword, &amount]).await
    }

    /// `GET key`
    pub async fn get(&mut self, key: &str) -> Result<Frame, ConnectionError> {
        self.request(&["GET", key]).await
    }

    /// `DEL key [key …]`
    pub async fn del(&mut self, keys: &[&str]) -> Result<Frame, ConnectionError> {
        let mut parts = vec!["DEL"];
        parts.extend_from_slice(keys);
        self.request(&parts).await
    }

    /// `LPUSH key value [value …]`
    pub async fn lpush(&mut self, key: &str, values: &[&str]) -> Result<Frame, ConnectionError> {
        let mut parts = vec!["LPUSH", key];
        parts.extend_from_slice(values);
        self.request(&parts).await
    }

    /// `LPOP key`
    pub async fn lpop(&mut self, key: &str) -> Result<Frame, ConnectionError> {
        self.request(&["LPOP", key]).await
    }

    /// Sends `parts` as one command array and reads exactly one reply frame.
    ///
    /// This is also the escape hatch for commands without a dedicated
    /// method; the server decides whether it understands them.
    pub async fn request(&mut self, parts: &[&str]) -> Result<Frame, ConnectionError> {
        self.stream.write_all(&resp::encode_array(parts)).await?;
        self.stream.flush().await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Frame, ConnectionError> {
        loop {
            if let Some(frame) = self.parser.next_command() {
                return Ok(frame);
            }
            let mut buf = [0u8; READ_BUFFER_LEN];
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Err(ConnectionError::Closed);
            }
            self.parser.feed(&buf[..n])?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use crate::server::Server;
    use crate::storage::Store;
    use crate::types::SharedStore;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    async fn spawn_server() -> SocketAddr {
        let args = Args {
            port: 0,
            max_conn: 8,
        };
        let storage: SharedStore = Arc::new(Mutex::new(Store::new()));
        let server = Server::new(&args, storage).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            server.start().await.unwrap();
        });
        addr
    }

    async fn connect(addr: SocketAddr) -> Client {
        Client::connect(("127.0.0.1", addr.port())).await.unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let mut client = connect(spawn_server().await).await;
        assert_eq!(
            Frame::Simple("PONG".to_string()),
            client.ping(None).await.unwrap()
        );
        assert_eq!(
            Frame::Bulk(Some("hey".to_string())),
            client.ping(Some("hey")).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_set_get_del() {
        let mut client = connect(spawn_server().await).await;
        assert_eq!(
            Frame::Simple("OK".to_string()),
            client.set("name", "aleksa").await.unwrap()
        );
        assert_eq!(
            Frame::Bulk(Some("aleksa".to_string())),
            client.get("name").await.unwrap()
        );
        assert_eq!(
            Frame::Integer(1),
            client.del(&["name", "missing"]).await.unwrap()
        );
        assert_eq!(Frame::Bulk(None), client.get("name").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_with_expiry() {
        let mut client = connect(spawn_server().await).await;
        client
            .set_with_expiry("k", "v", Expiry::Millis(50))
            .await
            .unwrap();
        assert_eq!(
            Frame::Bulk(Some("v".to_string())),
            client.get("k").await.unwrap()
        );
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(Frame::Bulk(None), client.get("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_lpush_lpop() {
        let mut client = connect(spawn_server().await).await;
        assert_eq!(
            Frame::Integer(3),
            client.lpush("l", &["a", "b", "c"]).await.unwrap()
        );
        assert_eq!(
            Frame::Simple("c".to_string()),
            client.lpop("l").await.unwrap()
        );
        assert_eq!(
            Frame::Simple("b".to_string()),
            client.lpop("l").await.unwrap()
        );
        assert_eq!(
            Frame::Simple("a".to_string()),
            client.lpop("l").await.unwrap()
        );
        assert_eq!(
            Frame::Error("ERR wrong key".to_string()),
            client.lpop("l").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_error_replies_are_frames_not_failures() {
        let mut client = connect(spawn_server().await).await;
        assert_eq!(
            Frame::Error("ERR unknown command 'BEL'".to_string()),
            client.request(&["BEL", "k"]).await.unwrap()
        );
    }
}
