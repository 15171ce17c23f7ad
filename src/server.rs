//! # The Cache Server

use crate::cli::Args;
use crate::conn::handle_connection;
use crate::constants::BIND_ADDR;
use crate::errors::ServerError;
use crate::types::SharedStore;
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

/// The cache server
///
/// Owns the listener, a connection budget, and a handle to the shared
/// keyspace. Supports many concurrent clients, each free to send multiple
/// successive requests over its connection.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    max_conn: Arc<Semaphore>,
    storage: SharedStore,
}

impl Server {
    /// Binds the listener and prepares the server to run.
    pub async fn new(args: &Args, storage: SharedStore) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(format!("{BIND_ADDR}:{}", args.port)).await?;
        info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            max_conn: Arc::new(Semaphore::new(args.max_conn)),
            storage,
        })
    }

    /// The address the listener actually bound. Mostly useful when the
    /// configured port was 0.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Starts the server.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.core_loop().await
    }

    /// Accepts connections forever.
    ///
    /// Each accepted socket is moved into its own task together with one
    /// connection permit; the permit returns to the pool when the task
    /// finishes, which is what bounds the number of live connections.
    async fn core_loop(&self) -> Result<(), ServerError> {
        info!("Waiting for requests...");

        loop {
            let permit = Arc::clone(&self.max_conn).acquire_owned().await?;
            let (mut socket, peer_addr) = self.listener.accept().await?;
            debug!("Accepted connection from {peer_addr}");
            let storage = Arc::clone(&self.storage);

            tokio::spawn(async move {
                if let Err(err) = handle_connection(storage, &mut socket).await {
                    warn!("Connection from {peer_addr} ended with error: {err}");
                }
                // Drop the socket while the permit is still live.
                drop(socket);
                drop(permit);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Store;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

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

    async fn connect(addr: SocketAddr) -> TcpStream {
        TcpStream::connect(("127.0.0.1", addr.port())).await.unwrap()
    }

    async fn read_expected(stream: &mut TcpStream, expected: &[u8]) {
        let mut buf = vec![0u8; expected.len()];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(expected, &buf[..]);
    }

    #[tokio::test]
    async fn test_ping_round_trip() {
        let addr = spawn_server().await;
        let mut stream = connect(addr).await;

        stream.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
        read_expected(&mut stream, b"+PONG\r\n").await;
    }

    #[tokio::test]
    async fn test_set_then_get_round_trip() {
        let addr = spawn_server().await;
        let mut stream = connect(addr).await;

        stream
            .write_all(b"*3\r\n$3\r\nSET\r\n$4\r\nname\r\n$6\r\naleksa\r\n")
            .await
            .unwrap();
        read_expected(&mut stream, b"+OK\r\n").await;

        stream
            .write_all(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n")
            .await
            .unwrap();
        read_expected(&mut stream, b"$6\r\naleksa\r\n").await;
    }

    #[tokio::test]
    async fn test_pipelined_commands_reply_in_order() {
        let addr = spawn_server().await;
        let mut stream = connect(addr).await;

        stream
            .write_all(b"*1\r\n$4\r\nPING\r\n*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n")
            .await
            .unwrap();
        read_expected(&mut stream, b"+PONG\r\n$2\r\nhi\r\n").await;
    }

    #[tokio::test]
    async fn test_fragmented_command_round_trip() {
        let addr = spawn_server().await;
        let mut stream = connect(addr).await;

        for chunk in [
            b"*2\r\n$4\r\n".as_slice(),
            b"ECHO\r\n$2\r\n".as_slice(),
            b"hi\r\n".as_slice(),
        ] {
            stream.write_all(chunk).await.unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        read_expected(&mut stream, b"$2\r\nhi\r\n").await;
    }

    #[tokio::test]
    async fn test_px_expiry_round_trip() {
        let addr = spawn_server().await;
        let mut stream = connect(addr).await;

        stream
            .write_all(b"*5\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nPX\r\n$2\r\n50\r\n")
            .await
            .unwrap();
        read_expected(&mut stream, b"+OK\r\n").await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        stream
            .write_all(b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n")
            .await
            .unwrap();
        read_expected(&mut stream, b"$-1\r\n").await;
    }

    #[tokio::test]
    async fn test_protocol_error_closes_connection() {
        let addr = spawn_server().await;
        let mut stream = connect(addr).await;

        stream.write_all(b"+OK\r\n").await.unwrap();
        read_expected(&mut stream, b"-ERR unsupported request type: +\r\n").await;

        // The server hangs up after a protocol error.
        let mut rest = Vec::new();
        let n = stream.read_to_end(&mut rest).await.unwrap();
        assert_eq!(0, n);
    }

    #[tokio::test]
    async fn test_unknown_command_round_trip() {
        let addr = spawn_server().await;
        let mut stream = connect(addr).await;

        stream
            .write_all(b"*2\r\n$3\r\nBEL\r\n$1\r\nk\r\n")
            .await
            .unwrap();
        read_expected(&mut stream, b"-ERR unknown command 'BEL'\r\n").await;
    }
}
