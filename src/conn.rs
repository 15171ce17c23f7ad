//! # Connection Handler
//!
//! Drives one client connection: socket bytes in, reply bytes out.
//!
//! A single read can carry any number of complete or partial commands, since
//! clients may [pipeline](https://redis.io/docs/latest/develop/use/pipelining/)
//! requests and TCP fragments them arbitrarily. The per-connection
//! [`Parser`] absorbs whatever arrives; the handler then drains every
//! fully-parsed command and writes its reply, so replies always come back in
//! arrival order.

use crate::cmd;
use crate::constants::READ_BUFFER_LEN;
use crate::errors::ConnectionError;
use crate::resp::{self, Mode, Parser};
use crate::types::SharedStore;
use log::{trace, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Handles all requests arriving over one connection.
///
/// Returns cleanly when the peer closes the stream. Malformed input is fatal
/// to the connection: the client gets an `ERR` reply naming the problem, the
/// stream is closed, and the error is surfaced to the accept loop.
pub async fn handle_connection(
    storage: SharedStore,
    stream: &mut TcpStream,
) -> Result<(), ConnectionError> {
    let peer_addr = stream.peer_addr()?;
    trace!("Start handling requests from {peer_addr}");

    let mut parser = Parser::new(Mode::Server);
    let mut buf = [0u8; READ_BUFFER_LEN];

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) => {
                warn!("Read from {peer_addr} failed: {err}");
                return Err(ConnectionError::from(err));
            }
        };

        if let Err(err) = parser.feed(&buf[..n]) {
            stream
                .write_all(&resp::encode_simple_error(&err.to_string()))
                .await?;
            stream.flush().await?;
            return Err(ConnectionError::from(err));
        }

        while let Some(command) = parser.next_command() {
            let reply = cmd::dispatch(&storage, command);
            stream.write_all(&reply).await?;
        }
        stream.flush().await?;
    }

    trace!("Stop handling requests from {peer_addr}");
    Ok(())
}
