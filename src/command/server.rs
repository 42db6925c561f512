//! # Command Socket
//!
//! Line-based TCP server for operator commands. Every accepted connection
//! reads one command per line and forwards it to the collector loop; the
//! collector answers through a per-connection reply channel whose lines go
//! back verbatim, terminated by the verdict line (`OK`, `FAIL`, `ERR…`).

use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// One command line from a client, with the channel its output goes to.
///
/// Dropping the receiving side (client gone) silently discards replies;
/// an in-flight request is not cancelled by a disconnect.
#[derive(Debug)]
pub struct ClientRequest {
    pub line: String,
    pub reply: mpsc::UnboundedSender<String>,
}

/// Accept loop. Runs until the listener fails or the collector side of
/// `requests` goes away.
pub async fn run_command_server(
    listener: TcpListener,
    requests: mpsc::UnboundedSender<ClientRequest>,
) {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                info!("command connection from {peer}");
                tokio::spawn(handle_connection(socket, requests.clone()));
            }
            Err(e) => {
                warn!("command socket accept error: {e}");
                return;
            }
        }
    }
}

async fn handle_connection(socket: TcpStream, requests: mpsc::UnboundedSender<ClientRequest>) {
    let (reader, mut writer) = socket.into_split();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(line) = reply_rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
            {
                return;
            }
        }
    });

    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        let request = ClientRequest {
            line,
            reply: reply_tx.clone(),
        };
        if requests.send(request).is_err() {
            return;
        }
    }
}
