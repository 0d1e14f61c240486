#![allow(clippy::unwrap_used)]
// Discovery against loopback listeners.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use camsweep_core::{CoreError, ScanConfig, ScanSpeed, Scanner};

// ── Helpers ─────────────────────────────────────────────────────────

/// Answer every request head on every connection with `reply`.
async fn listener_replying(reply: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (read, mut write) = socket.into_split();
                let mut reader = BufReader::new(read);
                let mut line = String::new();
                loop {
                    line.clear();
                    match reader.read_line(&mut line).await {
                        Ok(0) | Err(_) => return,
                        Ok(_) if line == "\r\n" => {
                            if write.write_all(reply.as_bytes()).await.is_err() {
                                return;
                            }
                        }
                        Ok(_) => {}
                    }
                }
            });
        }
    });
    port
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn scanner(targets: &[&str], ports: Vec<String>) -> Scanner {
    Scanner::new(
        ScanConfig::new(targets.iter().map(ToString::to_string).collect())
            .with_ports(ports)
            .with_speed(ScanSpeed::new(5).unwrap()),
    )
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn rtsp_listener_becomes_labelled_device() {
    let rtsp = listener_replying(
        "RTSP/1.0 200 OK\r\nCSeq: 1\r\nServer: GStreamer RTSP server\r\nPublic: OPTIONS, DESCRIBE, SETUP\r\n\r\n",
    )
    .await;
    let closed = closed_port().await;

    let devices = scanner(&["127.0.0.1"], vec![format!("{closed},{rtsp}")])
        .scan()
        .await
        .unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].address, "127.0.0.1");
    assert_eq!(devices[0].port, rtsp);
    assert_eq!(devices[0].label.as_deref(), Some("GStreamer RTSP server"));
    assert!(devices[0].routes.is_empty());
}

#[tokio::test]
async fn unauthorized_options_still_counts() {
    let rtsp = listener_replying("RTSP/1.0 401 Unauthorized\r\nCSeq: 1\r\n\r\n").await;

    let devices = scanner(&["127.0.0.1"], vec![rtsp.to_string()])
        .scan()
        .await
        .unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].label, None);
}

#[tokio::test]
async fn http_listener_is_not_a_device() {
    let http = listener_replying("HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n").await;

    let devices = scanner(&["127.0.0.1"], vec![http.to_string()])
        .scan()
        .await
        .unwrap();

    assert!(devices.is_empty());
}

#[tokio::test]
async fn results_follow_port_order() {
    let first = listener_replying("RTSP/1.0 200 OK\r\nServer: one\r\n\r\n").await;
    let second = listener_replying("RTSP/1.0 200 OK\r\nServer: two\r\n\r\n").await;

    let devices = scanner(&["127.0.0.1"], vec![second.to_string(), first.to_string()])
        .scan()
        .await
        .unwrap();

    let labels: Vec<_> = devices.iter().map(|d| d.label.as_deref().unwrap()).collect();
    assert_eq!(labels, ["two", "one"]);
}

#[tokio::test]
async fn bad_input_is_reported_before_scanning() {
    let err = scanner(&[], vec!["554".into()]).scan().await.unwrap_err();
    assert!(matches!(err, CoreError::NoTargets));

    let err = scanner(&["10.0.0.0/33"], vec!["554".into()]).scan().await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTarget { .. }));

    let err = scanner(&["127.0.0.1"], vec!["0".into()]).scan().await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidPorts { .. }));
}
