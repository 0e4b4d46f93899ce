//! Exit status of the gateway-proxy binary on SIGTERM.

#![cfg(unix)]

use std::io::Write;
use std::net::SocketAddr;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tokio::net::TcpStream;

mod common;

fn spawn_proxy(port: u16, backend: SocketAddr, grace_ms: u64) -> (Child, tempfile::NamedTempFile) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[listener]
bind_host = "127.0.0.1"
port = {port}

[timeouts]
request_ms = 30000
shutdown_grace_ms = {grace_ms}

[observability]
log_level = "warn"

[[gateways]]
key = "vandar"
target = "http://{backend}"
host_header = "ipg.vandar.io"

[referrers]
"pay.v1-domain.com" = "https://v1-domain.com/"
"#
    )
    .unwrap();

    let child = Command::new(env!("CARGO_BIN_EXE_gateway-proxy"))
        .arg("--config")
        .arg(file.path())
        .env_remove("PORT")
        .env_remove("LOG_LEVEL")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    (child, file)
}

async fn wait_until_listening(addr: SocketAddr) {
    let started = Instant::now();
    while TcpStream::connect(addr).await.is_err() {
        assert!(started.elapsed() < Duration::from_secs(10), "proxy never started");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

fn terminate(child: &Child) {
    let status = Command::new("kill")
        .arg("-TERM")
        .arg(child.id().to_string())
        .status()
        .unwrap();
    assert!(status.success());
}

async fn wait_for_exit(child: &mut Child, limit: Duration) -> Option<i32> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status.code();
        }
        if started.elapsed() > limit {
            let _ = child.kill();
            panic!("proxy did not exit within {limit:?}");
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn test_sigterm_when_idle_exits_zero() {
    let backend = common::unused_addr().await;
    let addr = common::unused_addr().await;
    let (mut child, _config) = spawn_proxy(addr.port(), backend, 2000);
    wait_until_listening(addr).await;

    terminate(&child);
    assert_eq!(wait_for_exit(&mut child, Duration::from_secs(5)).await, Some(0));
}

#[tokio::test]
async fn test_sigterm_with_stuck_request_exits_one_after_grace() {
    let (backend, _closed) = common::start_silent_backend().await;
    let addr = common::unused_addr().await;
    let (mut child, _config) = spawn_proxy(addr.port(), backend, 300);
    wait_until_listening(addr).await;

    let url = format!("http://{addr}/vandar/hang");
    let _in_flight = tokio::spawn(async move {
        common::client()
            .get(url)
            .header("Host", common::V1_HOST)
            .send()
            .await
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    terminate(&child);
    assert_eq!(wait_for_exit(&mut child, Duration::from_secs(5)).await, Some(1));
    assert!(started.elapsed() >= Duration::from_millis(300));
}
