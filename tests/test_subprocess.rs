//! Integration tests for `SubprocessTransport`
//!
//! A small shell script stands in for the kernel build server, with `sh` as
//! the interpreter.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use kernel_build_client::{
    BuildClient, BuildClientError, ClientOptions, CompanionCommand, Inbound, Payload,
    SubprocessTransport, TaskId, Transport,
};

const FAKE_SERVER: &str = r#"
echo "fake server starting" >&2
while IFS= read -r line; do
  case "$line" in
    FIN) exit 0 ;;
    RESET) echo "warning: deprecated api"; echo "noise[~]ACK" ;;
    "SUPPORT "*) echo "[~]True" ;;
    "FORMAT "*) echo "[~]NC1HWC0[SP]FRACTAL_NZ[LF]done" ;;
    "START "*) echo "[~]7" ;;
    WAIT) sleep 5 ;;
    *) echo "[~]ERR" ;;
  esac
done
"#;

const SLOW_SERVER: &str = r#"
while IFS= read -r line; do
  case "$line" in
    FIN) exit 0 ;;
    "FORMAT "*) sleep 0.5; echo "[~]reply-to-${line#FORMAT }" ;;
  esac
done
"#;

fn write_server(dir: &Path, body: &str) -> PathBuf {
    let script = dir.join("kernel_build_server.py");
    std::fs::write(&script, body).unwrap();
    script
}

fn options(script: PathBuf) -> ClientOptions {
    ClientOptions::builder()
        .interpreter("/bin/sh")
        .script_path(script)
        .timeout(Duration::from_secs(5))
        .shutdown_grace(Duration::from_millis(500))
        .build()
}

#[tokio::test]
async fn test_build_lifecycle_against_fake_server() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let client = BuildClient::new(options(write_server(dir.path(), FAKE_SERVER)));
    let job = Payload::new(r#"{"op":"add"}"#).unwrap();

    assert!(client.check_supported(&job).await.unwrap());
    assert_eq!(
        client.select_format(&job).await.unwrap(),
        "NC1HWC0 FRACTAL_NZ\ndone"
    );
    assert_eq!(client.start(&job).await.unwrap(), TaskId::new(7));
    client.reset().await.unwrap();

    client.close().await.unwrap();
    assert!(!client.is_open().await);
}

#[tokio::test]
async fn test_cancelled_call_never_leaks_its_reply() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let client = BuildClient::new(options(write_server(dir.path(), SLOW_SERVER)));

    let first = Payload::new("A").unwrap();
    let abandoned =
        tokio::time::timeout(Duration::from_millis(100), client.select_format(&first)).await;
    assert!(abandoned.is_err());

    let second = Payload::new("B").unwrap();
    assert_eq!(client.select_format(&second).await.unwrap(), "reply-to-B");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = options(write_server(dir.path(), FAKE_SERVER));
    options.timeout = Duration::from_millis(300);
    let client = BuildClient::new(options);

    let result = client.wait().await;
    assert!(matches!(result, Err(BuildClientError::Timeout { .. })));
    assert!(!client.is_open().await);
}

#[tokio::test]
async fn test_server_exit_is_transport_failure() {
    let dir = tempfile::tempdir().unwrap();
    let client = BuildClient::new(options(write_server(dir.path(), "exit 0\n")));

    let result = client.wait().await;
    assert!(matches!(
        result,
        Err(BuildClientError::Transport(_) | BuildClientError::Io(_))
    ));
    assert!(!client.is_open().await);
}

#[tokio::test]
async fn test_missing_interpreter_is_launch_failure() {
    let mut transport = SubprocessTransport::new();
    let command = CompanionCommand::new("/nonexistent/bin/python3", "/srv/server.py");

    let result = transport.open(&command).await;
    assert!(matches!(result, Err(BuildClientError::Launch(_))));
    assert!(!transport.is_ready());
}

#[tokio::test]
async fn test_transport_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_server(dir.path(), FAKE_SERVER);
    let mut transport = SubprocessTransport::new();

    transport
        .open(&CompanionCommand::new("/bin/sh", &script))
        .await
        .unwrap();
    assert!(transport.is_ready());
    assert!(transport.pid().is_some());

    transport.write_line("RESET").await.unwrap();
    assert_eq!(
        transport.read_line().await.unwrap(),
        Inbound::Line("warning: deprecated api".to_string())
    );
    assert_eq!(
        transport.read_line().await.unwrap(),
        Inbound::Line("noise[~]ACK".to_string())
    );

    transport.write_line("FIN").await.unwrap();
    transport.close().await.unwrap();
    assert!(!transport.is_ready());
    assert!(transport.write_line("RESET").await.is_err());
}

#[tokio::test]
async fn test_open_through_resolution_probe() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let script = write_server(dir.path(), FAKE_SERVER);

    // Answers the probe with the script path, otherwise runs the script
    let fake_python = dir.path().join("python");
    std::fs::write(
        &fake_python,
        format!(
            "#!/bin/sh\nif [ \"$1\" = \"-c\" ]; then echo 'probe noise'; echo '[~]{}'; exit 0; fi\nexec /bin/sh \"$1\"\n",
            script.display()
        ),
    )
    .unwrap();
    std::fs::set_permissions(&fake_python, std::fs::Permissions::from_mode(0o755)).unwrap();

    let options = ClientOptions::builder()
        .interpreter(&fake_python)
        .timeout(Duration::from_secs(5))
        .shutdown_grace(Duration::from_millis(500))
        .build();
    let client = BuildClient::new(options);

    client.open().await.unwrap();
    assert!(client.is_open().await);
    client.reset().await.unwrap();

    client.close().await.unwrap();
    assert!(!client.is_open().await);
}
