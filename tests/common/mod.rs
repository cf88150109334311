//! Scripted in-memory transport shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kernel_build_client::protocol::escape;
use kernel_build_client::{
    BuildClient, BuildClientError, ClientOptions, CompanionCommand, Inbound, Result, Transport,
};

/// What the scripted companion does on the next read
#[derive(Debug, Clone)]
pub enum Step {
    /// Answer with this exact line
    Line(String),
    /// Let the timeout elapse
    Silence,
    /// Fail the read as if the pipe broke
    Broken,
    /// Never answer, not even with a timeout
    Hang,
    /// Reply with the payload of the last request, escaped
    Echo,
}

/// Everything the transport observed, shared with the test body
#[derive(Debug, Default)]
pub struct Record {
    pub opened: Vec<CompanionCommand>,
    pub written: Vec<String>,
    pub closes: usize,
    pub timeout: Option<Duration>,
}

/// Transport that replays a fixed script and records all traffic
pub struct ScriptedTransport {
    script: VecDeque<Step>,
    record: Arc<Mutex<Record>>,
    ready: bool,
    fail_open: bool,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> (Self, Arc<Mutex<Record>>) {
        let record = Arc::new(Mutex::new(Record::default()));
        let transport = Self {
            script: steps.into_iter().collect(),
            record: record.clone(),
            ready: false,
            fail_open: false,
        };
        (transport, record)
    }

    /// Answer each request with `[~]` + the given payload
    pub fn replying(payloads: &[&str]) -> (Self, Arc<Mutex<Record>>) {
        Self::new(payloads.iter().map(|p| Step::Line(format!("[~]{p}"))))
    }

    pub fn failing_open() -> (Self, Arc<Mutex<Record>>) {
        let (mut transport, record) = Self::new([]);
        transport.fail_open = true;
        (transport, record)
    }
}

impl Transport for ScriptedTransport {
    async fn open(&mut self, command: &CompanionCommand) -> Result<()> {
        if self.fail_open {
            return Err(BuildClientError::launch("scripted launch failure"));
        }
        self.record.lock().unwrap().opened.push(command.clone());
        self.ready = true;
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.record.lock().unwrap().timeout = Some(timeout);
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        if !self.ready {
            return Err(BuildClientError::transport("write on closed transport"));
        }
        self.record.lock().unwrap().written.push(line.to_string());
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Inbound> {
        if !self.ready {
            return Err(BuildClientError::transport("read on closed transport"));
        }
        match self.script.pop_front() {
            Some(Step::Line(line)) => Ok(Inbound::Line(line)),
            Some(Step::Silence) => Ok(Inbound::TimedOut),
            Some(Step::Echo) => {
                let record = self.record.lock().unwrap();
                let last = record.written.last().cloned().unwrap_or_default();
                let payload = last.split_once(' ').map_or("", |(_, rest)| rest);
                Ok(Inbound::Line(format!("noise[~]{}", escape(payload))))
            }
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Broken) => Err(BuildClientError::transport("scripted broken pipe")),
            None => Ok(Inbound::Closed),
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn close(&mut self) -> Result<()> {
        self.ready = false;
        self.record.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// Options that never spawn anything: fixed interpreter, pinned script
pub fn test_options() -> ClientOptions {
    ClientOptions::builder()
        .interpreter("python3")
        .script_path("/opt/build/kernel_build_server.py")
        .timeout(Duration::from_secs(3))
        .build()
}

pub fn scripted_client(payloads: &[&str]) -> (BuildClient<ScriptedTransport>, Arc<Mutex<Record>>) {
    let (transport, record) = ScriptedTransport::replying(payloads);
    (BuildClient::with_transport(transport, test_options()), record)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
