//! Suite runner: one external process per suite, output relayed live
//!
//! Both output streams are read concurrently and merged into a single
//! channel, so relative order is preserved within a stream but not across
//! streams. The completion line is emitted only after both readers have
//! drained (or the flush timeout expired), making it the last line of the
//! suite.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use portal_e2e_common::{DashboardConfig, LogLine, OutputStream, RunnerCommandConfig, Severity};

use crate::channel::EventChannel;
use crate::classify::LineClassifier;
use crate::error::RunnerError;
use crate::invocation::{Invocation, SuiteRun};
use crate::lines::LineBuffer;

const READ_CHUNK: usize = 8192;

/// Outcome of one suite process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteExecution {
    /// Process exit code; 1 when it could not be started or was killed
    pub exit_code: i32,
    /// Every line relayed for the suite, in emission order
    pub lines: Vec<LogLine>,
}

impl SuiteExecution {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes a single suite and streams its output to a channel
#[async_trait]
pub trait SuiteExecutor: Send + Sync {
    async fn run(&self, run: &SuiteRun<'_>, channel: &EventChannel) -> SuiteExecution;
}

/// Runs suites through the configured external test runner
pub struct SuiteRunner {
    command: RunnerCommandConfig,
    project_dir: PathBuf,
    classifier: Arc<LineClassifier>,
}

impl SuiteRunner {
    pub fn new(command: RunnerCommandConfig, project_dir: impl Into<PathBuf>, classifier: LineClassifier) -> Self {
        Self {
            command,
            project_dir: project_dir.into(),
            classifier: Arc::new(classifier),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(
            config.runner.clone(),
            config.project_dir.clone(),
            LineClassifier::new(&config.classifier),
        )
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn invocation(&self, run: &SuiteRun<'_>) -> Invocation {
        Invocation::build(&self.command, &self.project_dir, run)
    }

    fn flush_timeout(&self) -> Duration {
        self.command.stream_flush_timeout()
    }
}

/// Collects emitted lines while forwarding them
struct Relay<'a> {
    channel: &'a EventChannel,
    lines: Vec<LogLine>,
}

impl<'a> Relay<'a> {
    fn new(channel: &'a EventChannel) -> Self {
        Self {
            channel,
            lines: Vec::new(),
        }
    }

    fn emit(&mut self, severity: Severity, text: impl Into<String>) {
        let line = LogLine::new(severity, text);
        self.channel.line(&line);
        self.lines.push(line);
    }

    fn finish(self, exit_code: i32) -> SuiteExecution {
        SuiteExecution {
            exit_code,
            lines: self.lines,
        }
    }
}

#[async_trait]
impl SuiteExecutor for SuiteRunner {
    async fn run(&self, run: &SuiteRun<'_>, channel: &EventChannel) -> SuiteExecution {
        let suite = run.suite.name.as_str();
        let invocation = self.invocation(run);
        let mut relay = Relay::new(channel);

        relay.emit(Severity::Info, format!("Executing: {}", invocation.command_line()));
        info!(
            suite = %suite,
            program = %invocation.program,
            grep = ?invocation.grep(),
            "Starting suite process"
        );

        let mut child = match invocation.to_command().spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = RunnerError::Spawn {
                    program: invocation.program.clone(),
                    source,
                };
                warn!(suite = %suite, error = %err, "Suite process did not start");
                relay.emit(Severity::Error, format!("✗ {}", err));
                return relay.finish(1);
            }
        };

        if let Some(pid) = child.id() {
            relay.emit(Severity::Info, format!("Test process spawned (pid {})", pid));
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<(OutputStream, String)>();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(read_lines(stdout, OutputStream::Stdout, tx.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(read_lines(stderr, OutputStream::Stderr, tx.clone())));
        }
        drop(tx);

        let classifier = self.classifier.clone();
        let flush_timeout = self.flush_timeout();

        let forward = async {
            while let Some((stream, text)) = rx.recv().await {
                let severity = classifier.classify(stream, &text);
                debug!(suite = %suite, stream = %stream, severity = %severity, "{}", text);
                relay.emit(severity, text);
            }
        };

        let wait = async {
            let status = child.wait().await;

            let drain = drain_readers(&mut readers);
            if tokio::time::timeout(flush_timeout, drain).await.is_err() {
                warn!(
                    suite = %suite,
                    timeout_secs = flush_timeout.as_secs(),
                    "Output readers did not finish, abandoning remaining output"
                );
                for reader in &readers {
                    reader.abort();
                }
            }
            status
        };

        let ((), status) = tokio::join!(forward, wait);

        let exit_code = match status {
            Ok(status) => match status.code() {
                Some(code) => code,
                None => {
                    #[cfg(unix)]
                    {
                        use std::os::unix::process::ExitStatusExt;
                        if let Some(signal) = status.signal() {
                            relay.emit(
                                Severity::Warning,
                                format!("Test process terminated by signal {}", signal),
                            );
                        }
                    }
                    1
                }
            },
            Err(e) => {
                warn!(suite = %suite, error = %e, "Failed waiting for suite process");
                1
            }
        };

        let total = run.tests.len();
        if exit_code == 0 {
            relay.emit(
                Severity::Success,
                format!("✓ {} {} test(s) completed successfully", suite.to_uppercase(), total),
            );
        } else {
            relay.emit(
                Severity::Error,
                format!("✗ {} tests failed with exit code {}", suite.to_uppercase(), exit_code),
            );
        }

        info!(suite = %suite, exit_code, "Suite process finished");
        relay.finish(exit_code)
    }
}

async fn drain_readers(readers: &mut [tokio::task::JoinHandle<()>]) {
    for reader in readers.iter_mut() {
        let _ = reader.await;
    }
}

/// Read raw chunks and forward each completed line
async fn read_lines<R>(mut reader: R, stream: OutputStream, tx: mpsc::UnboundedSender<(OutputStream, String)>)
where
    R: AsyncRead + Unpin,
{
    let mut buffer = LineBuffer::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                for line in buffer.push(&chunk[..n]) {
                    if tx.send((stream, line)).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                debug!(stream = %stream, error = %e, "Output read failed");
                break;
            }
        }
    }

    let dropped = buffer.finish();
    if dropped > 0 {
        debug!(stream = %stream, bytes = dropped, "Discarding unterminated trailing output");
    }
}
