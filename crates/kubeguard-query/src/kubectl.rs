use crate::{QueryError, QueryRunner, RawOutput};
use kubeguard_domain::policy::{OutputShape, QuerySpec};
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// stderr fragments kubectl prints when the API server cannot be reached.
const UNREACHABLE_MARKERS: &[&str] = &[
    "Unable to connect to the server",
    "connection refused",
    "no such host",
    "i/o timeout",
];

#[derive(Clone, Debug)]
pub struct KubectlRunner {
    program: String,
    context: Option<String>,
    kubeconfig: Option<String>,
    timeout: Duration,
}

impl KubectlRunner {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            context: None,
            kubeconfig: None,
            timeout,
        }
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_kubeconfig(mut self, kubeconfig: Option<String>) -> Self {
        self.kubeconfig = kubeconfig;
        self
    }

    fn argv(&self, spec: &QuerySpec) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(kubeconfig) = &self.kubeconfig {
            args.push("--kubeconfig".to_string());
            args.push(kubeconfig.clone());
        }
        if let Some(context) = &self.context {
            args.push("--context".to_string());
            args.push(context.clone());
        }
        args.extend(kubectl_args(spec));
        args
    }

    fn run(&self, args: &[String]) -> Result<RawOutput, QueryError> {
        let command = display_command(&self.program, args);
        debug!(%command, timeout_ms = self.timeout.as_millis() as u64, "running query");

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| QueryError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Drain both pipes concurrently so a chatty child cannot block on a full pipe.
        let stdout_rx = spawn_reader(child.stdout.take());
        let stderr_rx = spawn_reader(child.stderr.take());

        let started = Instant::now();
        let deadline = started + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(QueryError::Io { command, source });
                }
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                warn!(%command, "query timed out");
                return Err(QueryError::Timeout {
                    command,
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        // A background process that inherited the pipes can keep them open after kubectl
        // exits, so collecting output is bounded by the same deadline.
        let (Some(stdout), Some(stderr)) = (
            collect_until(&stdout_rx, deadline),
            collect_until(&stderr_rx, deadline),
        ) else {
            warn!(%command, "query output still open at deadline");
            return Err(QueryError::Timeout {
                command,
                timeout: self.timeout,
            });
        };
        debug!(
            %command,
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = stdout.len(),
            "query finished"
        );

        if !status.success() {
            let stderr = stderr.trim().to_string();
            if UNREACHABLE_MARKERS.iter().any(|m| stderr.contains(m)) {
                return Err(QueryError::Unreachable { stderr });
            }
            return Err(QueryError::Exit {
                command,
                status: status.to_string(),
                stderr,
            });
        }

        Ok(RawOutput { stdout, stderr })
    }
}

impl QueryRunner for KubectlRunner {
    fn invoke(&self, spec: &QuerySpec) -> Result<RawOutput, QueryError> {
        self.run(&self.argv(spec))
    }

    fn describe(&self, spec: &QuerySpec) -> String {
        display_command(&self.program, &self.argv(spec))
    }
}

/// `kubectl` arguments for a query, without global connection flags.
pub fn kubectl_args(spec: &QuerySpec) -> Vec<String> {
    let mut args = vec!["get".to_string(), spec.resource.clone()];
    if spec.all_namespaces {
        args.push("--all-namespaces".to_string());
    }
    match &spec.output {
        OutputShape::Columns(columns) => {
            let cols: Vec<String> = columns.iter().map(|c| format!(":{c}")).collect();
            args.push(format!("-o=custom-columns={}", cols.join(",")));
            args.push("--no-headers".to_string());
        }
        OutputShape::Json => {
            args.push("-o".to_string());
            args.push("json".to_string());
        }
    }
    args
}

/// Read a pipe to EOF on its own thread; the buffer arrives on the returned channel.
fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// `None` when the reader has not finished by `deadline`.
fn collect_until(rx: &Receiver<String>, deadline: Instant) -> Option<String> {
    rx.recv_timeout(deadline.saturating_duration_since(Instant::now())).ok()
}

fn display_command(program: &str, args: &[String]) -> String {
    let mut out = program.to_string();
    for arg in args {
        out.push(' ');
        out.push_str(arg);
    }
    out
}
