//! Optional post-generation validation of emitted target-language source.
//! Behind a runtime trait rather than a `cfg` so tests can swap in a no-op
//! without a toolchain installed; unavailability of the real toolchain is
//! treated identically to a reviewer declining to check — silent, not an
//! error.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use log::warn;

/// Runs an external syntax checker over generated source and reports
/// whether it's well-formed. `Ok(None)` means the checker was unavailable
/// (binary not found) and nothing was checked.
pub trait SyntaxChecker {
    fn check(&self, source: &str) -> Option<Result<(), String>>;
}

/// Never invokes anything; always reports "unavailable". The default for
/// `CompileOptions`.
pub struct NullSyntaxChecker;

impl SyntaxChecker for NullSyntaxChecker {
    fn check(&self, _source: &str) -> Option<Result<(), String>> {
        None
    }
}

/// Shells out to a real toolchain binary, honoring a wall-clock timeout.
/// Writes `source` to the checker's stdin.
pub struct ProcessSyntaxChecker {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ProcessSyntaxChecker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: Duration::from_secs(10),
        }
    }
}

impl SyntaxChecker for ProcessSyntaxChecker {
    fn check(&self, source: &str) -> Option<Result<(), String>> {
        let mut child = match Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!("syntax checker `{}` unavailable: {}", self.program, e);
                return None;
            }
        };

        if let Some(stdin) = child.stdin.as_mut() {
            let _ = stdin.write_all(source.as_bytes());
        }

        match wait_with_timeout(child, self.timeout) {
            Some(output) if output.status.success() => Some(Ok(())),
            Some(output) => Some(Err(String::from_utf8_lossy(&output.stderr).into_owned())),
            None => {
                warn!("syntax checker `{}` timed out after {:?}", self.program, self.timeout);
                None
            }
        }
    }
}

fn wait_with_timeout(
    mut child: std::process::Child,
    timeout: Duration,
) -> Option<std::process::Output> {
    let start = std::time::Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return child.wait_with_output().ok(),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    return None;
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(_) => return None,
        }
    }
}
