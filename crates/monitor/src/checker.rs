use anyhow::{Result, anyhow, bail};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Mechanism used to probe a single address
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Probe the address and return the round-trip latency in milliseconds.
    ///
    /// An `Err` means the address is unreachable. A reachable address whose
    /// latency could not be measured reports `0.0`.
    async fn check(&self, address: &str) -> Result<f64>;
}

/// ICMP echo checker backed by the platform `ping` utility
pub struct PingChecker {
    attempts: u32,
    reply_wait: Duration,
}

impl PingChecker {
    /// `attempts` echo requests are sent, each waiting up to `reply_wait`
    pub fn new(attempts: u32, reply_wait: Duration) -> Self {
        Self { attempts: attempts.max(1), reply_wait }
    }

    fn command(&self, address: &str) -> Command {
        let mut command = Command::new("ping");
        if cfg!(windows) {
            command
                .arg("-n")
                .arg(self.attempts.to_string())
                .arg("-w")
                .arg(self.reply_wait.as_millis().to_string());
        } else {
            command
                .arg("-c")
                .arg(self.attempts.to_string())
                .arg("-W")
                .arg(self.reply_wait.as_secs().max(1).to_string());
        }
        command.arg(address).stdin(Stdio::null()).stderr(Stdio::null()).kill_on_drop(true);
        command
    }
}

impl Default for PingChecker {
    fn default() -> Self {
        Self::new(2, Duration::from_secs(2))
    }
}

#[async_trait::async_trait]
impl Checker for PingChecker {
    async fn check(&self, address: &str) -> Result<f64> {
        ensure_safe_address(address)?;

        let output = self
            .command(address)
            .output()
            .await
            .map_err(|e| anyhow!("Failed to run ping: {}", e))?;

        if !output.status.success() {
            bail!("ping exited with {}", output.status);
        }

        let report = String::from_utf8_lossy(&output.stdout);
        Ok(parse_latency(&report).unwrap_or(0.0))
    }
}

/// Refuse addresses `ping` would read as options or several arguments
fn ensure_safe_address(address: &str) -> Result<()> {
    if address.is_empty() {
        bail!("Address cannot be empty");
    }
    if address.starts_with('-') {
        bail!("Address cannot start with '-': {}", address);
    }
    if address.chars().any(char::is_whitespace) {
        bail!("Address cannot contain whitespace: {}", address);
    }
    Ok(())
}

/// Extract the round-trip time from a `ping` report.
///
/// Understands the Unix `time=12.3 ms` reply lines and the Windows
/// `Average = 12ms` summary. The value is truncated to two fraction digits.
/// Anything else, `time<1 ms` included, is unparseable.
pub fn parse_latency(report: &str) -> Option<f64> {
    let marker = if cfg!(windows) { "Average = " } else { "time=" };
    parse_latency_after(report, marker)
}

fn parse_latency_after(report: &str, marker: &str) -> Option<f64> {
    let start = report.find(marker)? + marker.len();
    let value: String = report[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    truncate_fraction(&value).parse().ok()
}

fn truncate_fraction(value: &str) -> &str {
    match value.find('.') {
        Some(dot) => &value[..value.len().min(dot + 3)],
        None => value,
    }
}
