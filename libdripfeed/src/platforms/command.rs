//! Publishing through an external program
//!
//! The platform client itself stays outside this crate. Each attempt runs
//! the configured program once with the text on stdin and the four API
//! credentials in its environment. The exit status classifies the outcome:
//!
//! | Exit status | Outcome |
//! |---|---|
//! | 0 | published, stdout (trimmed) is the post ID |
//! | 75 (`EX_TEMPFAIL`) | transient, retried |
//! | 77 (`EX_NOPERM`) | authentication failure, fatal |
//! | killed by a signal | transient, retried |
//! | anything else | rejected, fatal |
//!
//! A run that outlives the configured timeout is killed and counted as
//! transient.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::PublishSink;
use crate::credentials::Credentials;
use crate::error::PlatformError;

/// sysexits.h: temporary failure, the caller is invited to retry
pub const EXIT_TEMPFAIL: i32 = 75;

/// sysexits.h: permission denied
pub const EXIT_NOPERM: i32 = 77;

pub struct CommandSink {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    credentials: Credentials,
}

impl CommandSink {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        timeout: Duration,
        credentials: Credentials,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            credentials,
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (name, value) in self.credentials.env_pairs() {
            command.env(name, value);
        }

        command
    }
}

/// Map a finished process to the sink's three-way outcome
fn classify(status: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Result<String, PlatformError> {
    let stderr = String::from_utf8_lossy(stderr).trim().to_string();
    let reason = |fallback: String| if stderr.is_empty() { fallback } else { stderr.clone() };

    match status {
        Some(0) => Ok(String::from_utf8_lossy(stdout).trim().to_string()),
        Some(EXIT_TEMPFAIL) => Err(PlatformError::Network(reason(format!(
            "exit status {}",
            EXIT_TEMPFAIL
        )))),
        Some(EXIT_NOPERM) => Err(PlatformError::Authentication(reason(format!(
            "exit status {}",
            EXIT_NOPERM
        )))),
        Some(code) => Err(PlatformError::Rejected(reason(format!("exit status {}", code)))),
        None => Err(PlatformError::Network(reason(
            "terminated by signal".to_string(),
        ))),
    }
}

#[async_trait]
impl PublishSink for CommandSink {
    async fn publish(&self, text: &str) -> Result<String, PlatformError> {
        let mut child = self.command().spawn().map_err(|e| {
            PlatformError::Posting(format!("failed to start '{}': {}", self.program, e))
        })?;

        let stdin = child.stdin.take();
        let program = self.program.as_str();

        // Writing stdin shares the timeout with the wait.
        let exchange = async move {
            if let Some(mut stdin) = stdin {
                // The program may exit without reading; its status decides.
                if let Err(e) = stdin.write_all(text.as_bytes()).await {
                    tracing::debug!("Could not write text to '{}': {}", program, e);
                }
            }
            child.wait_with_output().await
        };

        let output = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(PlatformError::Network(format!(
                    "failed to wait for '{}': {}",
                    self.program, e
                )))
            }
            Err(_) => {
                return Err(PlatformError::Timeout(format!(
                    "'{}' did not finish within {}",
                    self.program,
                    humantime::format_duration(self.timeout)
                )))
            }
        };

        classify(output.status.code(), &output.stdout, &output.stderr)
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credentials() -> Credentials {
        Credentials::from_lookup(|name| Some(format!("{}-value", name.to_lowercase()))).unwrap()
    }

    #[test]
    fn test_classify_success_trims_id() {
        assert_eq!(classify(Some(0), b"  12345\n", b""), Ok("12345".to_string()));
    }

    #[test]
    fn test_classify_tempfail_is_transient() {
        let err = classify(Some(75), b"", b"rate limited\n").unwrap_err();
        assert_eq!(err, PlatformError::Network("rate limited".to_string()));
        assert!(err.is_transient());
    }

    #[test]
    fn test_classify_noperm_is_authentication() {
        let err = classify(Some(77), b"", b"").unwrap_err();
        assert_eq!(err, PlatformError::Authentication("exit status 77".to_string()));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_classify_other_status_is_rejected() {
        let err = classify(Some(1), b"", b"duplicate content").unwrap_err();
        assert_eq!(err, PlatformError::Rejected("duplicate content".to_string()));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_classify_signal_is_transient() {
        assert!(classify(None, b"", b"").unwrap_err().is_transient());
    }

    #[cfg(unix)]
    fn shell(script: &str, timeout: Duration) -> CommandSink {
        CommandSink::new(
            "sh",
            vec!["-c".to_string(), script.to_string()],
            timeout,
            test_credentials(),
        )
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_text_on_stdin_and_credentials_in_env() {
        let sink = shell(
            r#"read -r line; printf '%s|%s|%s' "$line" "$API_KEY" "$ACCESS_SECRET""#,
            Duration::from_secs(10),
        );

        let id = sink.publish("hello world").await.unwrap();
        assert_eq!(id, "hello world|api_key-value|access_secret-value");
        assert_eq!(sink.name(), "sh");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tempfail_exit_is_transient() {
        let sink = shell("cat >/dev/null; echo 'try later' >&2; exit 75", Duration::from_secs(10));

        let err = sink.publish("hello").await.unwrap_err();
        assert_eq!(err, PlatformError::Network("try later".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_covers_unread_stdin() {
        let sink = shell("sleep 5", Duration::from_millis(200));
        let text = "x".repeat(1 << 20);

        let started = std::time::Instant::now();
        let err = sink.publish(&text).await.unwrap_err();

        assert!(matches!(err, PlatformError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_transient() {
        let sink = shell("sleep 5", Duration::from_millis(100));

        let err = sink.publish("hello").await.unwrap_err();
        assert!(matches!(err, PlatformError::Timeout(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_missing_program_is_fatal() {
        let sink = CommandSink::new(
            "/nonexistent/dripfeed-publisher",
            vec![],
            Duration::from_secs(1),
            test_credentials(),
        );

        let err = sink.publish("hello").await.unwrap_err();
        assert!(matches!(err, PlatformError::Posting(_)));
        assert!(!err.is_transient());
        assert!(err.to_string().contains("failed to start"));
    }
}
