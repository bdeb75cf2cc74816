use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{AgentEvent, AgentEventStream, AgentRequest, Collaborator};
use crate::config::Config;
use crate::stream::{judge_result, parse_stream_line};

/// Runs the configured agent CLI as a child process.
///
/// The prompt is written to stdin and stdout is read as `stream-json`. The
/// final `result` only passes the gate when it carries `VERDICT: PASS`.
/// When a timeout is configured it runs from spawn: the child is killed once
/// it expires, even mid-prompt, and the stream ends with a `Failure`.
pub struct ProcessCollaborator {
    config: Config,
}

impl ProcessCollaborator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Collaborator for ProcessCollaborator {
    async fn invoke(&self, request: AgentRequest) -> Result<AgentEventStream> {
        let flags = self.config.agent_flags(&request.settings);
        info!(
            gate = %request.gate,
            role = %request.role,
            cmd = %self.config.agent_cmd,
            prompt_chars = request.prompt.len(),
            "Spawning agent"
        );

        let mut child = Command::new(&self.config.agent_cmd)
            .args(&flags)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .current_dir(&self.config.project_dir)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn agent '{}'", self.config.agent_cmd))?;

        debug!(pid = child.id().unwrap_or(0), "Agent process spawned");

        let timeout = self.config.agent_timeout;
        let deadline = timeout.map(|t| Instant::now() + t);

        if let Some(stdin) = child.stdin.take() {
            let write = write_prompt(stdin, &request.prompt);
            let written = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, write).await.ok(),
                None => Some(write.await),
            };
            match written {
                Some(result) => result?,
                None => {
                    let event = kill_timed_out(&mut child, timeout).await;
                    return Ok(Box::pin(futures::stream::iter([event])));
                }
            }
        }

        let stdout = child.stdout.take().context("Failed to get agent stdout")?;
        let state = ProcessState {
            lines: BufReader::new(stdout).lines(),
            child,
            timeout,
            deadline,
            transcript: String::new(),
        };

        Ok(Box::pin(futures::stream::unfold(Some(state), next_event)))
    }
}

async fn write_prompt(mut stdin: ChildStdin, prompt: &str) -> Result<()> {
    stdin
        .write_all(prompt.as_bytes())
        .await
        .context("Failed to write prompt to agent stdin")?;
    stdin.shutdown().await.context("Failed to close stdin")?;
    Ok(())
}

/// Kill an agent that ran past its deadline and describe why.
async fn kill_timed_out(child: &mut Child, timeout: Option<Duration>) -> AgentEvent {
    let secs = timeout.map(|t| t.as_secs()).unwrap_or_default();
    warn!(timeout_secs = secs, "Agent timed out; killing process");
    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill timed-out agent");
    }
    AgentEvent::Failure(format!("agent timed out after {}s", secs))
}

/// Internal state for the agent output stream.
struct ProcessState {
    lines: Lines<BufReader<ChildStdout>>,
    child: Child,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    /// Assistant text seen so far, judged when the result text is empty
    transcript: String,
}

/// Produce the next event; `None` state marks a finished stream.
async fn next_event(state: Option<ProcessState>) -> Option<(AgentEvent, Option<ProcessState>)> {
    let mut state = state?;

    loop {
        let line = match state.deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, state.lines.next_line()).await {
                    Ok(line) => line,
                    Err(_) => {
                        let event = kill_timed_out(&mut state.child, state.timeout).await;
                        return Some((event, None));
                    }
                }
            }
            None => state.lines.next_line().await,
        };

        match line {
            Ok(Some(line)) => match parse_stream_line(&line) {
                Some(AgentEvent::Chunk(text)) => {
                    state.transcript.push_str(&text);
                    return Some((AgentEvent::Chunk(text), Some(state)));
                }
                Some(AgentEvent::Result(text)) => {
                    let answer = if text.trim().is_empty() {
                        &state.transcript
                    } else {
                        &text
                    };
                    let event = judge_result(answer);
                    if let AgentEvent::Failure(reason) = &event {
                        debug!(reason = %reason, "Agent verdict is not a pass");
                    }
                    return Some((event, None));
                }
                Some(event) => return Some((event, None)),
                None => {}
            },
            Ok(None) => {
                // stdout closed: reap the child and report abnormal exits.
                return match state.child.wait().await {
                    Ok(status) if status.success() => {
                        debug!("Agent exited cleanly");
                        None
                    }
                    Ok(status) => Some((
                        AgentEvent::Failure(format!("agent exited with {}", status)),
                        None,
                    )),
                    Err(e) => Some((
                        AgentEvent::Failure(format!("failed to wait for agent: {}", e)),
                        None,
                    )),
                };
            }
            Err(e) => {
                return Some((
                    AgentEvent::Failure(format!("failed to read agent output: {}", e)),
                    None,
                ));
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::gate_config::RoleSettings;
    use crate::gates::{AgentRole, Gate};
    use futures::StreamExt;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::tempdir;

    fn fake_agent(dir: &Path, body: &str) -> Config {
        agent_script(dir, &format!("cat > /dev/null\n{}", body))
    }

    /// Install `body` as the agent without draining stdin first.
    fn agent_script(dir: &Path, body: &str) -> Config {
        let script = dir.join("fake-agent.sh");
        fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let gk = dir.join(".gatekeeper");
        fs::create_dir_all(&gk).unwrap();
        fs::write(
            gk.join("gatekeeper.toml"),
            format!(
                "[agent]\ncmd = \"{}\"\ntimeout_secs = 5\n",
                script.display()
            ),
        )
        .unwrap();
        Config::new(dir.to_path_buf(), false, None).unwrap()
    }

    fn request() -> AgentRequest {
        AgentRequest {
            gate: Gate::Gate3,
            role: AgentRole::Qa,
            settings: RoleSettings::default(),
            prompt: "verify".to_string(),
        }
    }

    async fn collect(config: Config) -> Vec<AgentEvent> {
        collect_request(config, request()).await
    }

    async fn collect_request(config: Config, request: AgentRequest) -> Vec<AgentEvent> {
        let collaborator = ProcessCollaborator::new(config);
        let stream = collaborator.invoke(request).await.unwrap();
        stream.collect().await
    }

    #[tokio::test]
    async fn test_stream_json_result() {
        let dir = tempdir().unwrap();
        let config = fake_agent(
            dir.path(),
            r#"echo '{"type":"assistant","message":{"content":[{"type":"text","text":"looking"}]}}'
echo '{"type":"result","subtype":"success","result":"VERDICT: PASS","is_error":false}'"#,
        );
        let events = collect(config).await;
        assert_eq!(
            events,
            vec![
                AgentEvent::Chunk("looking\n".to_string()),
                AgentEvent::Result("VERDICT: PASS".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_failure() {
        let dir = tempdir().unwrap();
        let config = fake_agent(dir.path(), "echo partial\nexit 3");
        let events = collect(config).await;
        assert_eq!(events[0], AgentEvent::Chunk("partial".to_string()));
        match events.last() {
            Some(AgentEvent::Failure(msg)) => assert!(msg.contains("exited")),
            other => panic!("Expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clean_exit_without_result_ends_stream() {
        let dir = tempdir().unwrap();
        let config = fake_agent(dir.path(), "echo thinking");
        let events = collect(config).await;
        assert_eq!(events, vec![AgentEvent::Chunk("thinking".to_string())]);
    }

    #[tokio::test]
    async fn test_timeout_kills_agent() {
        let dir = tempdir().unwrap();
        let mut config = fake_agent(dir.path(), "exec sleep 30");
        config.agent_timeout = Some(Duration::from_millis(200));
        let events = collect(config).await;
        match events.as_slice() {
            [AgentEvent::Failure(msg)] => assert!(msg.contains("timed out")),
            other => panic!("Expected single timeout failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_command_is_invoke_error() {
        let dir = tempdir().unwrap();
        let mut config = fake_agent(dir.path(), "true");
        config.agent_cmd = dir.path().join("no-such-agent").display().to_string();
        let collaborator = ProcessCollaborator::new(config);
        assert!(collaborator.invoke(request()).await.is_err());
    }

    #[tokio::test]
    async fn test_fail_verdict_is_failure() {
        let dir = tempdir().unwrap();
        let config = fake_agent(
            dir.path(),
            r#"echo '{"type":"result","subtype":"success","result":"VERDICT: FAIL - AC-1 not implemented","is_error":false}'"#,
        );
        let events = collect(config).await;
        assert_eq!(
            events,
            vec![AgentEvent::Failure(
                "VERDICT: FAIL - AC-1 not implemented".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_result_without_verdict_is_failure() {
        let dir = tempdir().unwrap();
        let config = fake_agent(
            dir.path(),
            r#"echo '{"type":"result","subtype":"success","result":"Looks good to me.","is_error":false}'"#,
        );
        match collect(config).await.as_slice() {
            [AgentEvent::Failure(reason)] => assert!(reason.contains("without a verdict")),
            other => panic!("Expected single failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_result_is_judged_on_transcript() {
        let dir = tempdir().unwrap();
        let config = fake_agent(
            dir.path(),
            r#"echo '{"type":"assistant","message":{"content":[{"type":"text","text":"VERDICT: PASS"}]}}'
echo '{"type":"result","subtype":"success","result":"","is_error":false}'"#,
        );
        let events = collect(config).await;
        assert_eq!(events.last(), Some(&AgentEvent::Result("VERDICT: PASS".to_string())));
    }

    #[tokio::test]
    async fn test_timeout_covers_prompt_write() {
        let dir = tempdir().unwrap();
        // Never reads stdin, so a large prompt fills the pipe and blocks.
        let mut config = agent_script(dir.path(), "exec sleep 30");
        config.agent_timeout = Some(Duration::from_millis(300));
        let mut big = request();
        big.prompt = "x".repeat(1 << 20);

        let started = std::time::Instant::now();
        let events = collect_request(config, big).await;
        assert!(started.elapsed() < Duration::from_secs(10));
        match events.as_slice() {
            [AgentEvent::Failure(msg)] => assert!(msg.contains("timed out")),
            other => panic!("Expected single timeout failure, got {other:?}"),
        }
    }
}
