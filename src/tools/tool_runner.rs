use crate::error::MediaError;
use log::{debug, warn};
use std::ffi::OsStr;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// 外部工具預設時限
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(600);

/// 檢查子程序狀態的間隔
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 錯誤訊息只保留 stderr 最後幾行
const STDERR_TAIL_LINES: usize = 3;

const SPAWN_RETRIES: u32 = 5;

/// 外部工具設定：執行檔路徑、時限與取消訊號
#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub timeout: Duration,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            timeout: DEFAULT_TOOL_TIMEOUT,
            cancel: None,
        }
    }
}

impl ToolConfig {
    #[must_use]
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            timeout,
            cancel: None,
        }
    }

    /// 收到中斷訊號時終止正在執行的子程序
    #[must_use]
    pub fn with_cancel(mut self, signal: Arc<AtomicBool>) -> Self {
        self.cancel = Some(signal);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|signal| signal.load(Ordering::SeqCst))
    }
}

/// 已結束程序的輸出
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

pub fn run_ffmpeg<I, S>(tools: &ToolConfig, args: I) -> Result<ToolOutput, MediaError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_tool(tools, &tools.ffmpeg, args)
}

pub fn run_ffprobe<I, S>(tools: &ToolConfig, args: I) -> Result<ToolOutput, MediaError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_tool(tools, &tools.ffprobe, args)
}

/// 執行外部工具並等待結束
///
/// 超過 `tools.timeout` 或收到取消訊號時會 kill 子程序並回收，
/// 不會留下殭屍程序。
pub fn run_tool<I, S>(tools: &ToolConfig, program: &Path, args: I) -> Result<ToolOutput, MediaError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tool = tool_name(program);
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // 獨立程序群組，逾時時連同孫程序一起終止
        command.process_group(0);
    }

    debug!("執行 {tool}: {command:?}");

    let mut child = spawn_with_retry(&mut command).map_err(|e| {
        let detail = if e.kind() == ErrorKind::NotFound {
            format!("找不到執行檔 {}", program.display())
        } else {
            format!("無法啟動: {e}")
        };
        MediaError::tool_failed(&tool, None, detail)
    })?;

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    // 被終止時不等 reader：繼承 pipe 的程序可能仍在執行，
    // reader 執行緒會在 pipe 關閉後自行結束
    let status = match wait_with_deadline(&mut child, tools) {
        Ok(status) => status,
        Err(WaitError::TimedOut) => {
            warn!("{tool} 超過時限 {:?}，已終止", tools.timeout);
            return Err(MediaError::Timeout {
                tool,
                after: tools.timeout,
            });
        }
        Err(WaitError::Cancelled) => {
            warn!("{tool} 因中斷訊號被終止");
            return Err(MediaError::Cancelled);
        }
        Err(WaitError::Io(e)) => return Err(MediaError::Io(e)),
    };

    let stdout = join_reader(stdout_reader);
    let stderr = String::from_utf8_lossy(&join_reader(stderr_reader)).into_owned();

    if !status.success() {
        return Err(MediaError::tool_failed(
            &tool,
            status.code(),
            format!("exit {}: {}", describe_status(status), stderr_tail(&stderr)),
        ));
    }

    Ok(ToolOutput { stdout, stderr })
}

/// 執行檔剛被寫入時可能暫時回傳 ETXTBSY，稍候重試
fn spawn_with_retry(command: &mut Command) -> std::io::Result<Child> {
    let mut attempts = 0;
    loop {
        match command.spawn() {
            Err(e) if e.kind() == ErrorKind::ExecutableFileBusy && attempts < SPAWN_RETRIES => {
                attempts += 1;
                thread::sleep(POLL_INTERVAL);
            }
            result => return result,
        }
    }
}

enum WaitError {
    TimedOut,
    Cancelled,
    Io(std::io::Error),
}

fn wait_with_deadline(child: &mut Child, tools: &ToolConfig) -> Result<ExitStatus, WaitError> {
    let deadline = Instant::now() + tools.timeout;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(e) => {
                kill_and_reap(child);
                return Err(WaitError::Io(e));
            }
        }

        if tools.is_cancelled() {
            kill_and_reap(child);
            return Err(WaitError::Cancelled);
        }

        if Instant::now() >= deadline {
            kill_and_reap(child);
            return Err(WaitError::TimedOut);
        }

        thread::sleep(POLL_INTERVAL);
    }
}

fn kill_and_reap(child: &mut Child) {
    #[cfg(unix)]
    kill_process_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_process_group(child: &Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(pid) = i32::try_from(child.id()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        debug!("無法終止程序群組 {pid}: {e}");
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    stream.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map_or_else(|| program.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn describe_status(status: ExitStatus) -> String {
    status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string())
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr = "a\nb\n\nc\nd\n";
        assert_eq!(stderr_tail(stderr), "b; c; d");
    }

    #[test]
    fn test_tool_name_uses_file_name() {
        assert_eq!(tool_name(Path::new("/usr/bin/ffprobe")), "ffprobe");
        assert_eq!(tool_name(Path::new("ffmpeg")), "ffmpeg");
    }

    #[test]
    fn test_missing_binary_is_tool_invocation_error() {
        let tools = ToolConfig::new(
            "/nonexistent/ffmpeg-binary",
            "/nonexistent/ffprobe-binary",
            Duration::from_secs(5),
        );
        let err = run_ffmpeg(&tools, ["-version"]).unwrap_err();
        assert!(matches!(
            err,
            MediaError::ToolInvocation {
                exit_code: None,
                ..
            }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_reports_code_and_stderr() {
        let tools = ToolConfig::default();
        let err = run_tool(
            &tools,
            Path::new("sh"),
            ["-c", "echo broken header >&2; exit 3"],
        )
        .unwrap_err();
        match err {
            MediaError::ToolInvocation {
                exit_code, detail, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert!(detail.contains("broken header"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_deadline_kills_long_running_tool() {
        let tools = ToolConfig::new("ffmpeg", "ffprobe", Duration::from_millis(200));
        let started = Instant::now();
        let err = run_tool(&tools, Path::new("sleep"), ["5"]).unwrap_err();
        assert!(matches!(err, MediaError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_deadline_not_held_by_grandchild_on_pipes() {
        // sh 會 fork 出 sleep，sleep 繼承 stdout/stderr
        let tools = ToolConfig::new("ffmpeg", "ffprobe", Duration::from_millis(200));
        let started = Instant::now();
        let err = run_tool(&tools, Path::new("sh"), ["-c", "sleep 3; true"]).unwrap_err();
        match err {
            MediaError::Timeout { after, .. } => assert_eq!(after, Duration::from_millis(200)),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_signal_stops_tool() {
        let signal = Arc::new(AtomicBool::new(true));
        let tools = ToolConfig::default().with_cancel(signal);
        let err = run_tool(&tools, Path::new("sleep"), ["5"]).unwrap_err();
        assert!(matches!(err, MediaError::Cancelled));
    }

    #[cfg(unix)]
    #[test]
    fn test_stdout_is_captured() {
        let tools = ToolConfig::default();
        let output = run_tool(&tools, Path::new("sh"), ["-c", "printf hello"]).unwrap();
        assert_eq!(output.stdout, b"hello");
    }
}
