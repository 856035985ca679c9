//! Helpers for running the desktop's command-line tools

use tokio::process::Command;
use tracing::{debug, info, warn};

/// Run a tool to completion and return its stdout
pub async fn run_command(program: &str, args: &[&str]) -> Result<String, String> {
    debug!("Running {} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| format!("Failed to execute {}: {}", program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{} failed: {}", program, stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a tool in the background; failures are logged and dropped.
/// Without a runtime the call is a no-op.
pub fn spawn_detached(program: &'static str, args: Vec<String>) {
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(runtime) => runtime,
        Err(_) => {
            warn!("No runtime available to run {}", program);
            return;
        }
    };

    runtime.spawn(async move {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        if let Err(e) = run_command(program, &args).await {
            warn!("{}", e);
        }
    });
}

/// Check that a tool can be launched at all
pub async fn check_tool_available(program: &str, probe_arg: &str) -> Result<(), String> {
    Command::new(program)
        .arg(probe_arg)
        .output()
        .await
        .map_err(|_| format!("{} is not available", program))?;

    info!("{} is available", program);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_tool_reports_an_error() {
        let result = run_command("break-reminder-no-such-tool", &[]).await;
        assert!(result.unwrap_err().contains("Failed to execute"));
        assert!(check_tool_available("break-reminder-no-such-tool", "--version").await.is_err());
    }
}
