// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Running local command-line tools (whois, exiftool)

use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Why a tool produced no output
#[derive(Debug)]
pub enum ToolFailure {
    /// Executable not found in PATH
    NotFound,
    TimedOut(Duration),
    Io(io::Error),
}

/// Run a tool and capture stdout followed by stderr
///
/// The exit status is ignored: whois in particular exits non-zero on
/// perfectly useful output.
pub async fn capture(program: &str, args: &[&str], timeout: Duration) -> Result<String, ToolFailure> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Running {} {:?}", program, args);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Err(_) => return Err(ToolFailure::TimedOut(timeout)),
        Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => return Err(ToolFailure::NotFound),
        Ok(Err(e)) => return Err(ToolFailure::Io(e)),
        Ok(Ok(output)) => output,
    };

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stderr);
    }

    debug!("{} exited with {:?}", program, output.status.code());
    Ok(text.trim_end().to_string())
}

/// Keep user input from being parsed as an option
pub fn guard_operand(operand: &str) -> String {
    if operand.starts_with('-') {
        format!("./{}", operand)
    } else {
        operand.to_string()
    }
}
