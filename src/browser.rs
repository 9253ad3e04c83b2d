// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Opening URLs in the system browser

use tracing::debug;

/// Open a URL with `opener`, or the platform's default browser when unset
pub fn open_url(opener: Option<&str>, url: &str) -> std::io::Result<()> {
    match opener {
        Some(program) => {
            debug!("Opening {} with {}", url, program);
            std::process::Command::new(program).arg(url).spawn()?;
            Ok(())
        }
        None => open_browser(url),
    }
}

/// Hand a URL to the platform's default browser
pub fn open_browser(url: &str) -> std::io::Result<()> {
    debug!("Opening browser at {}", url);

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()?;
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", "", url])
            .spawn()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_opener_is_an_error() {
        let err = open_url(Some("wicosintx-no-browser"), "https://example.com/").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
