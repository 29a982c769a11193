// Chrome 辅助模块 - 查找可用于无头截图的 Chrome/Chromium

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 各平台常见安装路径
fn common_paths() -> Vec<&'static str> {
    if cfg!(target_os = "macos") {
        vec![
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else if cfg!(target_os = "windows") {
        vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Microsoft\Edge\Application\msedge.exe",
        ]
    } else {
        vec![
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ]
    }
}

/// PATH 中查找的可执行文件名
const PATH_CANDIDATES: [&str; 3] = ["chromium", "chromium-browser", "google-chrome"];

/// 执行 `--version` 验证可用性
fn verify(path: &Path) -> bool {
    let mut command = std::process::Command::new(path);
    command.arg("--version");

    // Windows下隐藏控制台窗口
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        command.creation_flags(CREATE_NO_WINDOW);
    }

    match command.output() {
        Ok(output) if output.status.success() => {
            debug!(
                "Chrome 版本: {}",
                String::from_utf8_lossy(&output.stdout).trim()
            );
            true
        }
        _ => false,
    }
}

/// 获取 Chrome 可执行文件路径
pub fn find_chrome_path() -> Result<PathBuf> {
    for path_str in common_paths() {
        let path = PathBuf::from(path_str);
        if path.exists() && verify(&path) {
            info!("使用 Chrome: {:?}", path);
            return Ok(path);
        }
    }

    for name in PATH_CANDIDATES {
        let path = PathBuf::from(name);
        if verify(&path) {
            info!("使用 PATH 中的 {}", name);
            return Ok(path);
        }
    }

    Err(anyhow!(
        "未找到 Chrome/Chromium，请安装 Google Chrome 或在配置中指定 chrome_path"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_paths_are_absolute() {
        for p in common_paths() {
            assert!(Path::new(p).is_absolute() || cfg!(target_os = "windows"));
        }
    }

    #[test]
    fn test_missing_binary_fails_verification() {
        assert!(!verify(Path::new("/definitely/not/a/chrome")));
    }
}
