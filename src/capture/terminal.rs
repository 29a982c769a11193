// 终端截图辅助 - 推断项目入口命令，无法运行时生成演示文本

use crate::models::ProjectProfile;
use std::path::Path;
use tracing::debug;

/// 入口脚本候选，按顺序检查
pub const ENTRY_CANDIDATES: [&str; 7] = [
    "main.py",
    "app.py",
    "run.py",
    "analyze.py",
    "pipeline.py",
    "etl.py",
    "script.py",
];

/// 根据项目结构推断可运行的命令
pub fn infer_terminal_command(project_path: &Path) -> Option<String> {
    if let Some(entry) = ENTRY_CANDIDATES
        .iter()
        .find(|name| project_path.join(name).exists())
    {
        return Some(format!("python {}", entry));
    }

    if project_path.join("Makefile").exists() {
        return Some("make run".to_string());
    }

    let pkg_path = project_path.join("package.json");
    if pkg_path.exists() {
        match std::fs::read_to_string(&pkg_path)
            .ok()
            .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok())
        {
            Some(pkg) if pkg.pointer("/scripts/start").is_some() => {
                return Some("npm start".to_string());
            }
            Some(_) => {}
            None => debug!("package.json 无法解析: {:?}", pkg_path),
        }
    }

    None
}

/// 没有可运行命令时，用项目信息拼出终端画面
pub fn generate_demo_text(profile: &ProjectProfile) -> String {
    let rule = "─".repeat(33);
    let impact = if profile.impact.trim().is_empty() {
        "Analysis complete."
    } else {
        profile.impact.as_str()
    };

    format!(
        "$ {name}\n{rule}\nProject: {name}\nStack: {stack}\n{rule}\n\n{impact}\n\n✅ Done",
        name = profile.name,
        stack = profile.tech_stack.join(", "),
    )
}
