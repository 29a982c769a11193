// 框架检测 - 扫描项目目录，判断能否以及如何启动本地 Web 应用

use crate::models::FrameworkDescriptor;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 一个 Web 框架的识别特征
pub struct FrameworkSignature {
    pub name: &'static str,
    /// 可能的入口文件
    pub file_patterns: &'static [&'static str],
    /// 源码特征
    pub code_patterns: Vec<Regex>,
    /// 依赖清单中的包名
    pub requirements_patterns: &'static [&'static str],
    pub port: u16,
    /// 启动命令模板，支持 {file} 与 {port}
    pub launch_cmd: &'static str,
    pub wait_seconds: u64,
}

impl FrameworkSignature {
    fn matches_code(&self, content: &str) -> bool {
        self.code_patterns.iter().any(|re| re.is_match(content))
    }

    fn describe(&self, entry_file: PathBuf) -> FrameworkDescriptor {
        let launch_command = self
            .launch_cmd
            .replace("{file}", &entry_file.to_string_lossy())
            .replace("{port}", &self.port.to_string());
        FrameworkDescriptor {
            framework: self.name.to_string(),
            entry_file,
            port: self.port,
            launch_command,
            startup_grace: self.wait_seconds,
        }
    }
}

fn patterns(raw: &[&str]) -> Vec<Regex> {
    raw.iter()
        .map(|p| Regex::new(p).expect("静态正则必须合法"))
        .collect()
}

/// 按匹配顺序排列的框架特征表
pub static FRAMEWORK_SIGNATURES: Lazy<Vec<FrameworkSignature>> = Lazy::new(|| {
    vec![
        FrameworkSignature {
            name: "streamlit",
            file_patterns: &["app.py", "main.py", "dashboard.py", "streamlit_app.py"],
            code_patterns: patterns(&[r"import\s+streamlit", r"st\.", r"streamlit"]),
            requirements_patterns: &["streamlit"],
            port: 8501,
            launch_cmd: "streamlit run {file} --server.headless true --server.port {port}",
            wait_seconds: 5,
        },
        FrameworkSignature {
            name: "react",
            file_patterns: &["package.json"],
            code_patterns: patterns(&[r#""react""#, r#""next""#, r#""vite""#]),
            requirements_patterns: &[],
            port: 3000,
            launch_cmd: "npm start",
            wait_seconds: 10,
        },
        FrameworkSignature {
            name: "flask",
            file_patterns: &["app.py", "main.py", "server.py"],
            code_patterns: patterns(&[r"from\s+flask", r"import\s+flask", r"Flask\("]),
            requirements_patterns: &["flask"],
            port: 5000,
            launch_cmd: "python {file}",
            wait_seconds: 3,
        },
        FrameworkSignature {
            name: "gradio",
            file_patterns: &["app.py", "main.py", "demo.py"],
            code_patterns: patterns(&[r"import\s+gradio", r"gr\."]),
            requirements_patterns: &["gradio"],
            port: 7860,
            launch_cmd: "python {file}",
            wait_seconds: 5,
        },
        FrameworkSignature {
            name: "dash",
            file_patterns: &["app.py", "main.py", "dashboard.py"],
            code_patterns: patterns(&[r"import\s+dash", r"from\s+dash"]),
            requirements_patterns: &["dash"],
            port: 8050,
            launch_cmd: "python {file}",
            wait_seconds: 5,
        },
    ]
});

/// Python 依赖清单，按顺序取第一个存在的
const REQUIREMENT_FILES: [&str; 3] = ["requirements.txt", "pyproject.toml", "Pipfile"];

fn read_lossy(path: &Path) -> Option<String> {
    std::fs::read(path)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// 在候选入口文件中找第一个源码特征匹配的
fn find_entry_file(project: &Path, signature: &FrameworkSignature) -> Option<PathBuf> {
    signature
        .file_patterns
        .iter()
        .map(|name| project.join(name))
        .filter(|path| path.is_file())
        .find(|path| {
            read_lossy(path)
                .map(|content| signature.matches_code(&content))
                .unwrap_or(false)
        })
}

/// 检测项目使用的 Web 框架，未识别时返回 None
///
/// 依赖清单优先于入口文件本身，其次是 package.json（仅 react），
/// 最后直接检查候选源码文件
pub fn detect_framework(project_path: &Path) -> Option<FrameworkDescriptor> {
    let req_content = REQUIREMENT_FILES
        .iter()
        .map(|name| project_path.join(name))
        .find(|path| path.exists())
        .and_then(|path| read_lossy(&path))
        .unwrap_or_default()
        .to_lowercase();

    let pkg_path = project_path.join("package.json");
    let pkg_content = read_lossy(&pkg_path).unwrap_or_default();

    for signature in FRAMEWORK_SIGNATURES.iter() {
        if signature
            .requirements_patterns
            .iter()
            .any(|pat| req_content.contains(pat))
        {
            if let Some(entry) = find_entry_file(project_path, signature) {
                info!("依赖清单中检测到 {}: {:?}", signature.name, entry);
                return Some(signature.describe(entry));
            }
        }

        if signature.name == "react"
            && !pkg_content.is_empty()
            && signature.matches_code(&pkg_content)
        {
            info!("package.json 中检测到 {}", signature.name);
            return Some(signature.describe(pkg_path));
        }

        if let Some(entry) = find_entry_file(project_path, signature) {
            info!("源码中检测到 {}: {:?}", signature.name, entry);
            return Some(signature.describe(entry));
        }
    }

    debug!("未检测到 Web 框架: {:?}", project_path);
    None
}
