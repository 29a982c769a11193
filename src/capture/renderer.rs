// 终端渲染 - 把终端文本绘制成 Catppuccin Mocha 风格的窗口图片

use crate::error::{Error, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

#[async_trait]
pub trait TerminalRenderer: Send + Sync {
    /// 输出文件扩展名
    fn extension(&self) -> &str;

    async fn render(&self, text: &str, output: &Path, title: &str) -> Result<()>;
}

/// Catppuccin Mocha 调色板
pub mod palette {
    pub const BASE: &str = "#1e1e2e";
    pub const MANTLE: &str = "#181825";
    pub const SURFACE0: &str = "#313244";
    pub const TEXT: &str = "#cdd6f4";
    pub const RED: &str = "#f38ba8";
    pub const GREEN: &str = "#a6e3a1";
    pub const YELLOW: &str = "#f9e2af";
    pub const BLUE: &str = "#89b4fa";
    pub const PEACH: &str = "#fab387";
    pub const MAUVE: &str = "#cba6f7";
    pub const OVERLAY0: &str = "#6c7086";
}

const FONT_FAMILY: &str = "'JetBrains Mono', 'Fira Code', 'DejaVu Sans Mono', Consolas, monospace";
const LINE_HEIGHT: u32 = 24;
const PADDING_X: u32 = 28;
const PADDING_Y: u32 = 24;
const HEADER_HEIGHT: u32 = 44;
const IMG_PADDING: u32 = 24;
const CORNER_RADIUS: u32 = 12;

/// 超出行数时保留首尾各一半，中间插入省略提示
pub fn truncate_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() <= max_lines {
        return text.to_string();
    }

    let half = max_lines / 2;
    let omitted = format!("\n... ({} lines omitted) ...\n", lines.len() - max_lines);
    let mut kept: Vec<&str> = lines[..half].to_vec();
    kept.push(omitted.as_str());
    kept.extend_from_slice(&lines[lines.len() - half..]);
    kept.join("\n")
}

/// 按行内容决定颜色与是否加粗
pub fn line_style(line: &str) -> (&'static str, bool) {
    let lower = line.to_lowercase();

    if line.starts_with("$ ") {
        (palette::GREEN, true)
    } else if starts_with_any(line, &["✅", "✓", "⭐"])
        || lower.contains("complete")
        || lower.contains("success")
    {
        (palette::GREEN, false)
    } else if starts_with_any(line, &["❌", "✗", "⛔"]) || lower.contains("error") || lower.contains("fail")
    {
        (palette::RED, false)
    } else if starts_with_any(line, &["⚠", "⚡"]) || lower.contains("warning") {
        (palette::YELLOW, false)
    } else if starts_with_any(line, &["ℹ", "📊", "📈", "📉", "🔍"]) || line.starts_with("INFO") {
        (palette::BLUE, false)
    } else if line.starts_with('#') || is_rule(line) {
        (palette::OVERLAY0, false)
    } else {
        (palette::TEXT, false)
    }
}

/// 金额、百分比、千分位数字
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$[\d,]+\.?\d*|₩[\d,]+|[\d,]+\.?\d*%|\b\d{1,3}(?:,\d{3})+\b")
        .expect("静态正则必须合法")
});

static PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:/[\w.-]+)+").expect("静态正则必须合法"));

/// 普通行按片段着色：数值用 PEACH，文件路径用 MAUVE
pub fn highlight_segments(line: &str) -> Vec<(&str, Option<&'static str>)> {
    let mut segments = Vec::new();
    let mut last = 0;
    for m in NUMBER_RE.find_iter(line) {
        push_path_segments(&line[last..m.start()], &mut segments);
        segments.push((m.as_str(), Some(palette::PEACH)));
        last = m.end();
    }
    push_path_segments(&line[last..], &mut segments);
    segments
}

fn push_path_segments<'a>(text: &'a str, segments: &mut Vec<(&'a str, Option<&'static str>)>) {
    let mut last = 0;
    for m in PATH_RE.find_iter(text) {
        if m.start() > last {
            segments.push((&text[last..m.start()], None));
        }
        segments.push((m.as_str(), Some(palette::MAUVE)));
        last = m.end();
    }
    if last < text.len() {
        segments.push((&text[last..], None));
    }
}

/// 单行的 SVG 文本内容
fn line_markup(line: &str, color: &str) -> String {
    if color != palette::TEXT {
        return escape_xml(line);
    }

    let mut markup = String::new();
    for (segment, highlight) in highlight_segments(line) {
        match highlight {
            Some(fill) => {
                let _ = write!(markup, r#"<tspan fill="{}">{}</tspan>"#, fill, escape_xml(segment));
            }
            None => markup.push_str(&escape_xml(segment)),
        }
    }
    markup
}

fn starts_with_any(line: &str, marks: &[&str]) -> bool {
    marks.iter().any(|m| line.starts_with(m))
}

fn is_rule(line: &str) -> bool {
    line.chars().take(3).filter(|c| matches!(c, '-' | '─' | '═')).count() == 3
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // XML 1.0 不允许的控制字符
            c if (c as u32) < 0x20 && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

/// 生成 SVG 终端窗口
pub struct SvgTerminalRenderer {
    max_lines: usize,
    width: u32,
}

impl SvgTerminalRenderer {
    pub fn new(max_lines: usize, width: u32) -> Self {
        Self { max_lines, width }
    }

    pub fn build_svg(&self, text: &str, title: &str) -> String {
        let text = truncate_lines(text, self.max_lines);
        let lines: Vec<&str> = text.split('\n').collect();

        let box_w = self.width;
        let content_h = lines.len() as u32 * LINE_HEIGHT + PADDING_Y * 2;
        let box_h = HEADER_HEIGHT + content_h;
        let img_w = box_w + IMG_PADDING * 2;
        let img_h = box_h + IMG_PADDING * 2;
        let (x, y) = (IMG_PADDING, IMG_PADDING);
        let dot_y = y + HEADER_HEIGHT / 2;

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{img_w}" height="{img_h}" viewBox="0 0 {img_w} {img_h}">"#
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="{}"/>"#, palette::MANTLE);
        let _ = writeln!(
            svg,
            r#"<rect x="{x}" y="{y}" width="{box_w}" height="{box_h}" rx="{CORNER_RADIUS}" fill="{}" stroke="{}"/>"#,
            palette::BASE,
            palette::SURFACE0
        );
        let _ = writeln!(
            svg,
            r#"<path d="M{x} {hy}H{xr}" stroke="{}"/>"#,
            palette::SURFACE0,
            hy = y + HEADER_HEIGHT,
            xr = x + box_w
        );

        for (i, color) in [palette::RED, palette::GREEN, palette::YELLOW].iter().enumerate() {
            let _ = writeln!(
                svg,
                r#"<circle cx="{}" cy="{dot_y}" r="6" fill="{color}"/>"#,
                x + 20 + i as u32 * 22
            );
        }

        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" fill="{}" font-family="{FONT_FAMILY}" font-size="13" text-anchor="middle">{}</text>"#,
            x + box_w / 2,
            dot_y + 5,
            palette::OVERLAY0,
            escape_xml(title)
        );

        let content_y = y + HEADER_HEIGHT + PADDING_Y;
        for (i, line) in lines.iter().enumerate() {
            let (color, bold) = line_style(line);
            let weight = if bold { "bold" } else { "normal" };
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{}" fill="{color}" font-family="{FONT_FAMILY}" font-size="14" font-weight="{weight}" xml:space="preserve">{}</text>"#,
                x + PADDING_X,
                content_y + i as u32 * LINE_HEIGHT + 16,
                line_markup(line, color)
            );
        }

        svg.push_str("</svg>\n");
        svg
    }
}

#[async_trait]
impl TerminalRenderer for SvgTerminalRenderer {
    fn extension(&self) -> &str {
        "svg"
    }

    async fn render(&self, text: &str, output: &Path, title: &str) -> Result<()> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Capture(format!("无法创建输出目录: {}", e)))?;
        }

        let svg = self.build_svg(text, title);
        tokio::fs::write(output, svg)
            .await
            .map_err(|e| Error::Capture(format!("写入终端图片失败 {:?}: {}", output, e)))?;

        debug!("终端图片已生成: {:?}", output);
        Ok(())
    }
}
