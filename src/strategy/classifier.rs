// 项目分类器 - 按关键词表为项目文本打分并选出截图类别
//
// 类别表是有序切片，同分时取表中靠前的类别

use crate::models::ProjectCategory;

/// 一个类别及其关键词
pub struct CategoryKeywords {
    pub category: ProjectCategory,
    pub keywords: &'static [&'static str],
}

/// 全部得分为 0 时使用的类别
pub const DEFAULT_CATEGORY: ProjectCategory = ProjectCategory::DataAnalysis;

pub static CATEGORY_TABLE: &[CategoryKeywords] = &[
    CategoryKeywords {
        category: ProjectCategory::Dashboard,
        keywords: &[
            "dashboard", "대시보드", "仪表盘", "看板", "looker", "tableau", "시각화", "可视化", "visualization",
            "chart", "grafana",
        ],
    },
    CategoryKeywords {
        category: ProjectCategory::Automation,
        keywords: &[
            "자동화", "自动化", "automation", "bot", "scraper", "爬虫", "cron", "scheduler",
            "pipeline", "etl", "workflow",
        ],
    },
    CategoryKeywords {
        category: ProjectCategory::DataAnalysis,
        keywords: &[
            "분석", "分析", "analysis", "eda", "탐색", "探索", "exploratory", "sql", "bigquery", "a/b test",
            "ab test", "통계", "统计",
        ],
    },
    CategoryKeywords {
        category: ProjectCategory::WebApp,
        keywords: &[
            "streamlit", "react", "flask", "gradio", "dash", "web app", "웹앱", "网页应用", "frontend",
            "ui",
        ],
    },
    CategoryKeywords {
        category: ProjectCategory::MlAi,
        keywords: &[
            "ml", "machine learning", "딥러닝", "深度学习", "deep learning", "model", "모델", "模型",
            "prediction", "classification", "regression", "nlp", "rag", "langchain",
            "embedding", "fine-tuning",
        ],
    },
];

/// 计算单个类别的得分：命中的关键词个数
pub fn score(text: &str, keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|kw| text.contains(&kw.to_lowercase()))
        .count()
}

/// 对小写文本分类
pub fn classify(text: &str) -> ProjectCategory {
    let text = text.to_lowercase();
    let mut best: Option<(ProjectCategory, usize)> = None;

    for entry in CATEGORY_TABLE {
        let s = score(&text, entry.keywords);
        // 严格大于，保证同分时先出现的类别胜出
        if s > 0 && best.map_or(true, |(_, top)| s > top) {
            best = Some((entry.category, s));
        }
    }

    best.map(|(category, _)| category).unwrap_or(DEFAULT_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_when_nothing_matches() {
        assert_eq!(classify("完全无关的文本"), DEFAULT_CATEGORY);
        assert_eq!(classify(""), ProjectCategory::DataAnalysis);
    }

    #[test]
    fn test_highest_score_wins() {
        let text = "airflow etl pipeline with cron scheduler feeding a chart";
        assert_eq!(classify(text), ProjectCategory::Automation);
    }

    #[test]
    fn test_tie_goes_to_earlier_category() {
        // dashboard 命中 1 个，automation 命中 1 个
        assert_eq!(classify("grafana cron"), ProjectCategory::Dashboard);
        assert_eq!(classify("cron grafana"), ProjectCategory::Dashboard);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let text = "python bigquery looker studio 成本分析 dashboard";
        let first = classify(text);
        for _ in 0..50 {
            assert_eq!(classify(text), first);
        }
        assert_eq!(first, ProjectCategory::Dashboard);
    }

    #[test]
    fn test_korean_keywords() {
        assert_eq!(classify("매출 대시보드 시각화"), ProjectCategory::Dashboard);
        assert_eq!(classify("보고서 자동화"), ProjectCategory::Automation);
        assert_eq!(classify("고객 이탈 탐색 통계"), ProjectCategory::DataAnalysis);
        assert_eq!(classify("딥러닝 모델 학습"), ProjectCategory::MlAi);
        assert_eq!(classify("사내 웹앱"), ProjectCategory::WebApp);
    }

    #[test]
    fn test_input_is_lowercased() {
        assert_eq!(classify("LangChain RAG Embedding"), ProjectCategory::MlAi);
    }
}
