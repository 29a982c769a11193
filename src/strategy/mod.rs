// 截图策略模块 - 根据项目画像和 JD 关键词决定截什么
//
// 流程：量化检测 -> 分类 -> 类别模板 -> JD 提权 -> 排序 -> 截断

pub mod catalog;
pub mod classifier;
pub mod impact;

pub use classifier::classify;
pub use impact::has_quantitative_impact;

use crate::models::{CaptureStrategy, Priority, ProjectProfile};
use tracing::{debug, info};

/// JD 关键词到需要提权的截图项
pub struct JdBoost {
    pub phrase: &'static str,
    pub targets: &'static [&'static str],
}

pub static JD_PRIORITY_BOOST: &[JdBoost] = &[
    JdBoost { phrase: "대시보드", targets: &["main_dashboard", "key_chart"] },
    JdBoost { phrase: "仪表盘", targets: &["main_dashboard", "key_chart"] },
    JdBoost { phrase: "dashboard", targets: &["main_dashboard", "key_chart"] },
    JdBoost { phrase: "시각화", targets: &["key_chart", "key_finding"] },
    JdBoost { phrase: "可视化", targets: &["key_chart", "key_finding"] },
    JdBoost { phrase: "visualization", targets: &["key_chart", "key_finding"] },
    JdBoost { phrase: "자동화", targets: &["execution_result", "before_after"] },
    JdBoost { phrase: "自动化", targets: &["execution_result", "before_after"] },
    JdBoost { phrase: "automation", targets: &["execution_result", "before_after"] },
    JdBoost { phrase: "비용 절감", targets: &["before_after", "impact_metrics"] },
    JdBoost { phrase: "降本", targets: &["before_after", "impact_metrics"] },
    JdBoost { phrase: "cost optimization", targets: &["before_after", "impact_metrics"] },
    JdBoost { phrase: "cost reduction", targets: &["before_after", "impact_metrics"] },
    JdBoost { phrase: "SQL", targets: &["analysis_output", "key_finding"] },
    JdBoost { phrase: "A/B test", targets: &["analysis_output", "impact_metrics"] },
    JdBoost { phrase: "ab test", targets: &["analysis_output", "impact_metrics"] },
    JdBoost { phrase: "ETL", targets: &["execution_result", "process_log"] },
    JdBoost { phrase: "ML", targets: &["model_metrics", "prediction_example"] },
    JdBoost { phrase: "API", targets: &["core_feature", "execution_result"] },
];

/// 综合项目画像与 JD 关键词，生成截图策略
pub fn determine_capture_strategy(
    profile: &ProjectProfile,
    jd_keywords: &[String],
) -> CaptureStrategy {
    let has_quant_impact = has_quantitative_impact(&profile.impact);

    let all_text = [
        profile.description(),
        profile.tech_stack.join(" "),
        profile.impact.clone(),
        profile.project_type.as_str().to_string(),
    ]
    .join(" ")
    .to_lowercase();

    let category = classify(&all_text);
    info!(
        "项目 {} 分类为 {}（量化成果: {}）",
        profile.name,
        category.as_str(),
        has_quant_impact
    );

    let mut strategy = catalog::build_for_category(category, &profile.name, has_quant_impact);

    if !jd_keywords.is_empty() {
        apply_jd_priorities(&mut strategy, jd_keywords);
    }

    strategy.max_captures = profile.project_type.max_captures();

    // sort_by_key 是稳定排序，同优先级保持模板顺序
    strategy.items.sort_by_key(|item| item.priority);
    if strategy.items.len() > strategy.max_captures {
        debug!(
            "截图项 {} 个超过上限 {}，截断",
            strategy.items.len(),
            strategy.max_captures
        );
        strategy.items.truncate(strategy.max_captures);
    }

    strategy
}

/// JD 关键词与提权表双向子串匹配（忽略大小写）时返回需要提权的截图项
pub fn boosted_item_names(jd_keywords: &[String]) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();

    for kw in jd_keywords {
        let kw = kw.trim().to_lowercase();
        if kw.is_empty() {
            continue;
        }
        for boost in JD_PRIORITY_BOOST {
            let phrase = boost.phrase.to_lowercase();
            if phrase.contains(&kw) || kw.contains(&phrase) {
                for target in boost.targets {
                    if !names.contains(target) {
                        names.push(target);
                    }
                }
            }
        }
    }

    names
}

/// 命中 JD 的截图项提升为 Required，只升不降
pub fn apply_jd_priorities(strategy: &mut CaptureStrategy, jd_keywords: &[String]) {
    let boosted = boosted_item_names(jd_keywords);

    for item in strategy.items.iter_mut() {
        if boosted.contains(&item.name.as_str()) && item.priority != Priority::Required {
            debug!("JD 关键词提权: {}", item.name);
            item.priority = Priority::Required;
        }
    }
}

/// 生成供用户预览的截图计划
pub fn format_capture_plan_preview(strategy: &CaptureStrategy) -> String {
    let rule = "─".repeat(40);
    let mut lines = vec![format!("📸 截图计划 ({})", strategy.category.as_str()), rule.clone()];

    for (i, item) in strategy.items.iter().enumerate() {
        lines.push(format!(
            "  {} {}. {}",
            item.priority.marker(),
            i + 1,
            item.description
        ));
        lines.push(format!(
            "     方式: {} | 价值: {}",
            item.method.label(),
            item.portfolio_value
        ));
    }

    lines.push(rule);
    let required = strategy
        .items
        .iter()
        .filter(|i| i.priority == Priority::Required)
        .count();
    lines.push(format!("  必需 {} 张 / 共 {} 张", required, strategy.items.len()));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectCategory, ProjectType};

    fn profile(project_type: ProjectType, problem: &str, impact: &str) -> ProjectProfile {
        ProjectProfile {
            name: "Demo".to_string(),
            project_type,
            tech_stack: vec!["Python".to_string()],
            problem: problem.to_string(),
            solution: String::new(),
            impact: impact.to_string(),
        }
    }

    fn kws(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_items_never_exceed_max_captures() {
        let types = [
            ProjectType::Business,
            ProjectType::Exploratory,
            ProjectType::Learning,
            ProjectType::Unspecified,
        ];
        let texts = [
            "dashboard grafana chart",
            "etl pipeline cron",
            "eda sql",
            "react frontend",
            "langchain rag",
            "",
        ];
        for t in types {
            for text in texts {
                for jd in [kws(&[]), kws(&["dashboard", "automation", "ML", "SQL"])] {
                    let s = determine_capture_strategy(&profile(t, text, "saved 30%"), &jd);
                    assert!(s.items.len() <= s.max_captures);
                    assert_eq!(s.max_captures, t.max_captures());
                }
            }
        }
    }

    #[test]
    fn test_items_sorted_by_priority_after_truncation() {
        let s = determine_capture_strategy(
            &profile(ProjectType::Business, "etl automation bot", "节省 5小时"),
            &[],
        );
        assert_eq!(s.category, ProjectCategory::Automation);
        for pair in s.items.windows(2) {
            assert!(pair[0].priority <= pair[1].priority);
        }
        assert_eq!(s.items.last().unwrap().name, "output_sample");
    }

    #[test]
    fn test_dashboard_jd_boost() {
        let names = boosted_item_names(&kws(&["Dashboard"]));
        assert!(names.contains(&"main_dashboard"));
        assert!(names.contains(&"key_chart"));

        let mut strategy = catalog::dashboard_strategy("X", false);
        for item in strategy.items.iter_mut() {
            item.priority = Priority::Optional;
        }
        apply_jd_priorities(&mut strategy, &kws(&["dashboard"]));
        assert!(strategy.items.iter().all(|i| i.priority == Priority::Required));
    }

    #[test]
    fn test_boost_matches_both_directions() {
        // 关键词包含短语
        assert!(boosted_item_names(&kws(&["senior ETL engineer"])).contains(&"process_log"));
        // 短语包含关键词
        assert!(boosted_item_names(&kws(&["cost"])).contains(&"impact_metrics"));
        assert!(boosted_item_names(&kws(&["  "])).is_empty());
    }

    #[test]
    fn test_boost_only_raises_priority() {
        let mut strategy = catalog::data_analysis_strategy("X");
        apply_jd_priorities(&mut strategy, &kws(&["ETL"]));
        let process_log = strategy.items.iter().find(|i| i.name == "process_log").unwrap();
        assert_eq!(process_log.priority, Priority::Required);
        // 未命中的项保持不变
        let analysis = strategy.items.iter().find(|i| i.name == "analysis_output").unwrap();
        assert_eq!(analysis.priority, Priority::Required);
    }

    #[test]
    fn test_learning_keeps_first_two_required_items() {
        let mut p = profile(ProjectType::Learning, "etl automation", "节省 38%");
        p.name = "Cron Bot".to_string();
        let s = determine_capture_strategy(&p, &kws(&["cost reduction"]));
        assert_eq!(s.items.len(), 2);
        assert_eq!(s.cover_from.as_deref(), Some("execution_result"));
        // 提权后 before_after 与 execution_result 都是 Required，按模板顺序保留
        assert_eq!(s.items[0].name, "execution_result");
        assert_eq!(s.items[1].name, "before_after");
    }

    #[test]
    fn test_korean_dashboard_profile() {
        let mut p = profile(
            ProjectType::Business,
            "매출 대시보드 시각화",
            "보고서 작성 4시간 단축, 월 ₩1,200,000 절감",
        );
        p.tech_stack = vec!["Looker Studio".to_string(), "BigQuery".to_string()];
        let s = determine_capture_strategy(&p, &kws(&["비용 절감"]));
        assert_eq!(s.category, ProjectCategory::Dashboard);
        assert!(s.items.iter().any(|i| i.name == "impact_metrics"));
        assert!(s.items.iter().all(|i| i.priority == Priority::Required));

        assert!(boosted_item_names(&kws(&["대시보드 개발"])).contains(&"main_dashboard"));
        assert!(boosted_item_names(&kws(&["자동화"])).contains(&"execution_result"));
    }

    #[test]
    fn test_preview_lists_items() {
        let s = determine_capture_strategy(&profile(ProjectType::Business, "react ui", ""), &[]);
        let preview = format_capture_plan_preview(&s);
        assert!(preview.contains("webapp"));
        assert!(preview.contains("1. 主界面"));
        assert!(preview.contains("必需 2 张 / 共 2 张"));
    }
}
