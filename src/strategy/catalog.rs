// 截图策略模板 - 每个项目类别对应一组基础截图项

use crate::models::{
    CaptureItem, CaptureMethod, CaptureStrategy, CaptureType, Priority, ProjectCategory,
};

/// 按类别生成基础策略
pub fn build_for_category(
    category: ProjectCategory,
    project_name: &str,
    has_quant_impact: bool,
) -> CaptureStrategy {
    match category {
        ProjectCategory::Dashboard => dashboard_strategy(project_name, has_quant_impact),
        ProjectCategory::Automation => automation_strategy(project_name, has_quant_impact),
        ProjectCategory::DataAnalysis => data_analysis_strategy(project_name),
        ProjectCategory::WebApp => webapp_strategy(project_name),
        ProjectCategory::MlAi => ml_strategy(project_name),
        ProjectCategory::Manual => CaptureStrategy::new(ProjectCategory::Manual, None),
    }
}

/// 仪表盘/可视化项目
pub fn dashboard_strategy(project_name: &str, has_quant_impact: bool) -> CaptureStrategy {
    let mut strategy = CaptureStrategy::new(ProjectCategory::Dashboard, Some("main_dashboard"));

    strategy.items = vec![
        CaptureItem::new(
            "main_dashboard",
            "仪表盘主界面",
            CaptureMethod::Viewport,
            CaptureType::Main,
            Priority::Required,
        )
        .value("面试官一眼看懂成果")
        .caption(format!("{} - 主仪表盘", project_name)),
        CaptureItem::new(
            "key_chart",
            "最有说服力的图表/指标",
            CaptureMethod::Element,
            CaptureType::KeyInsight,
            Priority::Required,
        )
        .value("数据可视化能力与核心洞察")
        .caption(format!("{} - 核心分析图表", project_name))
        .selector("[class*='chart'], [class*='plot'], canvas, svg.main-chart, .plotly"),
    ];

    if has_quant_impact {
        strategy.items.push(
            CaptureItem::new(
                "impact_metrics",
                "量化成果指标区域",
                CaptureMethod::Element,
                CaptureType::KeyInsight,
                Priority::Required,
            )
            .value("用数字证明业务影响")
            .caption(format!("{} - 核心成果指标", project_name))
            .selector("[class*='metric'], [class*='kpi'], [class*='summary'], [class*='stat']"),
        );
    }

    strategy
}

/// 自动化项目
pub fn automation_strategy(project_name: &str, has_quant_impact: bool) -> CaptureStrategy {
    let mut strategy =
        CaptureStrategy::new(ProjectCategory::Automation, Some("execution_result"));

    strategy.items.push(
        CaptureItem::new(
            "execution_result",
            "自动化执行成功日志",
            CaptureMethod::Terminal,
            CaptureType::Main,
            Priority::Required,
        )
        .value("证明代码真实可运行")
        .caption(format!("{} - 自动化执行结果", project_name)),
    );

    if has_quant_impact {
        strategy.items.push(
            CaptureItem::new(
                "before_after",
                "自动化前后效果对比",
                CaptureMethod::Terminal,
                CaptureType::Comparison,
                Priority::Required,
            )
            .value("直观展示自动化收益")
            .caption(format!("{} - 改进效果 (Before/After)", project_name)),
        );
    }

    strategy.items.push(
        CaptureItem::new(
            "output_sample",
            "自动化产出样例（报表/数据）",
            CaptureMethod::Terminal,
            CaptureType::Detail,
            Priority::Recommended,
        )
        .value("证明产出的质量与实用性")
        .caption(format!("{} - 自动生成结果", project_name)),
    );

    strategy
}

/// 数据分析/EDA 项目
pub fn data_analysis_strategy(project_name: &str) -> CaptureStrategy {
    let mut strategy = CaptureStrategy::new(ProjectCategory::DataAnalysis, Some("key_finding"));

    strategy.items = vec![
        CaptureItem::new(
            "key_finding",
            "核心发现图表（EDA 结果）",
            CaptureMethod::Viewport,
            CaptureType::Main,
            Priority::Required,
        )
        .value("证明提炼洞察的能力")
        .caption(format!("{} - 核心分析结果", project_name)),
        CaptureItem::new(
            "analysis_output",
            "分析执行结果（统计摘要/表格）",
            CaptureMethod::Terminal,
            CaptureType::KeyInsight,
            Priority::Required,
        )
        .value("证明量化分析结果")
        .caption(format!("{} - 分析结果摘要", project_name)),
        CaptureItem::new(
            "process_log",
            "数据处理流水线执行",
            CaptureMethod::Terminal,
            CaptureType::Terminal,
            Priority::Recommended,
        )
        .value("体现技术深度")
        .caption(format!("{} - 数据处理流水线", project_name)),
    ];

    strategy
}

/// Web 应用项目
pub fn webapp_strategy(project_name: &str) -> CaptureStrategy {
    let mut strategy = CaptureStrategy::new(ProjectCategory::WebApp, Some("hero_screen"));

    strategy.items = vec![
        CaptureItem::new(
            "hero_screen",
            "主界面",
            CaptureMethod::Viewport,
            CaptureType::Main,
            Priority::Required,
        )
        .value("完成度的第一印象")
        .caption(format!("{} - 主界面", project_name)),
        CaptureItem::new(
            "core_feature",
            "核心功能运行画面",
            CaptureMethod::Viewport,
            CaptureType::KeyInsight,
            Priority::Required,
        )
        .value("证明功能实现能力")
        .caption(format!("{} - 核心功能", project_name)),
    ];

    strategy
}

/// ML/AI 项目
pub fn ml_strategy(project_name: &str) -> CaptureStrategy {
    let mut strategy = CaptureStrategy::new(ProjectCategory::MlAi, Some("model_metrics"));

    strategy.items = vec![
        CaptureItem::new(
            "model_metrics",
            "模型性能指标",
            CaptureMethod::Terminal,
            CaptureType::Main,
            Priority::Required,
        )
        .value("量化证明 ML 能力")
        .caption(format!("{} - 模型性能评估", project_name)),
        CaptureItem::new(
            "prediction_example",
            "预测/推理结果示例",
            CaptureMethod::Terminal,
            CaptureType::KeyInsight,
            Priority::Required,
        )
        .value("证明模型真实可用")
        .caption(format!("{} - 预测结果示例", project_name)),
    ];

    strategy
}
