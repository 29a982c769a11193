// 影响力检测 - 判断 Impact 文本是否带有量化数值

use once_cell::sync::Lazy;
use regex::Regex;

static QUANT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d+%",                                         // 百分比
        r"\$[\d,]+",                                     // 美元
        r"[¥￥][\d,]+",                                  // 人民币/日元
        r"₩[\d,]+",                                      // 韩元
        r"\d+\s*[x倍배]",                                // 倍数
        r"\d+\s*(시간|분|건)",                           // 韩文时长/计数
        r"\d+\s*(小时|分钟|天|次|条)",                   // 中文时长/计数
        r"\d[\d.]*[KkMm]",                               // K/M 量级
        r"(?i)\d+\s*(hours?|mins?|minutes?|seconds?|days?)", // 英文时长
    ]
    .iter()
    .map(|p| Regex::new(p).expect("静态正则必须合法"))
    .collect()
});

/// Impact 文本中是否包含量化成果
pub fn has_quantitative_impact(impact: &str) -> bool {
    if impact.trim().is_empty() {
        return false;
    }
    QUANT_PATTERNS.iter().any(|re| re.is_match(impact))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_currency_and_percent() {
        assert!(has_quantitative_impact("Saved $8,340/month"));
        assert!(has_quantitative_impact("38% reduction"));
        assert!(has_quantitative_impact("每月节省 ¥12,000"));
        assert!(has_quantitative_impact("年度识别 $38K+ 成本"));
    }

    #[test]
    fn test_detects_durations_and_multipliers() {
        assert!(has_quantitative_impact("报表生成从 4小时 缩短到 10分钟"));
        assert!(has_quantitative_impact("cut the nightly job by 3 hours"));
        assert!(has_quantitative_impact("5x faster builds"));
        assert!(has_quantitative_impact("处理 1.2M 条记录"));
    }

    #[test]
    fn test_detects_korean_units() {
        assert!(has_quantitative_impact("처리 시간 4시간 단축"));
        assert!(has_quantitative_impact("리포트 작성 30분 → 5분"));
        assert!(has_quantitative_impact("1200건 자동 처리"));
        assert!(has_quantitative_impact("3배 향상"));
        assert!(has_quantitative_impact("월 ₩1,200,000 절감"));
        assert!(!has_quantitative_impact("업무 효율 개선"));
    }

    #[test]
    fn test_qualitative_text_is_not_quantitative() {
        assert!(!has_quantitative_impact("significantly improved performance"));
        assert!(!has_quantitative_impact("团队协作效率明显提升"));
        assert!(!has_quantitative_impact(""));
        assert!(!has_quantitative_impact("   "));
    }
}
