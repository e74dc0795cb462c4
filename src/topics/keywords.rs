//! Keyword table driving [`super::detect::detect_intention`]. Kept as
//! plain data, the way the original detector's `INTENTION_KEYWORDS` table
//! is plain data, so new signal words don't require touching the scan
//! logic.

use super::types::TopicKind;

pub fn keywords_for(kind: TopicKind) -> &'static [&'static str] {
    match kind {
        TopicKind::Risk => &[
            "风险", "危险", "警告", "异常", "超限", "回撤", "亏损",
            "risk", "warning", "alert", "exceed", "drawdown", "loss",
            "担忧", "担心", "注意", "小心",
        ],
        TopicKind::Strategy => &[
            "策略", "想法", "假设", "发现", "机会", "alpha",
            "strategy", "idea", "hypothesis", "opportunity",
            "建议", "提案", "方案",
        ],
        TopicKind::Process => &[
            "流程", "效率", "改进", "优化",
            "process", "efficiency", "improve", "optimize",
            "需要", "缺少", "不够", "预算", "资源", "工具",
            "need", "lack", "budget", "resource", "tool",
            "申请", "请求", "帮助", "协助", "支持", "困难", "卡住",
            "help", "assist", "support", "stuck", "blocked",
        ],
        TopicKind::Emergency => &[
            "紧急", "立即", "马上", "严重", "崩溃",
            "urgent", "immediately", "critical", "crash",
            "必须", "警报",
        ],
        TopicKind::Data | TopicKind::Trading | TopicKind::Governance | TopicKind::Organization => &[],
    }
}

pub const ALL_KEYWORD_KINDS: &[TopicKind] =
    &[TopicKind::Risk, TopicKind::Strategy, TopicKind::Process, TopicKind::Emergency];

pub fn urgency_priority(text_lower: &str) -> super::types::TopicPriority {
    use super::types::TopicPriority;
    if ["紧急", "urgent", "立即", "immediately", "严重"].iter().any(|kw| text_lower.contains(kw)) {
        TopicPriority::Urgent
    } else if ["重要", "important", "尽快", "soon"].iter().any(|kw| text_lower.contains(kw)) {
        TopicPriority::High
    } else if ["可以", "建议", "perhaps", "maybe"].iter().any(|kw| text_lower.contains(kw)) {
        TopicPriority::Low
    } else {
        TopicPriority::Normal
    }
}
