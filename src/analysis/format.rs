use super::extract::Extraction;
use super::model::{ActionItem, MinutesAnalysis, NOT_AVAILABLE};

pub const SUMMARY_HEADING: &str = "## 会議サマリー";
pub const DECISIONS_HEADING: &str = "## 主な決定事項";
pub const ACTION_ITEMS_HEADING: &str = "## アクションアイテム";
pub const UNRESOLVED_HEADING: &str = "## 未解決の課題";
pub const NEXT_MEETING_HEADING: &str = "## 次回会議への提案";
pub const AGENDA_HEADING: &str = "### アジェンダ案";
pub const PREPARATION_HEADING: &str = "### 事前準備";
pub const IMPROVEMENT_HEADING: &str = "### 改善ポイント";
pub const INSIGHTS_HEADING: &str = "## 生産性に関する所見";

fn or_not_available(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_AVAILABLE
    } else {
        trimmed
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", or_not_available(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn list_section(heading: &str, items: &[String]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    Some(format!("{heading}\n{}", bullet_list(items)))
}

fn action_item(item: &ActionItem) -> String {
    format!(
        "- {}\n  - 担当者: {}\n  - 期限: {}",
        or_not_available(&item.task),
        or_not_available(&item.assignee),
        or_not_available(&item.deadline),
    )
}

fn action_items_section(items: &[ActionItem]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let body = items.iter().map(action_item).collect::<Vec<_>>().join("\n");
    Some(format!("{ACTION_ITEMS_HEADING}\n{body}"))
}

fn next_meeting_section(analysis: &MinutesAnalysis) -> Option<String> {
    let advice = &analysis.next_meeting_advice;
    let subsections: Vec<String> = [
        list_section(AGENDA_HEADING, &advice.agenda_suggestions),
        list_section(PREPARATION_HEADING, &advice.preparation_items),
        list_section(IMPROVEMENT_HEADING, &advice.improvement_points),
    ]
    .into_iter()
    .flatten()
    .collect();

    if subsections.is_empty() {
        return None;
    }
    Some(format!("{NEXT_MEETING_HEADING}\n{}", subsections.join("\n\n")))
}

/// Renders the Markdown report for a structured analysis.
///
/// Summary and insights are always present (`N/A` when blank). List
/// sections with no entries are left out, heading included.
pub fn render_analysis(analysis: &MinutesAnalysis) -> String {
    let sections: Vec<String> = [
        Some(format!(
            "{SUMMARY_HEADING}\n{}",
            or_not_available(&analysis.meeting_summary)
        )),
        list_section(DECISIONS_HEADING, &analysis.key_decisions),
        action_items_section(&analysis.action_items),
        list_section(UNRESOLVED_HEADING, &analysis.unresolved_issues),
        next_meeting_section(analysis),
        Some(format!(
            "{INSIGHTS_HEADING}\n{}",
            or_not_available(&analysis.productivity_insights)
        )),
    ]
    .into_iter()
    .flatten()
    .collect();

    sections.join("\n\n")
}

/// Raw fallbacks pass through untouched.
pub fn format_report(extraction: &Extraction) -> String {
    match extraction {
        Extraction::Structured(analysis) => render_analysis(analysis),
        Extraction::RawFallback(raw) => raw.clone(),
    }
}
