use super::model::AnalysisRequest;

const UNSPECIFIED_PARTICIPANTS: &str = "未指定";

fn participants(request: &AnalysisRequest) -> &str {
    if request.participants.trim().is_empty() {
        UNSPECIFIED_PARTICIPANTS
    } else {
        &request.participants
    }
}

/// Full-analysis prompt. The minutes text is embedded verbatim.
pub fn build_analysis_prompt(request: &AnalysisRequest) -> String {
    format!(
        r#"あなたは会議の生産性向上を支援する専門コンサルタントです。
以下の会議議事録を分析し、次回の会議をより生産的にするためのアドバイスを提供してください。

会議タイプ: {meeting_type}
参加者: {participants}

議事録:
{text}

以下のJSON形式のみで、日本語で回答してください。JSON以外の説明文は含めないでください。

```json
{{
  "meeting_summary": "会議の要約（2〜3文）",
  "key_decisions": ["決定事項1", "決定事項2"],
  "action_items": [
    {{"task": "タスク内容", "assignee": "担当者", "deadline": "期限"}}
  ],
  "unresolved_issues": ["未解決の課題1", "未解決の課題2"],
  "next_meeting_advice": {{
    "agenda_suggestions": ["次回のアジェンダ案1", "次回のアジェンダ案2"],
    "preparation_items": ["事前準備事項1", "事前準備事項2"],
    "improvement_points": ["会議運営の改善点1", "会議運営の改善点2"]
  }},
  "productivity_insights": "会議の生産性に関する所見"
}}
```

担当者や期限が議事録から読み取れない場合は "N/A" としてください。"#,
        meeting_type = request.meeting_type,
        participants = participants(request),
        text = request.text,
    )
}

/// Three-point advice prompt; the reply is returned as plain text.
pub fn build_quick_advice_prompt(request: &AnalysisRequest) -> String {
    format!(
        r#"以下の会議議事録を読み、次回の会議をより良くするための具体的なアドバイスを3つ、簡潔に箇条書きで日本語で挙げてください。

会議タイプ: {meeting_type}
参加者: {participants}

議事録:
{text}"#,
        meeting_type = request.meeting_type,
        participants = participants(request),
        text = request.text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> AnalysisRequest {
        AnalysisRequest::new(text, Some("weekly".to_string()), Some("田中, 佐藤".to_string()))
    }

    #[test]
    fn test_analysis_prompt_embeds_fields() {
        let prompt = build_analysis_prompt(&request("予算について議論した"));
        assert!(prompt.contains("会議タイプ: weekly"));
        assert!(prompt.contains("参加者: 田中, 佐藤"));
        assert!(prompt.contains("議事録:\n予算について議論した"));
    }

    #[test]
    fn test_analysis_prompt_names_every_schema_key() {
        let prompt = build_analysis_prompt(&request("x"));
        for key in [
            "\"meeting_summary\"",
            "\"key_decisions\"",
            "\"action_items\"",
            "\"task\"",
            "\"assignee\"",
            "\"deadline\"",
            "\"unresolved_issues\"",
            "\"next_meeting_advice\"",
            "\"agenda_suggestions\"",
            "\"preparation_items\"",
            "\"improvement_points\"",
            "\"productivity_insights\"",
        ] {
            assert!(prompt.contains(key), "prompt is missing {key}");
        }
    }

    #[test]
    fn test_prompts_keep_long_text_intact() {
        let text = "長い議事録の一行。{braces} and ```fences```\n".repeat(2_000);
        let req = request(&text);
        assert!(build_analysis_prompt(&req).contains(&text));
        assert!(build_quick_advice_prompt(&req).contains(&text));
    }

    #[test]
    fn test_empty_participants_render_as_unspecified() {
        let req = AnalysisRequest::new("x", None, None);
        let prompt = build_analysis_prompt(&req);
        assert!(prompt.contains("参加者: 未指定"));
        assert!(prompt.contains("会議タイプ: regular"));
    }

    #[test]
    fn test_quick_advice_prompt_asks_for_three_points() {
        let prompt = build_quick_advice_prompt(&request("短い会議"));
        assert!(prompt.contains("アドバイスを3つ"));
        assert!(prompt.contains("議事録:\n短い会議"));
        assert!(!prompt.contains("\"meeting_summary\""));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let req = request("同じ入力");
        assert_eq!(build_analysis_prompt(&req), build_analysis_prompt(&req));
    }
}
