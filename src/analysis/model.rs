use serde::{Deserialize, Deserializer, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";
pub const DEFAULT_MEETING_TYPE: &str = "regular";

/// One analysis job, built per HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub text: String,
    pub meeting_type: String,
    pub participants: String,
}

impl AnalysisRequest {
    pub fn new(
        text: impl Into<String>,
        meeting_type: Option<String>,
        participants: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            meeting_type: meeting_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MEETING_TYPE.to_string()),
            participants: participants.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub task: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub assignee: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub deadline: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NextMeetingAdvice {
    #[serde(deserialize_with = "null_as_default")]
    pub agenda_suggestions: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub preparation_items: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub improvement_points: Vec<String>,
}

impl NextMeetingAdvice {
    pub fn is_empty(&self) -> bool {
        self.agenda_suggestions.is_empty()
            && self.preparation_items.is_empty()
            && self.improvement_points.is_empty()
    }
}

/// Structured analysis as the model is asked to return it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinutesAnalysis {
    #[serde(alias = "summary", deserialize_with = "null_as_default")]
    pub meeting_summary: String,
    #[serde(alias = "decisions", deserialize_with = "null_as_default")]
    pub key_decisions: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub action_items: Vec<ActionItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub unresolved_issues: Vec<String>,
    #[serde(
        alias = "next_meeting_suggestions",
        deserialize_with = "null_as_default"
    )]
    pub next_meeting_advice: NextMeetingAdvice,
    #[serde(deserialize_with = "null_as_default")]
    pub productivity_insights: String,
}

/// Body of `POST /analyze-minutes`. Every field is always present;
/// `raw_response` only appears when the model reply could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub analysis: MinutesAnalysis,
    pub formatted_report: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

fn text_or_not_available<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(not_available))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
