pub mod extract;
pub mod format;
pub mod model;
pub mod prompt;
pub mod service;

pub use model::{ActionItem, AnalysisRequest, AnalysisResponse, MinutesAnalysis, NextMeetingAdvice};
pub use service::{analyze_minutes, quick_advice, relay_message};
