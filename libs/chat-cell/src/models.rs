use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Emergency,
    Urgent,
    Normal,
}

impl Severity {
    fn rank(self) -> u8 {
        match self {
            Severity::Emergency => 0,
            Severity::Urgent => 1,
            Severity::Normal => 2,
        }
    }
}

/// How close a session is to its reply deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Normal,
    Warning,
    Urgent,
    Overdue,
}

pub const URGENT_WITHIN_MINUTES: i64 = 5;
pub const WARNING_WITHIN_MINUTES: i64 = 15;

impl ResponseStatus {
    /// Fallback used only when the server did not send `responseStatus`.
    ///
    /// `time_to_respond` is minutes left before the reply deadline. A session that is
    /// not waiting on the doctor is always `Normal`.
    pub fn classify(time_to_respond: Option<i64>, awaiting_reply: bool) -> Self {
        if !awaiting_reply {
            return ResponseStatus::Normal;
        }
        match time_to_respond {
            Some(minutes) if minutes <= 0 => ResponseStatus::Overdue,
            Some(minutes) if minutes <= URGENT_WITHIN_MINUTES => ResponseStatus::Urgent,
            Some(minutes) if minutes <= WARNING_WITHIN_MINUTES => ResponseStatus::Warning,
            _ => ResponseStatus::Normal,
        }
    }

    fn rank(self) -> u8 {
        match self {
            ResponseStatus::Overdue => 0,
            ResponseStatus::Urgent => 1,
            ResponseStatus::Warning => 2,
            ResponseStatus::Normal => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    Patient,
    Doctor,
    Ai,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPatient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub content: String,
    pub sender: MessageSender,
    pub sent_at: DateTime<Utc>,
}

/// Reported symptoms arrive either as a list or as the patient's own sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Symptoms {
    List(Vec<String>),
    Text(String),
}

impl Default for Symptoms {
    fn default() -> Self {
        Symptoms::List(Vec::new())
    }
}

impl Symptoms {
    pub fn summary(&self) -> String {
        match self {
            Symptoms::List(items) => items.join(", "),
            Symptoms::Text(text) => text.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Symptoms::List(items) => items.is_empty(),
            Symptoms::Text(text) => text.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub consultation_id: String,
    pub patient: ChatPatient,
    pub severity: Severity,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    #[serde(default)]
    pub response_status: Option<ResponseStatus>,
    #[serde(default)]
    pub time_to_respond: Option<i64>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub symptoms: Symptoms,
    /// Free-form AI triage output; the shape is not stable.
    #[serde(default)]
    pub ai_analysis: Option<Value>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl ChatSession {
    pub fn awaiting_reply(&self) -> bool {
        matches!(&self.last_message, Some(m) if m.sender == MessageSender::Patient)
    }

    /// Server classification when present, otherwise the local fallback.
    pub fn effective_response_status(&self) -> ResponseStatus {
        self.response_status
            .unwrap_or_else(|| ResponseStatus::classify(self.time_to_respond, self.awaiting_reply()))
    }

    pub fn needs_response(&self) -> bool {
        self.awaiting_reply() || self.effective_response_status() != ResponseStatus::Normal
    }
}

/// Severity first, then response status, then least time left.
pub fn triage_order(a: &ChatSession, b: &ChatSession) -> Ordering {
    a.severity
        .rank()
        .cmp(&b.severity.rank())
        .then_with(|| {
            a.effective_response_status()
                .rank()
                .cmp(&b.effective_response_status().rank())
        })
        .then_with(|| match (a.time_to_respond, b.time_to_respond) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

pub fn triage_sort(sessions: &mut [ChatSession]) {
    sessions.sort_by(triage_order);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub total: u32,
    pub emergency: u32,
    pub urgent: u32,
    pub normal: u32,
    pub needs_response: u32,
}

impl ChatSummary {
    pub fn from_sessions(sessions: &[ChatSession]) -> Self {
        let count = |severity: Severity| sessions.iter().filter(|s| s.severity == severity).count() as u32;
        Self {
            total: sessions.len() as u32,
            emergency: count(Severity::Emergency),
            urgent: count(Severity::Urgent),
            normal: count(Severity::Normal),
            needs_response: sessions.iter().filter(|s| s.needs_response()).count() as u32,
        }
    }
}

/// `GET chat/sessions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionsResponse {
    #[serde(default)]
    pub sessions: Vec<ChatSession>,
    #[serde(default)]
    pub summary: Option<ChatSummary>,
}

/// What the session list renders: sessions in triage order plus the counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSessionsView {
    pub sessions: Vec<ChatSession>,
    pub summary: ChatSummary,
}

impl From<ChatSessionsResponse> for ChatSessionsView {
    fn from(response: ChatSessionsResponse) -> Self {
        let mut sessions = response.sessions;
        triage_sort(&mut sessions);
        let summary = response
            .summary
            .unwrap_or_else(|| ChatSummary::from_sessions(&sessions));
        Self { sessions, summary }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender: MessageSender,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsultationStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub consultation_id: String,
    pub patient: ChatPatient,
    pub status: ConsultationStatus,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub symptoms: Symptoms,
    #[serde(default)]
    pub ai_analysis: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub consultation_id: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteChatRequest {
    pub consultation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session(id: &str, severity: &str, ttr: Option<i64>, from_patient: bool) -> ChatSession {
        serde_json::from_value(json!({
            "consultationId": id,
            "patient": { "id": format!("p-{}", id), "name": "Siti" },
            "severity": severity,
            "timeToRespond": ttr,
            "lastMessage": {
                "content": "Dok, demam saya belum turun",
                "sender": if from_patient { "patient" } else { "doctor" },
                "sentAt": "2026-10-18T03:00:00Z"
            },
            "symptoms": ["demam", "batuk"]
        }))
        .unwrap()
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(ResponseStatus::classify(Some(0), true), ResponseStatus::Overdue);
        assert_eq!(ResponseStatus::classify(Some(-12), true), ResponseStatus::Overdue);
        assert_eq!(ResponseStatus::classify(Some(5), true), ResponseStatus::Urgent);
        assert_eq!(ResponseStatus::classify(Some(12), true), ResponseStatus::Warning);
        assert_eq!(ResponseStatus::classify(Some(40), true), ResponseStatus::Normal);
        assert_eq!(ResponseStatus::classify(None, true), ResponseStatus::Normal);
    }

    #[test]
    fn test_no_pending_reply_is_normal() {
        assert_eq!(ResponseStatus::classify(Some(0), false), ResponseStatus::Normal);
        assert_eq!(session("c1", "urgent", Some(0), false).effective_response_status(), ResponseStatus::Normal);
    }

    #[test]
    fn test_server_status_wins_over_local_thresholds() {
        let mut s = session("c1", "normal", Some(40), true);
        s.response_status = Some(ResponseStatus::Urgent);
        assert_eq!(s.effective_response_status(), ResponseStatus::Urgent);

        let mut overdue = session("c2", "normal", Some(0), true);
        overdue.response_status = Some(ResponseStatus::Warning);
        assert_eq!(overdue.effective_response_status(), ResponseStatus::Warning);
    }

    #[test]
    fn test_triage_order() {
        let mut sessions = vec![
            session("normal-late", "normal", Some(0), true),
            session("urgent-relaxed", "urgent", Some(60), true),
            session("emergency", "emergency", Some(30), true),
            session("urgent-soon", "urgent", Some(3), true),
            session("urgent-no-deadline", "urgent", None, false),
        ];
        triage_sort(&mut sessions);

        let ids: Vec<&str> = sessions.iter().map(|s| s.consultation_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["emergency", "urgent-soon", "urgent-relaxed", "urgent-no-deadline", "normal-late"]
        );
    }

    #[test]
    fn test_symptoms_accept_list_or_text() {
        let text: Symptoms = serde_json::from_value(json!("nyeri dada sejak pagi")).unwrap();
        assert_eq!(text, Symptoms::Text("nyeri dada sejak pagi".into()));

        let list: Symptoms = serde_json::from_value(json!(["demam", "batuk"])).unwrap();
        assert_eq!(list.summary(), "demam, batuk");
        assert!(Symptoms::default().is_empty());
    }

    #[test]
    fn test_summary_computed_when_server_omits_it() {
        let view = ChatSessionsView::from(ChatSessionsResponse {
            sessions: vec![
                session("a", "emergency", Some(10), true),
                session("b", "normal", Some(30), false),
            ],
            summary: None,
        });
        assert_eq!(view.summary.total, 2);
        assert_eq!(view.summary.emergency, 1);
        assert_eq!(view.summary.needs_response, 1);
        assert_eq!(view.sessions[0].consultation_id, "a");
    }
}
