#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use queue_cell::QueueService;
use shared_api::WebApiClient;
use shared_utils::test_utils::{MockApiResponses, TestConfig, TestUser};

pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct QueueState {
    waiting: Vec<Value>,
    current: Option<Value>,
    completed: Vec<Value>,
    failing: bool,
}

impl QueueState {
    fn renumber(&mut self) {
        for (index, entry) in self.waiting.iter_mut().enumerate() {
            entry["position"] = json!(index + 1);
        }
    }

    fn today(&self) -> Value {
        json!({
            "current": self.current,
            "waiting": self.waiting,
            "completed": self.completed,
            "summary": {
                "total": self.waiting.len() + self.completed.len() + usize::from(self.current.is_some()),
                "waiting": self.waiting.len(),
                "inProgress": usize::from(self.current.is_some()),
                "completed": self.completed.len()
            },
            "doctor": { "isOnDuty": true, "room": "Poli Umum 2" }
        })
    }
}

/// In-memory stand-in for the queue backend: call-next, skip and complete mutate
/// the lists that today/waiting report.
#[derive(Clone, Default)]
pub struct FakeQueueBackend {
    state: Arc<Mutex<QueueState>>,
}

impl FakeQueueBackend {
    pub fn with_waiting(count: usize) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state.lock().unwrap();
            state.waiting = (1..=count).map(waiting_entry).collect();
        }
        backend
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    pub fn waiting_len(&self) -> usize {
        self.state.lock().unwrap().waiting.len()
    }

    pub fn in_progress_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        let in_waiting = state
            .waiting
            .iter()
            .filter(|e| e["status"] == "IN_PROGRESS")
            .count();
        in_waiting + usize::from(state.current.is_some())
    }

    pub async fn mount(&self, server: &MockServer) {
        Mock::given(path_regex(r"^/api/web/doctor/queue/"))
            .respond_with(self.clone())
            .mount(server)
            .await;
    }
}

impl Respond for FakeQueueBackend {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.state.lock().unwrap();
        if state.failing {
            return ResponseTemplate::new(500)
                .set_body_json(MockApiResponses::failure("database unavailable"));
        }

        let resource = request.url.path().trim_start_matches("/api/web/doctor/queue/");
        match (request.method.as_str(), resource) {
            ("GET", "today") => ok(state.today()),
            ("GET", "waiting") => ok(json!(state.waiting)),
            ("POST", "call-next") => {
                if state.current.is_some() {
                    return ResponseTemplate::new(409)
                        .set_body_json(MockApiResponses::failure("Finish the current consultation first"));
                }
                if state.waiting.is_empty() {
                    return ResponseTemplate::new(404)
                        .set_body_json(MockApiResponses::failure("No patients waiting"));
                }
                let mut next = state.waiting.remove(0);
                next["status"] = json!("IN_PROGRESS");
                next["position"] = json!(0);
                next["calledAt"] = json!("2026-10-18T02:00:00Z");
                state.current = Some(next.clone());
                state.renumber();
                ok(next)
            }
            ("POST", "skip") => {
                let body: Value = request.body_json().unwrap_or_default();
                let id = body["queueId"].as_str().unwrap_or_default().to_string();
                match state.waiting.iter().position(|e| e["id"] == id.as_str()) {
                    Some(index) => {
                        let mut skipped = state.waiting.remove(index);
                        skipped["status"] = json!("CANCELLED");
                        skipped["skipReason"] = body["reason"].clone();
                        state.renumber();
                        ok(skipped)
                    }
                    None => ResponseTemplate::new(404)
                        .set_body_json(MockApiResponses::failure("Queue entry not found")),
                }
            }
            ("POST", "complete") => match state.current.take() {
                Some(mut entry) => {
                    entry["status"] = json!("COMPLETED");
                    entry["completedAt"] = json!("2026-10-18T02:15:00Z");
                    state.completed.push(entry.clone());
                    ok(entry)
                }
                None => ResponseTemplate::new(400)
                    .set_body_json(MockApiResponses::failure("No consultation in progress")),
            },
            _ => ResponseTemplate::new(404).set_body_json(MockApiResponses::failure("Route not found")),
        }
    }
}

fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(MockApiResponses::ok(data))
}

pub fn waiting_entry(position: usize) -> Value {
    json!({
        "id": format!("q-{}", position),
        "queueNumber": format!("A-{:03}", position),
        "status": "WAITING",
        "queueType": "WALK_IN",
        "position": position,
        "isPriority": false,
        "checkedInAt": "2026-10-18T01:00:00Z",
        "estimatedWaitMinutes": position * 15,
        "patient": {
            "id": format!("p-{}", position),
            "name": format!("Pasien {}", position),
            "nik": "3201234567890123"
        }
    })
}

pub fn service_for(server: &MockServer) -> Arc<QueueService> {
    let config = TestConfig::with_base_url(server.uri()).to_app_config();
    let session = TestUser::doctor("dokter@rs.id").memory_session();
    let client = WebApiClient::new(&config, session).unwrap();
    Arc::new(QueueService::new(client))
}

pub async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}
