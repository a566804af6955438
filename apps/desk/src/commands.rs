use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use admin_cell::{DashboardService, HealthStatus};
use auth_cell::{AuthService, Credentials};
use chat_cell::{ChatService, ChatSessionList, ChatSessionsView};
use checkin_cell::{QrCheckIn, ScanOutcome, ScanPhase, SimulatedCamera, SimulatedDecoder};
use patient_cell::PatientService;
use queue_cell::{
    CallNextOutcome, CompleteConsultationRequest, QueueBoard, QueueEntry, QueueHistoryQuery, QueueService,
    QueueSnapshot, QueueStatus, SkipPatientRequest,
};
use shared_models::auth::{Role, SessionEvent};
use shared_utils::{SessionProvider, Toast, ToastLevel};

use crate::cli::{ChatAction, Command, PatientAction, QueueAction};
use crate::Desk;

pub async fn run(desk: &Desk, command: Command) -> Result<()> {
    match command {
        Command::Login { role, email, password } => login(desk, &role, &email, &password).await,
        Command::Logout => logout(desk).await,
        Command::Dashboard => dashboard(desk).await,
        Command::Queue { action } => queue(desk, action).await,
        Command::Chat { action } => chat(desk, action).await,
        Command::Checkin { code } => checkin(desk, code).await,
        Command::Patients {
            action: PatientAction::Search { term },
        } => search_patients(desk, &term).await,
    }
}

fn require_session(desk: &Desk) -> Result<()> {
    if !desk.api.session().is_signed_in() {
        bail!("Not signed in. Run `hospital-desk login` first.");
    }
    Ok(())
}

async fn login(desk: &Desk, role: &str, email: &str, password: &str) -> Result<()> {
    let role: Role = role.parse()?;
    let auth = AuthService::new(desk.api.clone());
    let session = auth.login(role, &Credentials::new(email, password)).await?;
    println!("Signed in as {} ({})", session.user.name, session.role);
    Ok(())
}

async fn logout(desk: &Desk) -> Result<()> {
    AuthService::new(desk.api.clone()).logout().await?;
    println!("Signed out");
    Ok(())
}

async fn dashboard(desk: &Desk) -> Result<()> {
    require_session(desk)?;
    let overview = DashboardService::new(desk.api.clone()).overview().await?;
    let stats = &overview.stats;

    println!("Patients        {}", stats.total_patients);
    println!("Doctors         {} ({} active)", stats.total_doctors, stats.active_doctors);
    println!("Consultations   {} today", stats.today_consultations);
    println!("In queue        {}", stats.today_queue);
    println!("Prescriptions   {} pending", stats.pending_prescriptions);
    match overview.health.status {
        HealthStatus::Healthy => println!("Backend         healthy ({} ms)", overview.health.response_time_ms),
        status => println!(
            "Backend         {:?}: {}",
            status,
            overview.health.error_message.as_deref().unwrap_or("slow to respond")
        ),
    }
    if !stats.recent_activity.is_empty() {
        println!("\nRecent activity");
        for activity in &stats.recent_activity {
            println!("  {}  {}", activity.timestamp.format("%H:%M"), activity.description);
        }
    }
    Ok(())
}

async fn queue(desk: &Desk, action: QueueAction) -> Result<()> {
    require_session(desk)?;
    let service = Arc::new(QueueService::new(desk.api.clone()));

    match action {
        QueueAction::Watch => watch_queue(desk, service).await,
        QueueAction::CallNext => {
            match service.call_next().await? {
                CallNextOutcome::Called(entry) => println!("Now serving {}", entry_line(&entry)),
                CallNextOutcome::NoPatientWaiting => println!("No patient waiting"),
            }
            Ok(())
        }
        QueueAction::Skip { queue_id, reason } => {
            service.skip(&SkipPatientRequest { queue_id: queue_id.clone(), reason }).await?;
            println!("Skipped {}", queue_id);
            Ok(())
        }
        QueueAction::Complete {
            queue_id,
            diagnosis,
            treatment,
            notes,
        } => {
            let request = CompleteConsultationRequest {
                queue_id,
                diagnosis,
                treatment,
                notes,
                ..Default::default()
            };
            service.complete(&request).await?;
            println!("Consultation completed");
            Ok(())
        }
        QueueAction::History { page, limit, status } => {
            let status = status
                .map(|s| s.parse::<QueueStatus>())
                .transpose()
                .map_err(|e| anyhow!(e))?;
            let query = QueueHistoryQuery {
                page: Some(page),
                limit: Some(limit),
                status,
                ..Default::default()
            };
            let history = service.history(&query).await?;
            for entry in &history.items {
                println!("{}", entry_line(entry));
            }
            println!(
                "page {}/{} ({} entries)",
                history.pagination.page, history.pagination.total_pages, history.pagination.total
            );
            Ok(())
        }
    }
}

async fn watch_queue(desk: &Desk, service: Arc<QueueService>) -> Result<()> {
    let board = QueueBoard::mount(service, desk.notifier.clone(), desk.config.queue_refresh_interval());
    let mut states = board.subscribe();
    let mut toasts = desk.notifier.subscribe();
    let mut session_events = desk.api.subscribe_session_events();
    let mut printed = 0;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, leaving queue page");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                if state.fetch_count != printed && !state.is_busy() {
                    printed = state.fetch_count;
                    if let Some(snapshot) = state.data.as_deref() {
                        print_queue(snapshot);
                    }
                }
            }
            toast = toasts.recv() => {
                if !print_toast(toast) {
                    break;
                }
            }
            event = session_events.recv() => {
                if session_ended(event) {
                    break;
                }
            }
        }
    }

    board.unmount().await;
    Ok(())
}

async fn chat(desk: &Desk, action: ChatAction) -> Result<()> {
    require_session(desk)?;
    let service = Arc::new(ChatService::new(desk.api.clone()));

    match action {
        ChatAction::Watch => watch_chat(desk, service).await,
        ChatAction::Show { consultation_id } => {
            let conversation = service.conversation(&consultation_id).await?;
            println!("{} ({:?})", conversation.patient.name, conversation.status);
            if !conversation.symptoms.is_empty() {
                println!("Symptoms: {}", conversation.symptoms.summary());
            }
            for message in &conversation.messages {
                println!("[{}] {:?}: {}", message.sent_at.format("%H:%M"), message.sender, message.content);
            }
            Ok(())
        }
        ChatAction::Send { consultation_id, message } => {
            service.send_message(&consultation_id, &message).await?;
            println!("Sent");
            Ok(())
        }
        ChatAction::Complete { consultation_id, notes } => {
            service.complete(&consultation_id, notes).await?;
            println!("Consultation {} completed", consultation_id);
            Ok(())
        }
    }
}

async fn watch_chat(desk: &Desk, service: Arc<ChatService>) -> Result<()> {
    let list = ChatSessionList::mount(service, desk.config.chat_refresh_interval()).await;
    let Some(mut states) = list.subscribe().await else {
        let message = list
            .failure()
            .await
            .map(|f| f.message)
            .unwrap_or_else(|| "Chat sessions are unavailable".to_string());
        list.unmount().await;
        bail!(message);
    };
    let mut session_events = desk.api.subscribe_session_events();
    let mut printed = 0;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, leaving chat list");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                if state.fetch_count == printed || state.is_busy() {
                    continue;
                }
                printed = state.fetch_count;
                match (&state.data, &state.error) {
                    (_, Some(err)) => eprintln!("! {}", err.user_message()),
                    (Some(view), None) => print_sessions(view),
                    (None, None) => {}
                }
            }
            event = session_events.recv() => {
                if session_ended(event) {
                    break;
                }
            }
        }
    }

    list.unmount().await;
    Ok(())
}

async fn checkin(desk: &Desk, code: Option<String>) -> Result<()> {
    require_session(desk)?;
    let service = Arc::new(QueueService::new(desk.api.clone()));
    let flow = QrCheckIn::new(
        Arc::new(SimulatedCamera::new()),
        Arc::new(SimulatedDecoder::new()),
        service,
        desk.notifier.clone(),
        desk.config.qr_scan_interval(),
    );
    let mut phases = flow.subscribe();

    match code {
        Some(code) => flow.submit_code(&code).await?,
        None => {
            flow.start_scanning().await?;
            println!("Scanning for a QR code (Ctrl-C to cancel)...");
        }
    }

    let outcome = tokio::select! {
        phase = phases.wait_for(|p| matches!(p, ScanPhase::Result(_))) => match phase {
            Ok(phase) => match &*phase {
                ScanPhase::Result(outcome) => Some(outcome.clone()),
                _ => None,
            },
            Err(_) => None,
        },
        _ = tokio::signal::ctrl_c() => None,
    };
    flow.teardown().await;

    match outcome {
        Some(ScanOutcome::CheckedIn(summary)) => {
            println!("Checked in {} ({})", summary.patient_name, summary.code);
            println!("  queue number  {}", summary.queue_number);
            println!("  type          {} -> {}", summary.previous_type, summary.queue_type);
            println!("  position      {}", summary.position);
            if let Some(wait) = summary.estimated_wait_label() {
                println!("  estimated     {}", wait);
            }
            Ok(())
        }
        Some(ScanOutcome::Failed { message, .. }) => bail!(message),
        Some(ScanOutcome::PermissionDenied(message)) => bail!(message),
        None => {
            println!("Check-in cancelled");
            Ok(())
        }
    }
}

async fn search_patients(desk: &Desk, term: &str) -> Result<()> {
    require_session(desk)?;
    let patients = PatientService::new(desk.api.clone()).search(term).await?;
    if patients.is_empty() {
        println!("No patients found");
    }
    for patient in &patients {
        println!(
            "{:<12} {:<28} {}  {}",
            patient.id,
            patient.name,
            patient.masked_nik(),
            patient.phone.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn entry_line(entry: &QueueEntry) -> String {
    let mut line = format!(
        "{:<6} {:<24} {:<11} {}",
        entry.queue_number, entry.patient.name, entry.status, entry.queue_type
    );
    if let Some(nik) = entry.patient.masked_nik() {
        line.push_str(&format!("  NIK {}", nik));
    }
    if entry.is_priority {
        line.push_str("  [priority]");
    }
    line
}

fn print_queue(snapshot: &QueueSnapshot) {
    let summary = &snapshot.today.summary;
    println!(
        "\n== Queue: {} waiting, {} in progress, {} completed ==",
        snapshot.waiting_count(),
        summary.in_progress,
        summary.completed
    );
    match snapshot.current() {
        Some(current) => println!("Now serving: {}", entry_line(current)),
        None => println!("Now serving: -"),
    }
    for entry in &snapshot.waiting {
        let wait = entry.estimated_wait_label().unwrap_or_default();
        println!("  #{:<3} {} {}", entry.position, entry_line(entry), wait);
    }
}

fn print_sessions(view: &ChatSessionsView) {
    let summary = &view.summary;
    println!(
        "\n== Chats: {} total, {} emergency, {} urgent, {} need a reply ==",
        summary.total, summary.emergency, summary.urgent, summary.needs_response
    );
    for session in &view.sessions {
        let last = session
            .last_message
            .as_ref()
            .map(|m| m.content.as_str())
            .unwrap_or("");
        println!(
            "  {:<10?} {:<8?} {:<24} {:>3} unread  {}",
            session.severity,
            session.effective_response_status(),
            session.patient.name,
            session.unread_count,
            last
        );
    }
}

/// Returns false once the toast channel is gone.
fn print_toast(toast: Result<Toast, RecvError>) -> bool {
    match toast {
        Ok(toast) => {
            let marker = match toast.level {
                ToastLevel::Success => "+",
                ToastLevel::Info => "i",
                ToastLevel::Error => "!",
            };
            eprintln!("{} {}: {}", marker, toast.title, toast.message);
            true
        }
        Err(RecvError::Lagged(skipped)) => {
            warn!("Dropped {} notifications", skipped);
            true
        }
        Err(RecvError::Closed) => false,
    }
}

fn session_ended(event: Result<SessionEvent, RecvError>) -> bool {
    match event {
        Ok(SessionEvent::Expired) => {
            eprintln!("! Your session has expired. Run `hospital-desk login` to sign in again.");
            true
        }
        Ok(SessionEvent::SignedOut) => true,
        Ok(SessionEvent::SignedIn(_)) | Err(RecvError::Lagged(_)) => false,
        Err(RecvError::Closed) => true,
    }
}
