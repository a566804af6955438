use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "hospital-desk")]
#[command(about = "Terminal front desk for the hospital web API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(long, default_value = "doctor")]
        role: String,
        #[arg(long)]
        email: String,
        /// Falls back to HOSPITAL_PASSWORD
        #[arg(long, env = "HOSPITAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the session
    Logout,
    /// Admin dashboard counts and backend health
    Dashboard,
    /// Today's queue
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
    /// Chat consultations
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },
    /// Check a patient in from their QR code
    Checkin {
        /// Enter the code by hand instead of scanning
        #[arg(long)]
        code: Option<String>,
    },
    /// Patient records
    Patients {
        #[command(subcommand)]
        action: PatientAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum QueueAction {
    /// Keep the queue on screen, refreshing on the configured interval
    Watch,
    /// Call the next waiting patient
    CallNext,
    /// Skip a waiting patient
    Skip {
        queue_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Complete the consultation in progress
    Complete {
        queue_id: String,
        #[arg(long)]
        diagnosis: String,
        #[arg(long)]
        treatment: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Past queue entries
    History {
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "20")]
        limit: u32,
        #[arg(long)]
        status: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ChatAction {
    /// Keep the triage-sorted session list on screen
    Watch,
    /// Print one conversation
    Show { consultation_id: String },
    /// Reply to a patient
    Send { consultation_id: String, message: String },
    /// Close a chat consultation
    Complete {
        consultation_id: String,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PatientAction {
    /// Search by name, NIK or phone
    Search { term: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_queue_skip_parses_reason() {
        let cli = Cli::parse_from(["hospital-desk", "queue", "skip", "q-7", "--reason", "not present"]);
        match cli.command {
            Command::Queue {
                action: QueueAction::Skip { queue_id, reason },
            } => {
                assert_eq!(queue_id, "q-7");
                assert_eq!(reason.as_deref(), Some("not present"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
