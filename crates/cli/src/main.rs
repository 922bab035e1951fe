//! Operational CLI for the ward queue engine.
//!
//! State (queue catalog, patient/professional directories, membership and
//! audit rows) persists between invocations as a JSON document, standing in
//! for the shared relational store of a full deployment. Domain errors are
//! printed with their machine-readable code and mapped to exit codes the
//! way an HTTP layer would map them to statuses: caller mistakes exit 2,
//! internal invariant violations exit 70.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ward_core::{
    AdmissionController, CoreConfig, MemoryPatientDirectory, MemoryProfessionalDirectory,
    MemoryQueueCatalog, MemoryStore, QueueCatalog, QueueError, StoreState,
};
use ward_types::{PatientId, ProfessionalId, QueueId};

const EXIT_DOMAIN_ERROR: i32 = 2;
const EXIT_INTERNAL_ERROR: i32 = 70;

/// Everything the engine needs between invocations.
#[derive(Serialize, Deserialize)]
struct EngineState {
    catalog: MemoryQueueCatalog,
    patients: MemoryPatientDirectory,
    professionals: MemoryProfessionalDirectory,
    store: StoreState,
}

#[derive(Parser)]
#[command(name = "ward")]
#[command(about = "Patient queue and triage management CLI")]
struct Cli {
    /// Path to the JSON state file
    #[arg(long, default_value = "ward-state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a fresh state file with the standard queue catalog
    Seed {
        /// Known patient ids (comma-separated)
        patients: String,
        /// Known professional ids (comma-separated)
        #[arg(long, default_value = "")]
        professionals: String,
    },
    /// Place a patient into a queue
    Enqueue {
        patient: i64,
        queue: i64,
        /// Priority type (elderly, pregnant, infant, disabled)
        #[arg(long)]
        priority: Option<String>,
    },
    /// Take a patient out of their current queue
    Remove {
        patient: i64,
        /// Professional handling the removal
        #[arg(long)]
        professional: Option<i64>,
    },
    /// Move a patient to another queue
    Transfer {
        patient: i64,
        queue: i64,
        /// Professional handling the transfer
        #[arg(long)]
        professional: Option<i64>,
    },
    /// Discharge a patient from the hospital
    Discharge { patient: i64 },
    /// Show the ranked contents of a queue
    List {
        queue: i64,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        per_page: Option<usize>,
    },
    /// Show a patient's current membership and derived status
    Status { patient: i64 },
    /// Record an externally computed risk classification
    Classify {
        patient: i64,
        /// One of: emergency, very_urgent, urgent, less_urgent, non_urgent
        classification: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Commands::Seed {
        patients,
        professionals,
    } = &cli.command
    {
        let state = EngineState {
            catalog: MemoryQueueCatalog::standard(),
            patients: MemoryPatientDirectory::new(parse_id_list(patients)?.into_iter().map(PatientId)),
            professionals: MemoryProfessionalDirectory::new(
                parse_id_list(professionals)?.into_iter().map(ProfessionalId),
            ),
            store: StoreState::default(),
        };
        save_state(&cli.state, &state)?;
        println!("Seeded state file: {}", cli.state.display());
        for queue in state.catalog.queues() {
            println!("  queue {}: {}", queue.id, queue.name);
        }
        return Ok(());
    }

    let state = load_state(&cli.state)?;
    let store = Arc::new(MemoryStore::from_state(state.store));
    let catalog = Arc::new(state.catalog);
    let controller = AdmissionController::new(
        Arc::new(CoreConfig::default()),
        store.clone(),
        catalog.clone(),
        Arc::new(state.patients.clone()),
        Arc::new(state.professionals.clone()),
    );

    let outcome = run_command(&cli.command, &controller, &store, catalog.as_ref());
    match outcome {
        Ok(()) => {
            let updated = EngineState {
                catalog: catalog.as_ref().clone(),
                patients: state.patients,
                professionals: state.professionals,
                store: store.snapshot(),
            };
            save_state(&cli.state, &updated)?;
            Ok(())
        }
        Err(err) => {
            eprintln!("error [{}]: {err}", err.code());
            let code = if err.is_internal() {
                EXIT_INTERNAL_ERROR
            } else {
                EXIT_DOMAIN_ERROR
            };
            std::process::exit(code);
        }
    }
}

fn run_command(
    command: &Commands,
    controller: &AdmissionController,
    store: &MemoryStore,
    catalog: &MemoryQueueCatalog,
) -> Result<(), QueueError> {
    match command {
        // Handled before the state file is loaded.
        Commands::Seed { .. } => Ok(()),
        Commands::Enqueue {
            patient,
            queue,
            priority,
        } => {
            let priority_type = priority
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(QueueError::InvalidInput)?;
            let membership =
                controller.enqueue(PatientId(*patient), QueueId(*queue), priority_type)?;
            println!(
                "Enqueued patient {} (membership {}, status: {})",
                membership.patient_id,
                membership.id,
                membership.status(catalog)
            );
            Ok(())
        }
        Commands::Remove {
            patient,
            professional,
        } => {
            let membership = controller.remove(
                PatientId(*patient),
                professional.map(ProfessionalId),
            )?;
            println!(
                "Removed patient {} from queue (status: {})",
                membership.patient_id,
                membership.status(catalog)
            );
            Ok(())
        }
        Commands::Transfer {
            patient,
            queue,
            professional,
        } => {
            let membership = controller.transfer(
                PatientId(*patient),
                QueueId(*queue),
                professional.map(ProfessionalId),
            )?;
            println!(
                "Transferred patient {} (status: {})",
                membership.patient_id,
                membership.status(catalog)
            );
            Ok(())
        }
        Commands::Discharge { patient } => {
            let membership = controller.close(PatientId(*patient))?;
            println!(
                "Discharged patient {} at {}",
                membership.patient_id,
                membership
                    .hospital_exit
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default()
            );
            Ok(())
        }
        Commands::List {
            queue,
            page,
            per_page,
        } => {
            let listing = controller.list_queue(QueueId(*queue), *page, *per_page)?;
            let queue_name = catalog
                .get(QueueId(*queue))
                .map(|q| q.name.to_string())
                .unwrap_or_default();
            println!(
                "Queue {queue_name}: {} waiting ({} priority), page {}/{}",
                listing.total_items,
                listing.total_priority_count,
                listing.page,
                listing.total_pages.max(1)
            );
            let offset = (listing.page - 1) * listing.per_page;
            for (idx, entry) in listing.entries.iter().enumerate() {
                let classification = entry
                    .risk_classification
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "Unclassified".to_string());
                let priority = entry
                    .priority_type
                    .map(|p| format!(" [{p}]"))
                    .unwrap_or_default();
                println!(
                    "  {}. patient {} — {classification}{priority}, entered {}",
                    offset + idx + 1,
                    entry.patient_id,
                    entry.last_queue_entry.to_rfc3339()
                );
            }
            Ok(())
        }
        Commands::Status { patient } => {
            match controller.current_membership(PatientId(*patient))? {
                Some(membership) => println!(
                    "Patient {}: {} (membership {}, priority: {})",
                    membership.patient_id,
                    membership.status(catalog),
                    membership.id,
                    membership
                        .priority_type
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "none".to_string())
                ),
                None => println!("Patient {patient}: not admitted"),
            }
            Ok(())
        }
        Commands::Classify {
            patient,
            classification,
        } => {
            let classification = classification
                .parse()
                .map_err(QueueError::InvalidInput)?;
            store.record_risk_classification(PatientId(*patient), classification)?;
            println!("Recorded {classification} for patient {patient}");
            Ok(())
        }
    }
}

fn parse_id_list(input: &str) -> anyhow::Result<Vec<i64>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("invalid id '{s}'"))
        })
        .collect()
}

fn load_state(path: &Path) -> anyhow::Result<EngineState> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read state file {} (run 'ward seed' first)", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse state file {}", path.display()))
}

fn save_state(path: &Path, state: &EngineState) -> anyhow::Result<()> {
    let contents = serde_json::to_string_pretty(state).context("failed to serialise state")?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write state file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_list_handles_spaces_and_empties() {
        assert_eq!(parse_id_list("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert!(parse_id_list("").unwrap().is_empty());
        assert!(parse_id_list("1,x").is_err());
    }

    #[test]
    fn test_state_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let state = EngineState {
            catalog: MemoryQueueCatalog::standard(),
            patients: MemoryPatientDirectory::new([PatientId(1)]),
            professionals: MemoryProfessionalDirectory::new([ProfessionalId(100)]),
            store: StoreState::default(),
        };
        save_state(&path, &state).unwrap();

        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded.catalog.queues(), state.catalog.queues());
    }

    #[test]
    fn test_commands_mutate_state_through_controller() {
        let store = Arc::new(MemoryStore::new());
        let catalog = MemoryQueueCatalog::standard();
        let controller = AdmissionController::new(
            Arc::new(CoreConfig::default()),
            store.clone(),
            Arc::new(catalog.clone()),
            Arc::new(MemoryPatientDirectory::new([PatientId(5)])),
            Arc::new(MemoryProfessionalDirectory::default()),
        );

        let enqueue = Commands::Enqueue {
            patient: 5,
            queue: 1,
            priority: Some("elderly".to_string()),
        };
        run_command(&enqueue, &controller, &store, &catalog).unwrap();
        assert!(controller.is_in_queue(PatientId(5), QueueId(1)).unwrap());

        let bad_priority = Commands::Enqueue {
            patient: 5,
            queue: 2,
            priority: Some("vip".to_string()),
        };
        let err = run_command(&bad_priority, &controller, &store, &catalog).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");

        let duplicate = Commands::Enqueue {
            patient: 5,
            queue: 1,
            priority: None,
        };
        let err = run_command(&duplicate, &controller, &store, &catalog).unwrap_err();
        assert_eq!(err.code(), "PATIENT_ALREADY_IN_QUEUE");
    }
}
