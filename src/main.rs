//! Carbonpark CLI
//!
//! Command-line front end for the park monitoring backend:
//! - Device inventory CRUD with client-side filtering
//! - Emission records, reports, and exports
//! - Prediction runs
//! - User administration
//! - IoT mock control panel with task watching

use anyhow::Context;
use carbonpark::client::{ApiClient, ExportFormat, SessionStore};
use carbonpark::config::{generate_default_config, Config};
use carbonpark::model::{
    DeviceFilter, DeviceForm, DeviceStatus, EmissionForm, GenerateParams, PredictionInterval,
    PredictionRequest, ScenarioIntensity, ScenarioParams, TaskKind, UserForm, UserRole,
};
use carbonpark::store::{DeviceStore, TaskMonitor, TaskParams};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "carbonpark")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Logistics-park carbon-emission monitoring client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (default: standard locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session
    Login {
        username: String,
        /// Password (read from CARBONPARK_PASSWORD when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// End the session
    Logout,

    /// Show the authenticated account
    Whoami,

    /// Device inventory
    Devices {
        #[command(subcommand)]
        command: DeviceCommands,
    },

    /// Emission records and reports
    Emissions {
        #[command(subcommand)]
        command: EmissionCommands,
    },

    /// Emission predictions
    Predictions {
        #[command(subcommand)]
        command: PredictionCommands,
    },

    /// User administration
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// IoT mock data generator control panel
    Mock {
        #[command(subcommand)]
        command: MockCommands,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum DeviceCommands {
    /// List devices, filtered client-side
    List {
        /// Filter by device category
        #[arg(long = "type")]
        device_type: Option<String>,
        /// Filter by status (active, inactive, maintenance)
        #[arg(long)]
        status: Option<String>,
        /// Filter by location substring
        #[arg(long)]
        location: Option<String>,
        /// Filter by reporting flag
        #[arg(long)]
        active: Option<bool>,
        /// Search name, asset tag, and description
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one device
    Get { id: String },

    /// Create a device
    Create {
        #[arg(long)]
        name: String,
        #[arg(long = "type")]
        device_type: String,
        #[arg(long, default_value = "active")]
        status: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Update device fields
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        device_type: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Patch a device's operational status
    SetStatus { id: String, status: String },

    /// Delete a device
    Delete { id: String },

    /// Show historical readings for a device
    Data {
        id: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Sample interval (hour, day, ...)
        #[arg(long)]
        interval: Option<String>,
    },
}

#[derive(Subcommand)]
enum EmissionCommands {
    /// List emission records
    List {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },

    /// Record an emission measurement
    Create {
        #[arg(long)]
        date: String,
        #[arg(long)]
        total_co2: f64,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete an emission record
    Delete { id: String },

    /// List generated reports
    Reports,

    /// Show one report
    Report { id: String },

    /// Mark a report finalized
    FinalizeReport { id: String },

    /// Delete a report
    DeleteReport { id: String },

    /// Download an export document
    Export {
        /// excel or pdf
        format: String,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
}

#[derive(Subcommand)]
enum PredictionCommands {
    /// List available models
    Models,

    /// Show one computed prediction
    Get { id: String },

    /// List previously computed predictions
    History,

    /// Show a prediction's accuracy
    Accuracy { id: String },

    /// Run an analysis
    Run {
        #[arg(long)]
        model: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// daily, weekly, or monthly
        #[arg(long, default_value = "daily")]
        interval: String,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List accounts
    List,

    /// Create an account
    Create {
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
        /// admin, manager, or user
        #[arg(long, default_value = "user")]
        role: String,
    },

    /// Delete an account
    Delete { id: String },
}

#[derive(Subcommand)]
enum MockCommands {
    /// Show generator status
    Status,

    /// Start the data generator
    Start,

    /// Stop the data generator
    Stop,

    /// Push generated devices into the inventory
    SyncDevices,

    /// Reload the generator's device templates
    Reload,

    /// Force one immediate data publication round
    Publish,

    /// Submit a device-generation task
    Generate {
        /// random, basic, logistics, or carbon
        kind: String,
        #[arg(long)]
        count: Option<u32>,
        /// Poll the task until it finishes
        #[arg(long)]
        watch: bool,
    },

    /// Show one simulator device
    GetDevice { id: String },

    /// Create a simulator device
    CreateDevice {
        #[arg(long)]
        name: String,
        #[arg(long = "type")]
        device_type: String,
    },

    /// Update a simulator device
    UpdateDevice {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        device_type: Option<String>,
    },

    /// Delete a simulator device
    DeleteDevice { id: String },

    /// Submit a scenario simulation task
    Simulate {
        /// vehicle-entry, loading, loading-async, carbon-peak,
        /// carbon-reduction, workday-peak, or night
        kind: String,
        #[arg(long)]
        duration: Option<u64>,
        /// low, medium, or high
        #[arg(long)]
        intensity: Option<String>,
        /// Poll the task until it finishes
        #[arg(long)]
        watch: bool,
    },

    /// Show one task's status
    Task { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_logging(&config);

    // `config` needs no client at all
    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("writing config to {path:?}"))?;
                println!("Wrote default config to {}", path.display());
            }
            None => print!("{content}"),
        }
        return Ok(());
    }

    let session = Arc::new(SessionStore::open(&config.session.file));
    let client = Arc::new(ApiClient::new(&config.api, session.clone())?);

    match cli.command {
        Commands::Config { .. } => unreachable!("handled above"),

        Commands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => std::env::var("CARBONPARK_PASSWORD")
                    .context("pass --password or set CARBONPARK_PASSWORD")?,
            };
            let user = client.login(&username, &password).await?;
            println!("Logged in as {} ({:?})", user.username, user.role);
        }

        Commands::Logout => {
            if let Err(e) = client.logout().await {
                // Local session is gone either way
                tracing::warn!("Backend logout failed: {}", e);
            }
            println!("Logged out");
        }

        Commands::Whoami => {
            let user = client.current_user().await?;
            println!(
                "{} <{}> role={:?}",
                user.username,
                user.email.as_deref().unwrap_or("-"),
                user.role
            );
        }

        Commands::Devices { command } => run_devices(client, command).await?,
        Commands::Emissions { command } => run_emissions(client, command).await?,
        Commands::Predictions { command } => run_predictions(client, command).await?,
        Commands::Users { command } => run_users(client, command).await?,
        Commands::Mock { command } => run_mock(client, &config, command).await?,
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| format!("carbonpark={}", config.logging.level)),
    );

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn run_devices(client: Arc<ApiClient>, command: DeviceCommands) -> anyhow::Result<()> {
    let store = DeviceStore::new(client.clone());

    match command {
        DeviceCommands::List {
            device_type,
            status,
            location,
            active,
            search,
        } => {
            store.load_all().await?;
            store
                .set_filters(DeviceFilter {
                    device_type,
                    status: status.as_deref().map(parse_status).transpose()?,
                    location,
                    is_active: active,
                })
                .await;
            if let Some(term) = search {
                store.set_search_term(term).await;
            }

            let snapshot = store.snapshot().await;
            if snapshot.filtered.is_empty() {
                println!("No devices match");
                return Ok(());
            }
            println!(
                "{:<10} {:<24} {:<12} {:<12} {:<8} LOCATION",
                "ID", "NAME", "TYPE", "STATUS", "ACTIVE"
            );
            for device in &snapshot.filtered {
                println!(
                    "{:<10} {:<24} {:<12} {:<12} {:<8} {}",
                    device.id,
                    device.name,
                    device.device_type,
                    device.status,
                    device.is_active,
                    device.location.as_deref().unwrap_or("-"),
                );
            }
            println!(
                "{} of {} devices shown",
                snapshot.filtered.len(),
                snapshot.total
            );
        }

        DeviceCommands::Get { id } => {
            let device = store.fetch_by_id(&id).await?;
            println!("{}", serde_json::to_string_pretty(&device)?);
        }

        DeviceCommands::Create {
            name,
            device_type,
            status,
            location,
            description,
        } => {
            let device = store
                .create(&DeviceForm {
                    name: Some(name),
                    device_type: Some(device_type),
                    status: Some(parse_status(&status)?),
                    location,
                    description,
                    ..Default::default()
                })
                .await?;
            println!("Created device {} ({})", device.id, device.name);
        }

        DeviceCommands::Update {
            id,
            name,
            device_type,
            location,
            description,
        } => {
            let device = store
                .update(
                    &id,
                    &DeviceForm {
                        name,
                        device_type,
                        location,
                        description,
                        ..Default::default()
                    },
                )
                .await?;
            println!("Updated device {}", device.id);
        }

        DeviceCommands::SetStatus { id, status } => {
            let device = store.set_status(&id, parse_status(&status)?).await?;
            println!("Device {} is now {}", device.id, device.status);
        }

        DeviceCommands::Delete { id } => {
            store.remove(&id).await?;
            println!("Deleted device {id}");
        }

        DeviceCommands::Data {
            id,
            start,
            end,
            interval,
        } => {
            let readings = client
                .device_data(&id, start.as_deref(), end.as_deref(), interval.as_deref())
                .await?;
            if readings.is_empty() {
                println!("No data in range");
                return Ok(());
            }
            println!(
                "{:<26} {:>12} {:>12} {:>8}",
                "TIMESTAMP", "ENERGY", "CO2", "HOURS"
            );
            for reading in &readings {
                println!(
                    "{:<26} {:>12.2} {:>12.2} {:>8.1}",
                    reading.timestamp.to_rfc3339(),
                    reading.energy_consumption,
                    reading.co2_emission,
                    reading.operational_hours,
                );
            }
        }
    }

    Ok(())
}

async fn run_emissions(client: Arc<ApiClient>, command: EmissionCommands) -> anyhow::Result<()> {
    match command {
        EmissionCommands::List { start, end } => {
            let (records, total) = client
                .list_emissions(start.as_deref(), end.as_deref())
                .await?;
            if records.is_empty() {
                println!("No emission records");
                return Ok(());
            }
            println!(
                "{:<10} {:<12} {:>12} {:>10}",
                "ID", "DATE", "TOTAL CO2", "VS TARGET"
            );
            for record in &records {
                println!(
                    "{:<10} {:<12} {:>12.2} {:>10.2}",
                    record.id, record.date, record.total_co2, record.comparison_with_target
                );
            }
            println!("{} of {total} records shown", records.len());
        }

        EmissionCommands::Create {
            date,
            total_co2,
            notes,
        } => {
            let record = client
                .create_emission(&EmissionForm {
                    date,
                    total_co2,
                    sources_breakdown: None,
                    notes,
                })
                .await?;
            println!("Recorded emission {} for {}", record.id, record.date);
        }

        EmissionCommands::Delete { id } => {
            client.delete_emission(&id).await?;
            println!("Deleted emission record {id}");
        }

        EmissionCommands::Reports => {
            let reports = client.list_reports().await?;
            if reports.is_empty() {
                println!("No reports");
                return Ok(());
            }
            for report in &reports {
                println!(
                    "{:<10} {:<32} {} .. {} total={:.2} [{:?}]",
                    report.id,
                    report.title,
                    report.start_date,
                    report.end_date,
                    report.total_emission,
                    report.status,
                );
            }
        }

        EmissionCommands::Report { id } => {
            let report = client.get_report(&id).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        EmissionCommands::DeleteReport { id } => {
            client.delete_report(&id).await?;
            println!("Deleted report {id}");
        }

        EmissionCommands::FinalizeReport { id } => {
            let report = client
                .set_report_status(&id, carbonpark::model::ReportStatus::Finalized)
                .await?;
            println!("Report {} is now {:?}", report.id, report.status);
        }

        EmissionCommands::Export {
            format,
            output,
            start,
            end,
        } => {
            let format = match format.as_str() {
                "excel" => ExportFormat::Excel,
                "pdf" => ExportFormat::Pdf,
                other => anyhow::bail!("unknown export format: {other} (expected excel or pdf)"),
            };
            let bytes = client
                .export_emissions(format, start.as_deref(), end.as_deref())
                .await?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("writing export to {output:?}"))?;
            println!("Wrote {} bytes to {}", bytes.len(), output.display());
        }
    }

    Ok(())
}

async fn run_predictions(
    client: Arc<ApiClient>,
    command: PredictionCommands,
) -> anyhow::Result<()> {
    match command {
        PredictionCommands::Models => {
            let models = client.list_prediction_models().await?;
            if models.is_empty() {
                println!("No models available");
                return Ok(());
            }
            for model in &models {
                println!(
                    "{:<10} {:<24} accuracy={:.2} {}",
                    model.id,
                    model.name,
                    model.accuracy,
                    model.description.as_deref().unwrap_or(""),
                );
            }
        }

        PredictionCommands::Get { id } => {
            let result = client.get_prediction(&id).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        PredictionCommands::History => {
            let results = client.prediction_history().await?;
            if results.is_empty() {
                println!("No prediction history");
                return Ok(());
            }
            for result in &results {
                println!(
                    "{:<10} model={:<10} {} .. {} accuracy={:.2}",
                    result.id, result.model_id, result.start_date, result.end_date, result.accuracy,
                );
            }
        }

        PredictionCommands::Accuracy { id } => {
            let accuracy = client.prediction_accuracy(&id).await?;
            match accuracy.sample_count {
                Some(n) => println!("accuracy={:.3} over {n} samples", accuracy.accuracy),
                None => println!("accuracy={:.3}", accuracy.accuracy),
            }
        }

        PredictionCommands::Run {
            model,
            start,
            end,
            interval,
        } => {
            let interval = match interval.as_str() {
                "daily" => PredictionInterval::Daily,
                "weekly" => PredictionInterval::Weekly,
                "monthly" => PredictionInterval::Monthly,
                other => anyhow::bail!("unknown interval: {other}"),
            };
            let result = client
                .run_prediction(&PredictionRequest {
                    model_id: model,
                    start_date: start,
                    end_date: end,
                    interval,
                    include_confidence_interval: Some(true),
                })
                .await?;

            println!("Prediction {} (accuracy {:.2})", result.id, result.accuracy);
            for point in &result.results {
                match (point.lower_bound, point.upper_bound) {
                    (Some(lo), Some(hi)) => println!(
                        "{:<12} {:>10.2}  [{:.2} .. {:.2}]",
                        point.date, point.predicted_co2, lo, hi
                    ),
                    _ => println!("{:<12} {:>10.2}", point.date, point.predicted_co2),
                }
            }
        }
    }

    Ok(())
}

async fn run_users(client: Arc<ApiClient>, command: UserCommands) -> anyhow::Result<()> {
    match command {
        UserCommands::List => {
            let users = client.list_users().await?;
            for user in &users {
                println!(
                    "{:<10} {:<20} {:<28} {:?}",
                    user.id,
                    user.username,
                    user.email.as_deref().unwrap_or("-"),
                    user.role,
                );
            }
        }

        UserCommands::Create {
            username,
            password,
            email,
            role,
        } => {
            let role = match role.as_str() {
                "admin" => UserRole::Admin,
                "manager" => UserRole::Manager,
                "user" => UserRole::User,
                other => anyhow::bail!("unknown role: {other}"),
            };
            let user = client
                .create_user(&UserForm {
                    username: Some(username),
                    password: Some(password),
                    email,
                    role: Some(role),
                })
                .await?;
            println!("Created user {} ({})", user.id, user.username);
        }

        UserCommands::Delete { id } => {
            client.delete_user(&id).await?;
            println!("Deleted user {id}");
        }
    }

    Ok(())
}

async fn run_mock(
    client: Arc<ApiClient>,
    config: &Config,
    command: MockCommands,
) -> anyhow::Result<()> {
    let monitor = TaskMonitor::new(
        client.clone(),
        Duration::from_secs(config.polling.interval_secs),
    );

    match command {
        MockCommands::Status => {
            let status = client.mock_system_status().await?;
            println!(
                "Generator: {} | devices={} uploads={} uptime={:.0}s",
                status.status, status.active_devices, status.recent_data_uploads, status.uptime,
            );
            for error in &status.errors {
                println!("  error: {error}");
            }
        }

        MockCommands::Start => {
            client.start_mock_generation().await?;
            println!("Generator started");
        }

        MockCommands::Stop => {
            client.stop_mock_generation().await?;
            println!("Generator stopped");
        }

        MockCommands::SyncDevices => {
            client.sync_mock_devices().await?;
            println!("Generated devices synced into inventory");
        }

        MockCommands::Reload => {
            client.reload_mock_data().await?;
            println!("Generator templates reloaded");
        }

        MockCommands::Publish => {
            client.publish_mock_data().await?;
            println!("Publication round triggered");
        }

        MockCommands::Generate { kind, count, watch } => {
            let kind = match kind.as_str() {
                "random" => TaskKind::GenerateRandom,
                "basic" => TaskKind::GenerateBasic,
                "logistics" => TaskKind::GenerateLogistics,
                "carbon" => TaskKind::GenerateCarbon,
                other => anyhow::bail!("unknown generation kind: {other}"),
            };
            let params = TaskParams::Generate(GenerateParams {
                count,
                ..Default::default()
            });
            submit_and_watch(&monitor, config, kind, &params, watch).await?;
        }

        MockCommands::GetDevice { id } => {
            let device = client.get_mock_device(&id).await?;
            println!("{}", serde_json::to_string_pretty(&device)?);
        }

        MockCommands::CreateDevice { name, device_type } => {
            let device = client
                .create_mock_device(&DeviceForm {
                    name: Some(name),
                    device_type: Some(device_type),
                    ..Default::default()
                })
                .await?;
            println!("Created simulator device {} ({})", device.id, device.name);
        }

        MockCommands::UpdateDevice {
            id,
            name,
            device_type,
        } => {
            let device = client
                .update_mock_device(
                    &id,
                    &DeviceForm {
                        name,
                        device_type,
                        ..Default::default()
                    },
                )
                .await?;
            println!("Updated simulator device {}", device.id);
        }

        MockCommands::DeleteDevice { id } => {
            client.delete_mock_device(&id).await?;
            println!("Deleted simulator device {id}");
        }

        MockCommands::Simulate {
            kind,
            duration,
            intensity,
            watch,
        } => {
            let kind = match kind.as_str() {
                "vehicle-entry" => TaskKind::VehicleEntry,
                "loading" => TaskKind::Loading,
                "loading-async" => TaskKind::LoadingAsync,
                "carbon-peak" => TaskKind::CarbonPeak,
                "carbon-reduction" => TaskKind::CarbonReduction,
                "workday-peak" => TaskKind::WorkdayPeak,
                "night" => TaskKind::Night,
                other => anyhow::bail!("unknown scenario kind: {other}"),
            };
            let intensity = match intensity.as_deref() {
                None => None,
                Some("low") => Some(ScenarioIntensity::Low),
                Some("medium") => Some(ScenarioIntensity::Medium),
                Some("high") => Some(ScenarioIntensity::High),
                Some(other) => anyhow::bail!("unknown intensity: {other}"),
            };
            let params = TaskParams::Scenario(ScenarioParams {
                duration,
                intensity,
                ..Default::default()
            });
            submit_and_watch(&monitor, config, kind, &params, watch).await?;
        }

        MockCommands::Task { id } => {
            let task = monitor.poll(&id).await?;
            print_task(&task);
        }
    }

    Ok(())
}

async fn submit_and_watch(
    monitor: &TaskMonitor,
    config: &Config,
    kind: TaskKind,
    params: &TaskParams,
    watch: bool,
) -> anyhow::Result<()> {
    let task_id = monitor.submit(kind, params).await?;

    let Some(task_id) = task_id else {
        println!("Accepted (no task to track)");
        return Ok(());
    };
    println!("Submitted task {task_id}");

    if !watch {
        return Ok(());
    }

    monitor.start_polling();
    let interval = Duration::from_secs(config.polling.interval_secs);
    loop {
        tokio::time::sleep(interval).await;
        let running = monitor.running_tasks().await;
        if running.is_empty() {
            break;
        }
        for task in &running {
            println!("  {} {} {:.0}%", task.id, task.status, task.progress);
        }
    }
    monitor.stop_polling();

    for task in monitor.tasks().await {
        print_task(&task);
    }
    Ok(())
}

fn print_task(task: &carbonpark::model::MockTask) {
    println!(
        "task {} [{}] {} {:.0}%{}",
        task.id,
        task.kind,
        task.status,
        task.progress,
        task.error
            .as_deref()
            .map(|e| format!(" error: {e}"))
            .unwrap_or_default(),
    );
}

fn parse_status(s: &str) -> anyhow::Result<DeviceStatus> {
    match s {
        "active" => Ok(DeviceStatus::Active),
        "inactive" => Ok(DeviceStatus::Inactive),
        "maintenance" => Ok(DeviceStatus::Maintenance),
        other => {
            anyhow::bail!("unknown status: {other} (expected active, inactive, or maintenance)")
        }
    }
}
