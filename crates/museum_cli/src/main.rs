//! `museum` command-line front end.
//!
//! # Responsibility
//! - Drive the public booking flow and the admin table from a terminal.
//! - Resolve configuration from the environment (and `.env`) once per run.
//!
//! # Invariants
//! - All storage access goes through `museum_core::Gateway`.
//! - Visitor details are printed to stdout only, never logged.

mod ticket;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use log::info;
use museum_core::{
    init_logging, init_stderr_logging, AdminConsole, AdminGate, BookingService, Gateway,
    LocalDbLocation, PortalConfig, Reservation, ReservationDraft, ReservationFilter,
    ReservationPatch, ReservationStatus, VisitTime,
};
use ticket::Ticket;

#[derive(Debug, Parser)]
#[command(name = "museum", version, about = "Museum visit reservations")]
struct Cli {
    /// Keep local-mode data in memory for this run only.
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the selected backend and configuration state.
    Status,
    /// List the bookable visit-time slots.
    Slots,
    /// Book a visit through the public form rules.
    Book(BookArgs),
    /// Print the confirmation ticket for a booking.
    Ticket { id: String },
    /// Manage bookings behind the admin passcode.
    Admin(AdminArgs),
}

#[derive(Debug, Args)]
struct FormArgs {
    #[arg(long)]
    name: String,
    /// Visitor category, e.g. student or teacher.
    #[arg(long)]
    identity: String,
    #[arg(long)]
    phone: String,
    /// Visit date as YYYY-MM-DD.
    #[arg(long)]
    date: NaiveDate,
    /// Hourly slot from 09:00 to 16:00.
    #[arg(long, default_value = "09:00")]
    time: VisitTime,
    #[arg(long, default_value = "")]
    remarks: String,
}

impl FormArgs {
    fn into_draft(self) -> ReservationDraft {
        ReservationDraft {
            name: self.name,
            identity: self.identity,
            phone: self.phone,
            visit_date: self.date,
            visit_time: self.time,
            remarks: self.remarks,
        }
    }
}

#[derive(Debug, Args)]
struct BookArgs {
    #[command(flatten)]
    form: FormArgs,
}

#[derive(Debug, Args)]
struct AdminArgs {
    #[arg(long)]
    passcode: String,

    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Debug, Subcommand)]
enum AdminCommand {
    /// List bookings, newest submitted first.
    List {
        /// Matches name, phone, identity or id.
        #[arg(long)]
        search: Option<String>,
        /// Exact visit date as YYYY-MM-DD.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Add a booking without the public visit-date rule.
    Add(FormArgs),
    /// Change selected fields of a booking.
    Edit(EditArgs),
    /// Set a booking's status.
    SetStatus {
        id: String,
        /// confirmed, cancelled or visited.
        status: ReservationStatus,
    },
    /// Delete a booking.
    Delete { id: String },
}

#[derive(Debug, Args)]
struct EditArgs {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    identity: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    time: Option<VisitTime>,
    /// Pass an empty string to clear remarks.
    #[arg(long)]
    remarks: Option<String>,
    #[arg(long)]
    status: Option<ReservationStatus>,
}

impl EditArgs {
    fn into_patch(self) -> (String, ReservationPatch) {
        let patch = ReservationPatch {
            name: self.name,
            identity: self.identity,
            phone: self.phone,
            visit_date: self.date,
            visit_time: self.time,
            remarks: self.remarks,
            status: self.status,
        };
        (self.id, patch)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = PortalConfig::from_env().context("invalid portal configuration")?;
    if cli.ephemeral {
        config.local_db = LocalDbLocation::Memory;
    }
    start_logging(&config)?;

    let gateway = Gateway::from_config(&config).context("failed to open reservation store")?;
    info!(
        "event=cli_start module=cli status=ok mode={} ephemeral={}",
        gateway.mode(),
        cli.ephemeral
    );

    match cli.command {
        Command::Status => print_status(&config, &gateway),
        Command::Slots => {
            for slot in BookingService::new(&gateway).time_slots() {
                println!("{slot}");
            }
        }
        Command::Book(args) => {
            let today = Local::now().date_naive();
            let created = BookingService::new(&gateway).submit(args.form.into_draft(), today)?;
            print!("{}", Ticket(&created));
        }
        Command::Ticket { id } => {
            let reservation = BookingService::new(&gateway)
                .confirmation(&id)
                .ok_or_else(|| anyhow!("no reservation found for id {id}"))?;
            print!("{}", Ticket(&reservation));
        }
        Command::Admin(args) => {
            let gate = AdminGate::new(config.admin_passcode.clone());
            let console = AdminConsole::unlock(&gateway, &gate, &args.passcode)?;
            run_admin(&console, args.command)?;
        }
    }

    Ok(())
}

fn start_logging(config: &PortalConfig) -> Result<()> {
    let started = match &config.log_dir {
        Some(dir) => {
            let dir = dir
                .to_str()
                .ok_or_else(|| anyhow!("log directory is not valid UTF-8"))?;
            init_logging(&config.log_level, dir)
        }
        None => init_stderr_logging(&config.log_level),
    };
    started.map_err(|message| anyhow!(message))
}

fn print_status(config: &PortalConfig, gateway: &Gateway) {
    println!("mode: {}", gateway.mode());
    match &config.remote {
        Some(remote) => println!("remote endpoint: {}", remote.endpoint()),
        None if config.remote_rejected => {
            println!("remote endpoint: rejected (incomplete or malformed settings)")
        }
        None => println!("remote endpoint: not configured"),
    }
    if config.remote.is_none() {
        match &config.local_db {
            LocalDbLocation::File(path) => println!("local store: {}", path.display()),
            LocalDbLocation::Memory => println!("local store: in-memory"),
        }
        println!("simulated latency: {}", config.simulate_latency);
    }
    println!(
        "admin passcode: {}",
        if config.admin_passcode.is_some() {
            "configured"
        } else {
            "not configured"
        }
    );
    println!("reservations: {}", gateway.list().len());
    if gateway.degraded_reads() > 0 {
        println!("warning: reservation store could not be read");
    }
}

fn run_admin(console: &AdminConsole<'_>, command: AdminCommand) -> Result<()> {
    match command {
        AdminCommand::List { search, date } => {
            let filter = ReservationFilter {
                term: search,
                visit_date: date,
            };
            let rows = console.list(&filter);
            if rows.is_empty() {
                println!("no reservations");
            }
            for reservation in &rows {
                println!("{}", table_row(reservation));
            }
        }
        AdminCommand::Add(form) => {
            let created = console.create(form.into_draft())?;
            println!("added {}", created.id);
        }
        AdminCommand::Edit(args) => {
            let (id, patch) = args.into_patch();
            let updated = console.edit(&id, patch)?;
            println!("{}", table_row(&updated));
        }
        AdminCommand::SetStatus { id, status } => {
            let updated = console.set_status(&id, status)?;
            println!("{} is now {}", updated.id, updated.status);
        }
        AdminCommand::Delete { id } => {
            console.remove(&id)?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn table_row(reservation: &Reservation) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{} {}\t{}\t{}",
        reservation.id,
        reservation.name,
        reservation.identity,
        reservation.phone,
        reservation.visit_date,
        reservation.visit_time,
        reservation.status,
        reservation.remarks
    )
}
