//! Seat catalog and schedule status commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use boxoffice_core::error::AppError;
use boxoffice_core::types::ScheduleId;
use boxoffice_database::repositories::seat::NewSeat;
use boxoffice_entity::seat::{Seat, SeatStatus};

use crate::output::{self, OutputFormat};

/// Arguments for the seat command
#[derive(Debug, Args)]
pub struct SeatArgs {
    /// Seat subcommand
    #[command(subcommand)]
    pub command: SeatCommand,
}

/// Seat subcommands
#[derive(Debug, Subcommand)]
pub enum SeatCommand {
    /// Create the seat catalog of a schedule
    Seed {
        /// Schedule ID
        #[arg(long)]
        schedule: ScheduleId,
        /// Row labels, comma separated
        #[arg(long, value_delimiter = ',', default_value = "A,B,C,D,E")]
        rows: Vec<String>,
        /// Seats per row
        #[arg(long, default_value_t = 10)]
        per_row: i32,
        /// Section label
        #[arg(long, default_value = "R")]
        section: String,
    },
    /// List the seat catalog of a schedule
    List {
        /// Schedule ID
        #[arg(long)]
        schedule: ScheduleId,
    },
    /// Count seats per status for a schedule
    Status {
        /// Schedule ID
        #[arg(long)]
        schedule: ScheduleId,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct SeatRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Seat")]
    label: String,
    #[tabled(rename = "Section")]
    section: String,
}

impl From<&Seat> for SeatRow {
    fn from(seat: &Seat) -> Self {
        Self {
            id: seat.id.get(),
            label: seat.label(),
            section: seat.section.clone(),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct StatusRow {
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Seats")]
    count: i64,
}

/// Build the catalog rows for `rows` × `per_row`.
fn layout(rows: &[String], per_row: i32, section: &str) -> Vec<NewSeat> {
    rows.iter()
        .map(|row| row.trim())
        .filter(|row| !row.is_empty())
        .flat_map(|row| {
            (1..=per_row).map(move |number| NewSeat {
                section: section.to_string(),
                row_label: row.to_string(),
                number,
            })
        })
        .collect()
}

/// Execute seat commands
pub async fn execute(
    args: &SeatArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let db = super::connect_db(&config).await?;

    match &args.command {
        SeatCommand::Seed {
            schedule,
            rows,
            per_row,
            section,
        } => {
            if *per_row < 1 {
                return Err(AppError::validation("--per-row must be at least 1"));
            }
            let seats = layout(rows, *per_row, section);
            let inserted = db.seats().create_many(*schedule, &seats).await?;
            output::print_success(&format!(
                "Created {inserted} of {} seats for schedule {schedule}",
                seats.len()
            ));
        }
        SeatCommand::List { schedule } => {
            let seats = db.seats().find_by_schedule(*schedule).await?;
            let rows: Vec<SeatRow> = seats.iter().map(SeatRow::from).collect();
            output::print_list(&rows, format);
        }
        SeatCommand::Status { schedule } => {
            let total = db.seats().count_by_schedule(*schedule).await?;
            let counts = db.reservations().count_by_status(*schedule).await?;
            let recorded: i64 = counts.iter().map(|(_, count)| count).sum();

            let mut rows: Vec<StatusRow> = counts
                .into_iter()
                .map(|(status, count)| StatusRow {
                    status: status.to_string(),
                    count,
                })
                .collect();
            rows.push(StatusRow {
                status: format!("{} (untouched)", SeatStatus::Available),
                count: (total - recorded).max(0),
            });
            output::print_list(&rows, format);
        }
    }

    db.close().await;
    Ok(())
}
