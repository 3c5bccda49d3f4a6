mod batch;
mod display;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{DateTime, FixedOffset, Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use meldepflicht_core::{
    CARRIERS, FORM_SCHEMA, FormMapper, FormOptions, IncidentRecord, Organization,
    calculate_deadlines, evaluate, explain, identify_carrier,
};
use serde::de::DeserializeOwned;

#[derive(Parser)]
#[command(name = "meldepflicht", version, about = "Workplace incident reporting obligations")]
struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = Format::Text, env = "MELDEPFLICHT_FORMAT")]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Determine which authorities must be notified.
    Evaluate {
        /// Incident record (JSON).
        incident: PathBuf,
    },
    /// Compute notification deadlines for an incident.
    Deadlines {
        incident: PathBuf,
        /// Incident time (RFC 3339). Defaults to the record's date and time.
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
        /// UTC offset of the record's wall-clock time, e.g. `+01:00`.
        /// Defaults to the system time zone.
        #[arg(long, value_parser = parse_offset, env = "MELDEPFLICHT_UTC_OFFSET")]
        utc_offset: Option<FixedOffset>,
    },
    /// Summarize the reporting obligations in plain language.
    Explain { incident: PathBuf },
    /// Build and validate the accident report.
    Generate {
        incident: PathBuf,
        /// Organization record (JSON).
        #[arg(long)]
        organization: PathBuf,
        /// Form options (JSON).
        #[arg(long, env = "MELDEPFLICHT_FORM_OPTIONS")]
        options: Option<PathBuf>,
        /// Attach the compliance determination to the report.
        #[arg(long)]
        with_compliance: bool,
    },
    /// Identify the insurance carrier for a membership number.
    Carrier { membership_id: String },
    /// List configured insurance carriers.
    Carriers,
    /// Show the accident report schema.
    Schema,
    /// Evaluate every incident file in a directory.
    Batch {
        dir: PathBuf,
        /// Maximum number of files evaluated concurrently.
        #[arg(long, default_value_t = 8)]
        jobs: usize,
    },
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

fn parse_offset(s: &str) -> Result<FixedOffset, String> {
    s.trim()
        .parse()
        .map_err(|e| format!("expected a UTC offset such as +01:00: {e}"))
}

/// Explicit `--at` first, else the record's date and time in the given (or the
/// system) time zone.
fn incident_instant(
    incident: &IncidentRecord,
    at: Option<DateTime<Utc>>,
    utc_offset: Option<FixedOffset>,
) -> Option<DateTime<Utc>> {
    at.or_else(|| match utc_offset {
        Some(offset) => incident.occurred_at_in(&offset),
        None => incident.occurred_at_in(&Local),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {what} {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {what} {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let json = cli.format == Format::Json;

    match cli.command {
        Command::Evaluate { incident } => {
            let incident: IncidentRecord = read_json(&incident, "incident")?;
            let determination = evaluate(&incident);
            if json {
                display::print_json(&determination)?;
            } else {
                display::print_determination(&determination);
            }
        }

        Command::Deadlines {
            incident,
            at,
            utc_offset,
        } => {
            let incident: IncidentRecord = read_json(&incident, "incident")?;
            let incident_at = match incident_instant(&incident, at, utc_offset) {
                Some(t) => t,
                None => bail!("incident has no usable date; pass --at"),
            };
            let deadlines = calculate_deadlines(&evaluate(&incident), incident_at);
            if json {
                display::print_json(&deadlines)?;
            } else {
                display::print_deadlines(&deadlines);
            }
        }

        Command::Explain { incident } => {
            let incident: IncidentRecord = read_json(&incident, "incident")?;
            let summary = explain(&evaluate(&incident));
            if json {
                display::print_json(&summary)?;
            } else {
                print!("{summary}");
            }
        }

        Command::Generate {
            incident,
            organization,
            options,
            with_compliance,
        } => {
            let incident: IncidentRecord = read_json(&incident, "incident")?;
            let organization: Organization = read_json(&organization, "organization")?;
            let options = match options {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading form options {}", path.display()))?;
                    FormOptions::from_json(&raw)
                        .with_context(|| format!("parsing form options {}", path.display()))?
                }
                None => FormOptions::default(),
            };

            let mapper = FormMapper::new(options);
            let form = if with_compliance {
                mapper.generate_with_compliance(&incident, &organization, evaluate(&incident))
            } else {
                mapper.generate(&incident, &organization)
            };
            if json {
                display::print_json(&form)?;
            } else {
                display::print_form(&form);
            }
            if form.error {
                bail!("accident report could not be generated");
            }
        }

        Command::Carrier { membership_id } => {
            let carrier = identify_carrier(&membership_id);
            if json {
                display::print_json(&carrier)?;
            } else {
                display::print_carrier(&membership_id, carrier);
            }
        }

        Command::Carriers => {
            if json {
                display::print_json(CARRIERS)?;
            } else {
                display::print_carriers();
            }
        }

        Command::Schema => {
            if json {
                display::print_json(FORM_SCHEMA)?;
            } else {
                display::print_schema();
            }
        }

        Command::Batch { dir, jobs } => {
            tracing::info!("meldepflicht v{}", env!("CARGO_PKG_VERSION"));
            let (entries, stats) = batch::run_batch(&dir, jobs).await?;
            if json {
                display::print_json(&serde_json::json!({
                    "entries": entries,
                    "stats": stats,
                }))?;
            } else {
                batch::print_batch(&entries, &stats);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_rfc3339_instants() {
        let t = parse_instant("2024-03-15T09:30:00+01:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-03-15T08:30:00+00:00");
        assert!(parse_instant("15.03.2024").is_err());
    }

    #[test]
    fn record_time_is_read_in_the_given_offset() {
        let incident: IncidentRecord = serde_json::from_value(serde_json::json!({
            "date": "2024-03-15",
            "time": "08:30",
            "fatality": true,
        }))
        .unwrap();
        let cet = parse_offset("+01:00").unwrap();
        let at = incident_instant(&incident, None, Some(cet)).unwrap();
        assert_eq!(at.to_rfc3339(), "2024-03-15T07:30:00+00:00");

        let deadlines = calculate_deadlines(&evaluate(&incident), at);
        assert_eq!(
            deadlines[0].due_at.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-03-15T08:30:00+00:00")
        );
    }

    #[test]
    fn explicit_instant_wins_over_record_time() {
        let incident = IncidentRecord {
            date: Some("2024-03-15".into()),
            ..Default::default()
        };
        let at = parse_instant("2024-03-16T12:00:00Z").unwrap();
        let cet = parse_offset("+01:00").unwrap();
        assert_eq!(incident_instant(&incident, Some(at), Some(cet)), Some(at));
        assert!(incident_instant(&IncidentRecord::default(), None, Some(cet)).is_none());
        assert!(parse_offset("MEZ").is_err());
    }

    #[test]
    fn format_flag_is_global() {
        let cli = Cli::try_parse_from(["meldepflicht", "schema", "--format", "json"]).unwrap();
        assert!(cli.format == Format::Json);
        assert!(matches!(cli.command, Command::Schema));
    }

    #[test]
    fn generate_requires_organization() {
        assert!(Cli::try_parse_from(["meldepflicht", "generate", "incident.json"]).is_err());
    }
}
