use pomofomo_core::format::{format_duration, format_timestamp};
use pomofomo_core::{Config, SessionHistory, SessionRecord};

use super::{open_store, runtime};

pub fn run(limit: Option<usize>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let limit = limit.unwrap_or(config.history.limit);
    let (db, identity) = open_store()?;

    if identity.user()?.is_none() {
        eprintln!("not signed in; run `pomofomo-cli auth login <user>`");
    }

    let history = SessionHistory::new(identity, db);
    let records = runtime()?.block_on(history.list_recent(limit))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("no sessions recorded yet");
    }
    for record in &records {
        println!("{}", format_row(record));
    }
    Ok(())
}

/// `3/14 9:05  Pomodoro   25m 0s`
pub(crate) fn format_row(record: &SessionRecord) -> String {
    format!(
        "{:<11} {:<10} {}",
        format_timestamp(record.created_at),
        record.mode.label(),
        format_duration(record.duration_secs)
    )
}
