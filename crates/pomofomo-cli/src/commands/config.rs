use clap::Subcommand;
use pomofomo_core::{Config, ConfigKey};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting (e.g. "presets.focus_min", "history.limit")
    Get { key: ConfigKey },
    /// Change one setting and report the old and new value
    Set { key: ConfigKey, value: String },
    /// Print every setting
    List {
        /// Print the whole file as JSON
        #[arg(long)]
        json: bool,
    },
    /// Describe the available keys
    Keys,
    /// Restore defaults and show what changed
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => println!("{}", Config::load()?.get(key)),
        ConfigAction::Set { key, value } => {
            let change = Config::load()?.set(key, &value)?;
            println!("{change}");
        }
        ConfigAction::List { json: true } => {
            println!("{}", serde_json::to_string_pretty(&Config::load()?)?);
        }
        ConfigAction::List { json: false } => {
            for (key, value) in Config::load()?.entries() {
                println!("{key} = {value}");
            }
        }
        ConfigAction::Keys => {
            for key in ConfigKey::ALL {
                println!("{:<36} {}", key.name(), key.description());
            }
        }
        ConfigAction::Reset => {
            let current = Config::load_or_default();
            let defaults = Config::default();
            defaults.save()?;
            let changes = current.diff(&defaults);
            if changes.is_empty() {
                println!("config already at defaults");
            }
            for change in changes {
                println!("{change}");
            }
        }
    }
    Ok(())
}
