//! Text and image backends for pixelpet.
//!
//! [`ProcessGenerator`] talks newline-delimited JSON-RPC to an external
//! command; [`OfflineGenerator`] answers locally without any service.

pub mod offline;
pub mod process;
pub mod protocol;

pub use offline::OfflineGenerator;
pub use process::{ProcessConfig, ProcessGenerator};

use pixelpet_config::GeneratorSettings;
use pixelpet_core::generate::Generator;

/// Build the backend described by `settings`.
///
/// Falls back to the offline generator when no command is configured or
/// `force_offline` is set.
pub fn from_settings(settings: &GeneratorSettings, force_offline: bool) -> Box<dyn Generator> {
    match ProcessConfig::from_settings(settings) {
        Some(config) if !force_offline => {
            tracing::info!(command = %config.command, "using process generator");
            Box::new(ProcessGenerator::new(config))
        }
        _ => {
            tracing::info!("using offline generator");
            Box::new(OfflineGenerator::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_command_means_offline() {
        let gen = from_settings(&GeneratorSettings::default(), false);
        assert_eq!(gen.name(), "offline");
    }

    #[test]
    fn offline_flag_wins_over_command() {
        let settings = GeneratorSettings {
            command: Some("my-backend".into()),
            ..GeneratorSettings::default()
        };
        assert_eq!(from_settings(&settings, true).name(), "offline");
        assert_eq!(from_settings(&settings, false).name(), "process");
    }
}
