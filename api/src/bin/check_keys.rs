//! Validate the on-disk key set and regenerate it when needed
//!
//! ```text
//! check_keys [--force-new] [--keys-dir DIR]
//! ```
//!
//! Exits non-zero when no usable key set could be produced.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use dotenv::dotenv;

use kw_api::config::Config;
use kw_core::services::{KeyRotationEngine, RotationStatus};

#[derive(Debug, Parser)]
#[command(name = "check_keys", about = "Validate and (re)generate Keyward key material")]
struct Args {
    /// Replace the key set even if the current one is valid
    #[arg(long)]
    force_new: bool,

    /// Key directory, overriding KEYS_DIR
    #[arg(long, value_name = "DIR")]
    keys_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));

    let args = Args::parse();
    let mut key_config = Config::from_env().key_rotation();
    if let Some(dir) = args.keys_dir {
        key_config = key_config.with_keys_dir(dir);
    }
    let keys_dir = key_config.keys_dir.clone();
    let engine = KeyRotationEngine::with_file_store(key_config);
    let now = Utc::now();

    if args.force_new {
        return match engine.force_rotate(now) {
            Ok(material) => {
                println!(
                    "Generated new key set in {} (expires {})",
                    keys_dir.display(),
                    material.expires_at().to_rfc3339()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Key rotation failed: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match engine.check_rotation_status(now) {
        Ok(RotationStatus::Valid { days_left }) => {
            println!("Keys in {} are valid for {} more days", keys_dir.display(), days_left);
            ExitCode::SUCCESS
        }
        Ok(RotationStatus::ExpiringSoon { days_left }) => {
            println!(
                "WARNING: keys in {} expire in {} days; run with --force-new to rotate",
                keys_dir.display(),
                days_left
            );
            ExitCode::SUCCESS
        }
        Ok(RotationStatus::Regenerated { expires_at }) => {
            println!(
                "Keys in {} were missing, corrupted or expired; generated a new set (expires {})",
                keys_dir.display(),
                expires_at.to_rfc3339()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Key check failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
