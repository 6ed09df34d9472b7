use anyhow::{Result, anyhow};
use std::process::ExitCode;
use std::sync::Arc;

use keyshare::shell::ShellConfig;
use keyshare::{AppConfig, KeyShare, Keychain, LogConfig, Shell, init_logging};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let config = AppConfig::load()?;
    config.ensure_dirs()?;
    init_logging(&LogConfig::from(&config))?;

    let is_new = keyshare::storage::is_missing(&config.vault_path);
    println!("Welcome to keyshare!");
    if is_new {
        println!("No vault found. Choose a MASTER password to create one.");
    } else {
        println!("Please enter your MASTER password to unlock your vault.");
    }

    let master = rpassword::prompt_password("Master Password: ")
        .map_err(|e| anyhow!("Error reading master password: {}", e))?;
    if master.is_empty() {
        return Err(anyhow!("master password cannot be empty"));
    }

    if is_new {
        let confirm = rpassword::prompt_password("Confirm Master Password: ")
            .map_err(|e| anyhow!("Error reading master password: {}", e))?;
        if confirm != master {
            return Err(anyhow!("passwords do not match"));
        }
    }

    let keychain = Arc::new(Keychain::open_or_create(&config.vault_path, &master)?);
    let host = KeyShare::new(keychain.clone(), keychain);

    let shell = Shell::with_config(ShellConfig::new(config.history_path.clone()));
    shell.run(&host)
}
