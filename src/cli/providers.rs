//! Providers command implementation

use std::path::Path;

use anyhow::Result;

use chorus::config::Config;
use chorus::provider::ProviderManager;

/// Show discovery and login state of every provider
pub async fn providers_command(work_dir: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = Config::load(work_dir, config_path)?;
    let manager = ProviderManager::with_config(&config);
    let statuses = manager.provider_statuses().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!("Providers ({}):\n", statuses.len());

    for status in statuses {
        let marker = if status.active { "*" } else { " " };
        println!("{} {} ({})", marker, status.display_name, status.id);

        match &status.cli.path {
            Some(path) if status.cli.found => println!("    CLI: {}", path.display()),
            _ => {
                println!("    CLI: not found");
                if let Some(cmd) = &status.cli.install_command {
                    println!("    Install: {}", cmd);
                }
            }
        }

        if let Some(auth) = &status.auth {
            if auth.authenticated {
                match &auth.user {
                    Some(user) => println!("    Auth: {}", user),
                    None => println!("    Auth: ok"),
                }
            } else {
                println!(
                    "    Auth: {}",
                    auth.error.as_deref().unwrap_or("not authenticated")
                );
                println!("    Login: {}", status.id.auth_command());
            }
        }

        println!();
    }

    Ok(())
}
