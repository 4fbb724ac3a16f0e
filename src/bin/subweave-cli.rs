use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use subweave::config::load_config;
use subweave::convert::{Document, SubFormat};

#[derive(Parser)]
#[command(name = "subweave-cli")]
#[command(about = "Offline tooling for the subscription weaving service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a service configuration file
    Check {
        /// Path to the TOML configuration
        #[arg(default_value = "config.toml")]
        config: PathBuf,

        /// Print the app summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Weave a local provider document into a local template
    Convert {
        /// Wire format of both documents (clash or surge)
        #[arg(short, long)]
        format: String,

        /// Path to the group template
        #[arg(short, long)]
        template: PathBuf,

        /// Path to the provider document
        #[arg(short, long)]
        input: PathBuf,

        /// Request URL substituted into managed-config directives
        #[arg(short, long, default_value = "http://localhost:8080/sub")]
        url: String,
    },
}

/// What `check` prints per app. Tokens stay out of the output.
#[derive(Serialize)]
struct AppSummary {
    name: String,
    clash: bool,
    surge: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config, json } => {
            let service = match load_config(&config) {
                Ok(service) => service,
                Err(err) => {
                    eprintln!("Error: {}", err);
                    std::process::exit(1);
                }
            };
            let apps: Vec<AppSummary> = service
                .apps
                .iter()
                .map(|app| AppSummary {
                    name: app.name.clone(),
                    clash: app.templates.clash.is_some(),
                    surge: app.templates.surge.is_some(),
                })
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&apps)?);
            } else {
                println!("{}: ok, {} app(s)", config.display(), apps.len());
                for app in &apps {
                    let mut formats = Vec::new();
                    if app.clash {
                        formats.push("clash");
                    }
                    if app.surge {
                        formats.push("surge");
                    }
                    println!("  {} [{}]", app.name, formats.join(", "));
                }
            }
        }
        Commands::Convert {
            format,
            template,
            input,
            url,
        } => {
            let format = SubFormat::from_name(&format)
                .ok_or("format must be one of: clash, surge")?;
            let original_text = std::fs::read_to_string(&input)?;
            let template_text = std::fs::read_to_string(&template)?;

            let (original, original_meta) = Document::parse(format, &original_text)?;
            let (template, template_meta) = Document::parse(format, &template_text)?;
            let woven = Document::merge(original, template)?;
            let metadata = original_meta.or(template_meta);
            print!("{}", woven.serialize(&metadata, &url)?);
        }
    }

    Ok(())
}
