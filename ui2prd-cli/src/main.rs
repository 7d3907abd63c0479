mod cli;
mod prompts;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use ui2prd_core::credentials::{self, save_api_key};
use ui2prd_core::{
    export, get_config_path, group_by_region, mask_key, resolve_api_key_from_env, Analyzer,
    AppConfig, Completion, FileKeyValueStore, GeminiClient, ImagePayload, ItemField, KeySource,
    MockVisionClient, Session, SystemClipboard, TableEditor, VisionClient,
};

use crate::cli::{Cli, Command, ConfigCommand, ExportFormat, KeyCommand};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = AppConfig::load_default()?;

    match &cli.command {
        Command::Analyze {
            image,
            csv_dir,
            region,
            format,
            json,
            copy,
            response_file,
        } => {
            let session = run_analysis(&config, image, response_file.as_deref())?;

            if let Some(dir) = csv_dir {
                write_csv_files(&session, dir)?;
            }

            if let Some(region) = region {
                print_region(&session, region, *format, *copy)?;
            } else if *json {
                println!("{}", serde_json::to_string_pretty(session.store().items())?);
            } else if csv_dir.is_none() {
                print_groups(&session);
            }
        }
        Command::Key(key_cmd) => {
            handle_key_command(key_cmd)?;
        }
        Command::Config(config_cmd) => {
            handle_config_command(config_cmd, &config)?;
        }
    }

    Ok(())
}

fn run_analysis(
    config: &AppConfig,
    image_source: &str,
    response_file: Option<&Path>,
) -> Result<Session> {
    let image = ImagePayload::from_source(image_source, config.max_image_bytes).with_context(|| {
        format!("Failed to load screenshot: {}", describe_source(image_source))
    })?;

    let client: Arc<dyn VisionClient>;
    let api_key;
    match response_file {
        Some(path) => {
            let reply = fs::read_to_string(path)
                .with_context(|| format!("Failed to read response file: {:?}", path))?;
            client = Arc::new(MockVisionClient::new(&reply));
            api_key = "offline".to_string();
        }
        None => {
            client = Arc::new(GeminiClient::from_config(config)?);
            api_key = obtain_api_key()?;
        }
    }
    let analyzer = Analyzer::new(client);

    let mut session = Session::new();
    session.load_image(image);

    eprintln!(
        "{}",
        format!(
            "Analyzing {} with {}...",
            describe_source(image_source),
            analyzer.describe()
        )
        .dimmed()
    );
    let job = session.start_analysis(&analyzer, Some(api_key))?;
    let generation = job.generation();
    let result = job.wait();

    match session.finish_analysis(generation, result) {
        Completion::Applied(count) => {
            eprintln!("{}", format!("Found {} items", count).green());
            Ok(session)
        }
        Completion::Failed | Completion::Stale => {
            let message = session
                .notice()
                .map(|n| n.message())
                .unwrap_or_else(|| "Analysis failed".to_string());
            bail!(message)
        }
    }
}

/// Short display form of an image argument; data URLs are not echoed in full
fn describe_source(source: &str) -> String {
    if source.trim_start().starts_with("data:") {
        format!("inline data URL ({} chars)", source.len())
    } else {
        source.to_string()
    }
}

/// Uses the saved or environment key, prompting when there is none
fn obtain_api_key() -> Result<String> {
    let mut store = FileKeyValueStore::open_default()?;
    if let Some(key) = resolve_api_key_from_env(&store)? {
        log::info!("Using API key from {:?}", key.source);
        return Ok(key.value);
    }

    println!("{}", "No API key found.".yellow());
    let key = prompts::prompt_api_key()?;
    if key.is_empty() {
        bail!("An API key is required to analyze screenshots");
    }
    if prompts::confirm_save_key()? {
        save_api_key(&mut store, &key)?;
        println!("Key saved to {}", store.path().display());
    }
    Ok(key)
}

fn print_groups(session: &Session) {
    let groups = group_by_region(session.store().items());
    if groups.is_empty() {
        println!("{}", "No requirements found.".yellow());
        return;
    }

    for group in groups {
        println!();
        println!(
            "{} {}",
            group.name.blue().bold(),
            format!("({})", group.len()).dimmed()
        );
        println!("{}", "-".repeat(60));
        for (index, item) in group.items.iter().enumerate() {
            println!("{:>3}. {}", index + 1, item.function_name.bold());
            for field in &ItemField::COLUMNS[1..] {
                let value = item.field(*field);
                if !value.is_empty() {
                    println!("     {}: {}", field.header().dimmed(), value);
                }
            }
        }
    }
}

fn print_region(session: &Session, region: &str, format: ExportFormat, copy: bool) -> Result<()> {
    let editor = TableEditor::new(region);
    let rows = editor.rows(session.store());
    if rows.is_empty() {
        let known: Vec<&str> = group_by_region(session.store().items())
            .iter()
            .map(|g| g.name)
            .collect();
        bail!(
            "Region '{}' not found. Available regions: {}",
            region,
            known.join(", ")
        );
    }

    let count = rows.len();
    let text = match format {
        ExportFormat::Csv => export::to_csv(rows.iter().copied()),
        ExportFormat::Tsv => export::to_tsv(rows.iter().copied()),
    };
    if let Some(text) = text {
        println!("{}", text);
    }

    if copy {
        if let Some(tsv) = export::to_tsv(rows) {
            copy_and_serve(&tsv, count)?;
        }
    }
    Ok(())
}

/// Puts `text` on the clipboard and, on Linux, keeps this process alive as
/// the selection owner until something else is copied
fn copy_and_serve(text: &str, count: usize) -> Result<()> {
    let mut clipboard = SystemClipboard::new()?;
    eprintln!(
        "{}",
        format!("Copying {} rows to the clipboard", count).green()
    );
    if cfg!(all(
        unix,
        not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
    )) {
        eprintln!(
            "{}",
            "Keeping the clipboard contents available until they are replaced...".dimmed()
        );
    }
    clipboard.set_text_and_wait(text)?;
    Ok(())
}

fn write_csv_files(session: &Session, dir: &Path) -> Result<()> {
    for group in group_by_region(session.store().items()) {
        if let Some(csv) = export::export_region_csv(group.name, group.items) {
            let path = csv.write_to_dir(dir)?;
            println!("{} {}", "Wrote".green(), path.display());
        }
    }
    Ok(())
}

fn handle_key_command(cmd: &KeyCommand) -> Result<()> {
    let mut store = FileKeyValueStore::open_default()?;

    match cmd {
        KeyCommand::Set { value } => {
            let key = match value {
                Some(v) => v.trim().to_string(),
                None => prompts::prompt_api_key()?,
            };
            if key.is_empty() {
                bail!("API key cannot be empty (use `ui2prd key clear` to remove it)");
            }
            save_api_key(&mut store, &key)?;
            println!("{}", "API key saved.".green());
        }
        KeyCommand::Show => match resolve_api_key_from_env(&store)? {
            Some(key) => {
                let source = match key.source {
                    KeySource::Stored => store.path().display().to_string(),
                    KeySource::Environment(var) => format!("${}", var),
                };
                println!("{} {}", mask_key(&key.value), format!("({})", source).dimmed());
            }
            None => println!("{}", "No API key configured.".yellow()),
        },
        KeyCommand::Clear => {
            credentials::clear_api_key(&mut store)?;
            println!("{}", "Saved API key removed.".green());
        }
    }

    Ok(())
}

fn handle_config_command(cmd: &ConfigCommand, config: &AppConfig) -> Result<()> {
    match cmd {
        ConfigCommand::Path => {
            println!("{}", get_config_path()?.display());
        }
        ConfigCommand::Show => {
            let yaml = serde_yaml::to_string(config).context("Failed to render config")?;
            print!("{}", yaml);
        }
        ConfigCommand::Init { force } => {
            let path = get_config_path()?;
            if AppConfig::init(&path, *force)? {
                println!("{} {}", "Wrote".green(), path.display());
            } else {
                println!(
                    "{} {} (use --force to overwrite)",
                    "Config already exists:".yellow(),
                    path.display()
                );
            }
        }
    }
    Ok(())
}
