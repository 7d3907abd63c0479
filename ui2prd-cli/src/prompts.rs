use anyhow::Result;
use inquire::{Confirm, Password, PasswordDisplayMode};

/// Prompts for an API key without echoing it
pub fn prompt_api_key() -> Result<String> {
    let key = Password::new("Gemini API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Get a key at https://aistudio.google.com/apikey")
        .prompt()?;
    Ok(key.trim().to_string())
}

/// Asks whether a key entered for this run should be saved
pub fn confirm_save_key() -> Result<bool> {
    Ok(Confirm::new("Save this key for future runs?")
        .with_default(true)
        .prompt()?)
}
