use {anyhow::Result, shion_config::ShionConfig};

/// Print the resolved settings as JSON with secrets redacted.
///
/// Invalid settings are returned as an error, so the process exits non-zero.
pub fn show() -> Result<()> {
    let config = shion_config::from_env()?;
    println!("{}", render(&config)?);
    Ok(())
}

fn render(config: &ShionConfig) -> Result<String> {
    Ok(serde_json::to_string_pretty(&config.to_redacted_json())?)
}
