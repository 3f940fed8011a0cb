use super::load_config;

pub fn validate(config_path: &str, region: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path, region)?;
    println!(
        "✓ {} is a valid {} cluster ({} node groups)",
        config_path,
        config.cluster_name,
        config.hosting().map(|h| h.len()).unwrap_or(0)
    );
    Ok(())
}
