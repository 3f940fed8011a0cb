use anyhow::bail;

use super::{load_config, load_endpoints};

pub fn render(
    config_path: &str,
    endpoints_path: Option<&str>,
    region: Option<&str>,
    group_id: &str,
) -> anyhow::Result<()> {
    let config = load_config(config_path, region)?;
    let endpoints = load_endpoints(endpoints_path)?;

    let graph = quarry_plan::plan(&config, &endpoints)?;
    let Some(group) = graph.group(group_id) else {
        let known: Vec<&str> = graph.groups().iter().map(|g| g.id.as_str()).collect();
        bail!("unknown group {group_id:?}; planned groups: {}", known.join(", "));
    };

    print!("{}", group.bootstrap);
    Ok(())
}
