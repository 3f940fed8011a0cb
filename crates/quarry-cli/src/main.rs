use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "quarry",
    about = "Quarry — topology planner for distributed data-query clusters",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a cluster configuration
    Validate {
        /// Path to the cluster configuration JSON document
        #[arg(short, long)]
        config: String,
        /// Region used for region-dependent checks (FIPS endpoints)
        #[arg(short, long)]
        region: Option<String>,
    },
    /// Run the full declaration pass and emit the planned topology as JSON
    Plan {
        #[arg(short, long)]
        config: String,
        /// TOML profile with resolved endpoints (buckets, database, secrets)
        #[arg(short, long)]
        endpoints: Option<String>,
        #[arg(short, long)]
        region: Option<String>,
        /// Write the plan here instead of stdout
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Print the rendered bootstrap script for one planned node group
    Render {
        #[arg(short, long)]
        config: String,
        #[arg(short, long)]
        endpoints: Option<String>,
        #[arg(short, long)]
        region: Option<String>,
        /// Group id, e.g. `data_hot` or `zookeeper-2`
        #[arg(short, long)]
        group: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quarry=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config, region } => {
            commands::validate::validate(&config, region.as_deref())
        }
        Commands::Plan {
            config,
            endpoints,
            region,
            out,
        } => commands::plan::plan(
            &config,
            endpoints.as_deref(),
            region.as_deref(),
            out.as_deref(),
        ),
        Commands::Render {
            config,
            endpoints,
            region,
            group,
        } => commands::render::render(&config, endpoints.as_deref(), region.as_deref(), &group),
    }
}
