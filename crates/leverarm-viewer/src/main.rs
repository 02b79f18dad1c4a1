//! Lever Arm Viewer - Native entry point

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use anyhow::Result;
    use clap::Parser;
    use leverarm_core::load_config;
    use leverarm_viewer::app;
    use std::path::PathBuf;
    use tracing::{info, Level};
    use tracing_subscriber::FmtSubscriber;

    #[derive(Parser, Debug)]
    #[command(name = "leverarm")]
    #[command(about = "Visualize sensor lever arms relative to a vehicle reference point")]
    #[command(version)]
    struct Args {
        /// Path to configuration file
        #[arg(short, long, default_value = "leverarm.toml")]
        config: PathBuf,

        /// Vehicle to load at startup (catalog key)
        #[arg(long)]
        vehicle: Option<String>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(short, long, default_value = "info")]
        log_level: String,

        /// Print the model catalog and exit
        #[arg(long)]
        print_catalog: bool,
    }

    pub fn main() -> Result<()> {
        let args = Args::parse();

        // Initialize logging
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .finish();

        tracing::subscriber::set_global_default(subscriber)?;

        info!("Lever Arm Visualizer v{}", env!("CARGO_PKG_VERSION"));

        let mut config = load_config(&args.config)?;
        if let Some(vehicle) = args.vehicle {
            config.vehicle.default = vehicle;
        }

        if args.print_catalog {
            let registry = config.load_registry()?;
            println!("{} models:", registry.len());
            for model in registry.iter() {
                println!(
                    "  - {} [{}] {} ({}, {} m at scale {})",
                    model.key,
                    model.kind,
                    model.display_name,
                    model.asset_path,
                    model.reference_size,
                    model.default_scale
                );
            }
            return Ok(());
        }

        app::run(config)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
