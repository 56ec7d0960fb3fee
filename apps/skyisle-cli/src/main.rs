use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use skyisle_persist::PersistedState;
use skyisle_render::{
    DebugTextRenderer, HeadlessLoader, Renderer, SceneResources, Viewport, plan_frame,
};
use skyisle_scene::{SceneLayout, ViewerConfig, ViewerState};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skyisle-cli", about = "Headless tool for the skyisle viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON viewer config; every field is optional
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Program state file
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the resolved configuration
    Info,
    /// Inspect or reset the saved program state
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// Print the frame plan for the saved state
    Plan {
        /// Resource root the asset paths are resolved against
        #[arg(long)]
        resources: Option<PathBuf>,
        /// Seed for meteor placement; random when omitted
        #[arg(long)]
        seed: Option<u64>,
        /// List every lit draw
        #[arg(long)]
        draws: bool,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// Print the saved state, or defaults when there is none
    Show,
    /// Overwrite the saved state with defaults
    Reset,
}

impl Cli {
    fn viewer_config(&self) -> anyhow::Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ViewerConfig::default(),
        };
        if let Some(state_file) = &self.state_file {
            config.state_file = state_file.clone();
        }
        Ok(config)
    }
}

fn describe_state(state: &PersistedState) -> String {
    let c = state.clear_color;
    let p = state.camera_position;
    let f = state.camera_front;
    format!(
        "clear color:     ({:.3}, {:.3}, {:.3})\n\
         overlay enabled: {}\n\
         camera position: ({:.3}, {:.3}, {:.3})\n\
         camera front:    ({:.3}, {:.3}, {:.3})",
        c.x, c.y, c.z, state.overlay_enabled, p.x, p.y, p.z, f.x, f.y, f.z
    )
}

fn reset_state(path: &Path) -> anyhow::Result<()> {
    PersistedState::default()
        .save_to_file(path)
        .with_context(|| format!("resetting {}", path.display()))?;
    tracing::info!("program state at {} reset to defaults", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = cli.viewer_config()?;

    match cli.command {
        Commands::Info => {
            println!("skyisle-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("input: {}", skyisle_input::crate_info());
            println!("persist: {}", skyisle_persist::crate_info());
            println!("scene: {}", skyisle_scene::crate_info());
            println!("assets: {}", skyisle_assets::crate_info());
            println!("render: {}", skyisle_render::crate_info());
            println!("window: {}x{}", config.window_width, config.window_height);
            println!("resources: {}", config.resources_dir.display());
            println!("state file: {}", config.state_file.display());
        }
        Commands::State { action } => match action {
            StateAction::Show => {
                let path = &config.state_file;
                match PersistedState::read(path)? {
                    Some(state) => {
                        println!("{}:", path.display());
                        println!("{}", describe_state(&state));
                    }
                    None => {
                        println!("{} does not exist; defaults apply:", path.display());
                        println!("{}", describe_state(&PersistedState::default()));
                    }
                }
            }
            StateAction::Reset => reset_state(&config.state_file)?,
        },
        Commands::Plan {
            resources,
            seed,
            draws,
        } => {
            let resources_dir = resources.unwrap_or(config.resources_dir.clone());
            let persisted = PersistedState::load_or_default(&config.state_file);
            let layout = match seed {
                Some(seed) => SceneLayout::generate(&mut rand::rngs::StdRng::seed_from_u64(seed)),
                None => SceneLayout::generate(&mut rand::rng()),
            };
            let mut state = ViewerState::from_persisted(&persisted, config.camera, layout);
            state.advance_light(0.0);

            tracing::info!(
                "planning {}x{} frame against {}",
                config.window_width,
                config.window_height,
                resources_dir.display()
            );
            let mut loader = HeadlessLoader::new();
            let scene = SceneResources::load(&mut loader, &resources_dir);
            let viewport = Viewport::new(config.window_width, config.window_height);
            let plan = plan_frame(&state, &scene, viewport);

            let mut renderer = DebugTextRenderer { verbose: draws };
            print!("{}", renderer.render(&plan));
            println!("textures requested: {}", loader.textures.len());
            println!("models requested: {}", loader.models.len());
        }
    }

    Ok(())
}
