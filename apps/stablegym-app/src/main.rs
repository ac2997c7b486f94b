//! stablegym command-line runner.
//!
//! - `list`: print the built-in environment catalog
//! - `info`: print an environment's spaces and default configuration
//! - `run`: roll out episodes headless and print cost statistics

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use rand_chacha::ChaCha8Rng;
use stablegym_core::config::EnvironmentConfig;
use stablegym_core::error::{ConfigError, StableGymError};
use stablegym_core::seed::{derive_seed, rng_from_seed};
use stablegym_core::traits::Simulator;
use stablegym_core::types::{Action, ActionSpace};
use stablegym_env::env::CostEnv;
use stablegym_env::registry::EnvRegistry;
use stablegym_env::stats::EpisodeStats;
use stablegym_envs::catalog::builtin_registry;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Cost-based control environments.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered environments.
    List,

    /// Print the spaces and default configuration of an environment.
    Info {
        /// Environment id, e.g. Oscillator-v1.
        id: String,
    },

    /// Run episodes locally and print cost statistics.
    Run {
        /// Environment id, e.g. Oscillator-v1.
        id: String,

        /// Number of episodes to run.
        #[arg(short = 'n', long, default_value_t = 1)]
        episodes: u32,

        /// Root seed. Episode seeds are derived from it.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Action policy.
        #[arg(short, long, value_enum, default_value_t = Policy::Zero)]
        policy: Policy,

        /// TOML file with a full environment configuration.
        #[arg(short, long, conflicts_with = "set")]
        config: Option<PathBuf>,

        /// TOML line merged over the family defaults (repeatable).
        #[arg(long)]
        set: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    /// All-zero action.
    Zero,
    /// Uniform samples from the action space.
    Random,
}

impl Policy {
    fn act(self, space: &ActionSpace, rng: &mut ChaCha8Rng) -> Action {
        match self {
            Self::Zero => Action::zeros(space.dim()),
            Self::Random => Action::new(space.sample(rng)),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run_list(registry: &EnvRegistry) {
    println!("{:<18} {:<14} {:>8}  {:<8} tracked", "id", "family", "horizon", "actions");
    for id in registry.ids() {
        let Some(family) = registry.family(id) else {
            continue;
        };
        println!(
            "{:<18} {:<14} {:>8}  {:<8} {}",
            id,
            family.name,
            family.max_episode_steps(),
            format!("{:?}", family.action_policy).to_lowercase(),
            family.tracked.join(", ")
        );
    }
}

fn run_info(registry: &EnvRegistry, id: &str) -> Result<(), StableGymError> {
    let env = registry.make(id)?;
    let family = env.family();
    println!("{id} ({})", family.name);
    println!("  simulator:   {}", env.simulator().name());
    println!("  observation: dim {}", env.observation_space().dim());
    println!(
        "  action:      low {:?} high {:?}",
        env.action_space().low(),
        env.action_space().high()
    );
    println!("  tracked:     {}", family.tracked.join(", "));
    if let Some(threshold) = family.cost_threshold {
        println!("  solved at:   mean episode cost < {threshold}");
    }
    let defaults = toml::to_string_pretty(env.config()).map_err(ConfigError::from)?;
    println!("\n[defaults]\n{defaults}");
    Ok(())
}

fn build(
    registry: &EnvRegistry,
    id: &str,
    config: Option<PathBuf>,
    set: &[String],
) -> Result<CostEnv, ConfigError> {
    if let Some(path) = config {
        return registry.make_with(id, EnvironmentConfig::from_file(path)?);
    }
    if set.is_empty() {
        registry.make(id)
    } else {
        registry.make_with_overrides(id, &set.join("\n"))
    }
}

fn run_episodes(
    env: &mut CostEnv,
    episodes: u32,
    seed: Option<u64>,
    policy: Policy,
) -> Result<EpisodeStats, StableGymError> {
    let root = seed.unwrap_or(env.config().seed);
    let mut rng = rng_from_seed(derive_seed(root, "policy"));
    let mut stats = EpisodeStats::new();

    for episode in 0..episodes {
        // The first reset roots the seed hierarchy; later ones derive from it.
        let reset_seed = (episode == 0).then_some(root);
        env.reset(reset_seed, None)?;
        loop {
            let action = policy.act(env.action_space(), &mut rng);
            let result = env.step(&action)?;
            if stats.observe(&result) {
                tracing::info!(
                    episode = episode + 1,
                    steps = result.info.episode_length,
                    cost = result.info.episode_cost,
                    terminated = result.terminated,
                    "episode finished"
                );
                break;
            }
        }
    }
    Ok(stats)
}

fn print_stats(stats: &EpisodeStats, threshold: Option<f64>) {
    println!(
        "\ntotal: episodes={}, steps={}, terminated={}",
        stats.episodes_completed, stats.total_steps, stats.terminated_count
    );
    if let (Some(length), Some(cost)) = (stats.mean_episode_length(), stats.mean_episode_cost()) {
        println!("mean: length={length:.1}, cost={cost:.3}");
    }
    if let Some(threshold) = threshold {
        println!("solved (< {threshold}): {}", stats.solved(threshold));
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn run(cli: Cli) -> Result<(), StableGymError> {
    let registry = builtin_registry()?;
    match cli.command {
        None | Some(Commands::List) => run_list(&registry),
        Some(Commands::Info { id }) => run_info(&registry, &id)?,
        Some(Commands::Run {
            id,
            episodes,
            seed,
            policy,
            config,
            set,
        }) => {
            let mut env = build(&registry, &id, config, &set)?;
            let stats = run_episodes(&mut env, episodes, seed, policy)?;
            print_stats(&stats, env.family().cost_threshold);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "stablegym failed");
            ExitCode::FAILURE
        }
    }
}
