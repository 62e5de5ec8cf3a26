use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use ml_board_games::ai::{build_agent, AgentKind};
use ml_board_games::config::{AppConfig, GameKind};
use ml_board_games::game::{Othello, RuleEngine, Side, TicTacToe};
use ml_board_games::training::{side_seed, EpisodeDriver, IllegalMovePolicy, Trainer};

/// Train two reinforcement-learning agents against each other.
#[derive(Parser)]
#[command(name = "train", about = "Train Othello / Tic Tac Toe RL agents")]
struct Cli {
    /// Game to play
    #[arg(long, value_enum)]
    game: Option<GameKind>,

    /// Board side length (Othello only; even and >= 4)
    #[arg(long)]
    board_size: Option<usize>,

    /// Agent playing the first side (black / X)
    #[arg(long, value_enum, default_value_t = AgentKind::QLearning)]
    agent_a: AgentKind,

    /// Agent playing the second side (white / O)
    #[arg(long, value_enum, default_value_t = AgentKind::QLearning)]
    agent_b: AgentKind,

    /// Override number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Base path for the per-episode JSON results files
    #[arg(long)]
    results: Option<PathBuf>,

    /// Import previously saved tables/weights before training
    #[arg(long)]
    load: bool,

    /// Override the illegal-move policy
    #[arg(long, value_enum)]
    illegal_move_policy: Option<IllegalMovePolicy>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // CLI overrides
    if let Some(game) = cli.game {
        if game != app_config.game.kind {
            app_config.game.board_size = None;
        }
        app_config.game.kind = game;
    }
    if let Some(size) = cli.board_size {
        app_config.game.board_size = Some(size);
    }
    if let Some(episodes) = cli.episodes {
        app_config.training.num_episodes = episodes;
    }
    if let Some(results) = cli.results {
        app_config.training.results_path = Some(results);
    }
    if let Some(policy) = cli.illegal_move_policy {
        app_config.rules.illegal_move_policy = policy;
    }
    app_config.validate().context("invalid configuration")?;

    if cli.print_config {
        print!(
            "{}",
            toml::to_string_pretty(&app_config).context("serializing configuration")?
        );
        return Ok(());
    }

    let kinds = [cli.agent_a, cli.agent_b];
    match app_config.game.kind {
        GameKind::Othello => {
            let engine = Othello::with_size(app_config.game.effective_board_size())?;
            run(engine, kinds, &app_config, cli.load)
        }
        GameKind::TicTacToe => run(TicTacToe::new(), kinds, &app_config, cli.load),
    }
}

fn run<R: RuleEngine + Clone + 'static>(
    engine: R,
    kinds: [AgentKind; 2],
    config: &AppConfig,
    load: bool,
) -> Result<()> {
    let seed = config.training.seed;
    let mut agents = Side::BOTH.iter().map(|&side| {
        build_agent(
            kinds[side.index()],
            &engine,
            side,
            &config.tabular,
            &config.dqn,
            seed.map(|s| side_seed(s, side)),
        )
    });
    let (Some(first), Some(second)) = (agents.next(), agents.next()) else {
        anyhow::bail!("failed to build agents");
    };

    let mut driver = EpisodeDriver::new(
        engine,
        first,
        second,
        config.rewards.clone(),
        config.rules.illegal_move_policy,
    );
    let trainer = Trainer::new(config.training.clone());

    if load {
        trainer
            .load_agents(&mut driver, kinds)
            .context("loading saved agents")?;
    }

    let summary = trainer.train(&mut driver).context("training")?;
    log::info!(
        "{} episodes, {} cheated",
        summary.episodes,
        summary.cheated
    );

    if config.training.save_tables {
        let dir = trainer
            .save_agents(&driver, kinds)
            .context("saving agents")?;
        log::info!("Learned state saved under {}", dir.display());
    }
    Ok(())
}
