mod view;

use std::ops::ControlFlow;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use complex_automaton::{
    BoundaryMode, Command, CommandQueue, Coord, Driver, HeatRegulation, NullRender, SimConfig,
    SimulationClock, SugarRegrowth,
};
use piston_window::*;
use tracing::info;
use tracing_subscriber::EnvFilter;
use view::{Palette, PistonView};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Model {
    /// Agents foraging on a regrowing sugar field.
    Sugarscape,
    /// Heat regulation on a temperature field, no agents.
    Thermal,
}

/// Cellular automaton and agent population advanced in lock-step ticks.
#[derive(Parser, Debug)]
#[command(name = "complex-automaton", version)]
struct Cli {
    #[arg(long, value_enum, default_value_t = Model::Sugarscape)]
    model: Model,
    /// JSON file overriding the model's default configuration.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    /// Grid width in cells.
    #[arg(long, value_name = "CELLS")]
    width: Option<usize>,
    /// Grid height in cells.
    #[arg(long, value_name = "CELLS")]
    height: Option<usize>,
    /// Wrap the grid edges.
    #[arg(long)]
    toroidal: bool,
    /// Initial number of agents.
    #[arg(long)]
    agents: Option<usize>,
    /// Run without a window and log progress.
    #[arg(long)]
    headless: bool,
    /// Ticks to run in headless mode.
    #[arg(long, default_value_t = 500)]
    ticks: u64,
    /// Log a summary every N ticks in headless mode.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    report_every: u64,
    /// Logical ticks per second in window mode.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..=1000))]
    ups: u64,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let clock = build_clock(cli.model, config)?;

    if cli.headless {
        run_headless(cli.model, clock, cli.ticks, cli.report_every);
        Ok(())
    } else {
        run_window(cli.model, clock, cli.ups)
    }
}

fn load_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read config file {}", path.display()))?;
            SimConfig::from_json_str(&json)?
        }
        None => match cli.model {
            Model::Sugarscape => SimConfig::sugarscape(),
            Model::Thermal => SimConfig::thermal(),
        },
    };

    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }
    if cli.toroidal {
        config.boundary = BoundaryMode::Toroidal;
    }
    if let Some(agents) = cli.agents {
        config.agents.count = agents;
    }
    Ok(config)
}

fn build_clock(model: Model, config: SimConfig) -> Result<SimulationClock> {
    let builder = SimulationClock::builder(config.clone());
    let builder = match model {
        Model::Sugarscape => builder.rule(SugarRegrowth::from(&config.automaton)),
        Model::Thermal => builder.rule(HeatRegulation::new(config.automaton.max_value)),
    };
    builder.build().context("cannot initialize simulation")
}

fn centre_stimulus(clock: &SimulationClock) -> Command {
    let grid = clock.grid();
    Command::Stimulate {
        coord: Coord::new(grid.width() / 2, grid.height() / 2),
        value: grid.max_value(),
    }
}

fn run_headless(model: Model, clock: SimulationClock, ticks: u64, report_every: u64) {
    let heat = centre_stimulus(&clock);
    let mut driver = Driver::new(clock, NullRender, CommandQueue::new());
    driver.input_mut().push(Command::ToggleRun);
    if model == Model::Thermal {
        driver.input_mut().push(heat);
    }

    for _ in 0..ticks {
        if driver.iterate().is_break() {
            break;
        }
        let stats = driver.stats();
        if stats.ticks % report_every == 0 {
            info!(
                tick = stats.ticks,
                agents = stats.current_population(),
                births = stats.total_births,
                deaths = stats.total_deaths,
                mean_reserve = stats.mean_reserve(),
                resource = driver.clock().grid().total_value(),
                "progress"
            );
        }
    }

    let stats = driver.stats();
    info!(
        ticks = stats.ticks,
        max_population = stats.max_population,
        consumed = stats.resource_consumed,
        "headless run finished"
    );
}

fn run_window(model: Model, clock: SimulationClock, ups: u64) -> Result<()> {
    let side = clock.config().cell_size;
    let width = clock.grid().width() as f64 * side;
    let height = clock.grid().height() as f64 * side;
    let max_value = clock.grid().max_value();

    let mut window: PistonWindow =
        WindowSettings::new("Complex Automaton", [width as u32, height as u32])
            .exit_on_esc(true)
            .build()
            .map_err(|e| anyhow!("cannot open window: {e}"))?;
    window.set_ups(ups);

    let palette = match model {
        Model::Sugarscape => Palette::Sugar,
        Model::Thermal => Palette::Heat,
    };
    let mut driver = Driver::new(clock, PistonView::new(palette), CommandQueue::new());
    let mut cursor = [0.0, 0.0];

    info!("SPACE pauses/resumes, R resets, Q quits, left click heats a cell");

    while let Some(e) = window.next() {
        if let Some(pos) = e.mouse_cursor_args() {
            cursor = pos;
        }
        match e.press_args() {
            Some(Button::Keyboard(Key::Space)) => driver.input_mut().push(Command::ToggleRun),
            Some(Button::Keyboard(Key::R)) => driver.input_mut().push(Command::Reset),
            Some(Button::Keyboard(Key::Q)) => driver.input_mut().push(Command::Quit),
            Some(Button::Mouse(MouseButton::Left)) if cursor[0] >= 0.0 && cursor[1] >= 0.0 => {
                let coord = Coord::new((cursor[0] / side) as usize, (cursor[1] / side) as usize);
                driver.input_mut().push(Command::Stimulate {
                    coord,
                    value: max_value,
                });
            }
            _ => {}
        }

        if e.update_args().is_some() {
            if let ControlFlow::Break(()) = driver.pump_input() {
                break;
            }
            driver.advance();
        }

        if e.render_args().is_some() {
            driver.draw();
            window.set_title(driver.renderer().title().to_string());
            window.draw_2d(&e, |c, g, _| {
                clear([0.1, 0.1, 0.1, 1.0], g);
                driver.renderer().paint(c.transform, g);
            });
        }
    }
    Ok(())
}
