//! BESS arbitrage entry point: CLI wiring, logging and scenario-driven runs.

mod cli;

use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bess_arbitrage::config::ScenarioConfig;
use bess_arbitrage::dispatch::{Engine, GoodLpSolver, SimulationConfig, SolverBackend, TimeLimited};
use bess_arbitrage::io::export::export_csv;
use bess_arbitrage::market::{PriceSeries, VolatilityProfile};
use bess_arbitrage::sweep::degradation_sweep;

use cli::{Cli, Command, RunArgs, ScenarioArgs, SweepArgs};

/// Exit code for runs whose solve did not reach optimality.
const EXIT_SOLVE_FAILED: u8 = 2;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bess_arbitrage=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Run(args) => run(args),
        Command::Sweep(args) => sweep(args),
        Command::Presets => {
            print_presets();
            Ok(ExitCode::SUCCESS)
        }
    };

    outcome.unwrap_or_else(|e| {
        eprintln!("error: {e:#}");
        ExitCode::FAILURE
    })
}

/// Loads, overrides and validates the scenario, printing every config error.
fn load_scenario(args: &ScenarioArgs) -> anyhow::Result<(ScenarioConfig, SimulationConfig)> {
    let scenario = args.load().context("failed to load scenario")?;
    match scenario.to_simulation_config() {
        Ok(sim) => Ok((scenario, sim)),
        Err(errors) => {
            for e in &errors {
                eprintln!("{e}");
            }
            bail!("{} configuration error(s)", errors.len())
        }
    }
}

fn solver_for(scenario: &ScenarioConfig) -> TimeLimited<GoodLpSolver> {
    TimeLimited::new(
        GoodLpSolver::new(scenario.solver_backend()),
        scenario.solver_timeout(),
    )
}

fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let (scenario, sim) = load_scenario(&args.scenario)?;
    tracing::info!(
        capacity_mwh = sim.capacity_mwh,
        max_power_mw = sim.max_power_mw,
        efficiency = sim.efficiency,
        degradation_cost = sim.degradation_cost,
        volatility = sim.volatility.tag(),
        horizon_hours = sim.horizon_hours,
        seed = sim.seed,
        backend = %scenario.solver_backend(),
        "starting run"
    );

    let engine = Engine::new(solver_for(&scenario));
    let result = engine.run(&sim)?;

    println!("Status: {}", result.status());
    let Some(report) = result.report() else {
        return Ok(ExitCode::from(EXIT_SOLVE_FAILED));
    };

    println!("Objective: {:.2}", report.objective());
    println!();
    let rows = if args.full {
        report.rows()
    } else {
        report.window(0..args.zoom_hours)
    };
    for row in &rows {
        println!("{row}");
    }
    println!("\n{}", report.summary());

    if let Some(ref path) = args.schedule_out {
        export_csv(report, path)
            .with_context(|| format!("failed to write CSV to {}", path.display()))?;
        tracing::info!(path = %path.display(), "schedule written");
    }

    #[cfg(feature = "api")]
    if args.serve {
        serve(sim, result, args.port)?;
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "api")]
fn serve(
    config: SimulationConfig,
    result: bess_arbitrage::dispatch::OptimizationResult,
    port: u16,
) -> anyhow::Result<()> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    let state = Arc::new(bess_arbitrage::api::AppState { config, result });
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    rt.block_on(bess_arbitrage::api::serve(state, addr))
        .with_context(|| format!("API server on {addr} failed"))
}

fn sweep(args: SweepArgs) -> anyhow::Result<ExitCode> {
    let (scenario, sim) = load_scenario(&args.scenario)?;

    let prices = PriceSeries::generate(sim.horizon_hours, sim.volatility.params(), sim.seed);
    println!(
        "Sweeping {} wear costs over {} hours ({} market, max forward spread {:.2})",
        args.costs.len(),
        sim.horizon_hours,
        sim.volatility,
        prices.max_forward_spread()
    );

    let points = degradation_sweep(&sim, &prices, &args.costs, &solver_for(&scenario))?;
    for point in &points {
        println!("{point}");
    }

    let failed = points.iter().filter(|p| !p.status.is_optimal()).count();
    if failed > 0 {
        tracing::warn!(failed, "some sweep points did not solve to optimality");
        return Ok(ExitCode::from(EXIT_SOLVE_FAILED));
    }
    Ok(ExitCode::SUCCESS)
}

fn print_presets() {
    println!("Scenario presets:");
    for name in ScenarioConfig::PRESETS {
        if let Ok(s) = ScenarioConfig::from_preset(name) {
            println!(
                "  {name:<12} {:>6.1} MWh {:>5.1} MW  eff {:.2}  wear {:>5.1}/MWh  {:<8} {:>4} h  seed {}",
                s.battery.capacity_mwh,
                s.battery.max_power_mw,
                s.battery.efficiency,
                s.battery.degradation_cost_per_mwh,
                s.market.volatility,
                s.market.horizon_hours,
                s.market.seed,
            );
        }
    }

    println!("\nVolatility profiles:");
    for profile in VolatilityProfile::ALL {
        let p = profile.params();
        println!(
            "  {:<8} noise sd {:>5.1}  spike p {:.2}  spike {:>6.0}  ({})",
            profile.tag(),
            p.noise_std_dev(),
            p.spike_probability(),
            p.spike_magnitude(),
            profile.label()
        );
    }

    println!("\nSolver backends:");
    for backend in SolverBackend::ALL {
        let marker = if backend == SolverBackend::default() {
            " (default)"
        } else {
            ""
        };
        println!("  {backend}{marker}");
    }
}
