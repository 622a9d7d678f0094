use clap::Parser;
use fabric_ctl::ctl::{
    ConfigError, Controller, ControllerConfig, DEFAULT_FLOW_HARD_TIMEOUT, FabricWorld, Mode,
    ScenarioError, ScenarioSpec, TenantTable, parse_core_ids,
};
use fabric_ctl::sim::{SimTime, Simulator};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "fabric-ctl",
    about = "Replay a switch-event scenario through the core/edge fabric controller"
)]
struct Args {
    /// Path to scenario.json
    #[arg(long)]
    scenario: PathBuf,

    /// Controller mode: tree, vlan or adaptive
    #[arg(long, default_value = "tree")]
    mode: String,

    /// Comma separated core switch ids (e.g. 1,2,3)
    #[arg(long)]
    core_ids: String,

    /// Seconds between port statistics polls (adaptive mode)
    #[arg(long, default_value_t = 1.0)]
    interval: f64,

    /// Hard timeout of installed flow rules, in seconds
    #[arg(long, default_value_t = DEFAULT_FLOW_HARD_TIMEOUT)]
    flow_timeout: u16,

    /// Seed for the random uplink choice
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Host-to-VLAN table (JSON)
    #[arg(long)]
    tenants: Option<PathBuf>,

    /// Run until this time (ms); defaults to the last scenario event
    #[arg(long)]
    until_ms: Option<u64>,

    /// Write every emitted command to this JSON file
    #[arg(long)]
    commands_json: Option<PathBuf>,

    /// Print the final topology
    #[arg(long)]
    show_topology: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode commands: {0}")]
    Encode(#[from] serde_json::Error),
}

fn build_config(args: &Args) -> Result<ControllerConfig, ConfigError> {
    let mode: Mode = args.mode.parse()?;
    let mut cfg = ControllerConfig::new(mode, parse_core_ids(&args.core_ids)?).with_interval(args.interval);
    cfg.flow_hard_timeout = args.flow_timeout;
    cfg.seed = args.seed;
    cfg.validate()?;
    Ok(cfg)
}

fn run(args: &Args) -> Result<(), CliError> {
    let cfg = build_config(args)?;
    let tenants = match &args.tenants {
        Some(path) => TenantTable::load(path)?,
        None => TenantTable::default(),
    };
    let scenario = ScenarioSpec::load(&args.scenario)?;
    scenario.check_core_ids(&cfg.core_ids)?;

    let mut sim = Simulator::default();
    let mut world = FabricWorld::new(Controller::new(cfg, tenants)?);
    let scheduled = scenario.schedule(&mut sim)?;
    let until = args
        .until_ms
        .map(SimTime::from_millis)
        .unwrap_or_else(|| scenario.last_event_time());
    tracing::info!(events = scheduled, until = %until, "开始回放场景");

    sim.run_until(until, &mut world);

    let ctl = &world.ctl;
    if args.show_topology {
        print!("{}", ctl.topology());
    }
    println!(
        "done @ {}, switches={}, packet_ins={}, packet_outs={}, flow_mods={}, stats_requests={}, tree_updates={}, topology_warnings={}",
        sim.now(),
        ctl.switch_count(),
        ctl.stats.packet_ins,
        ctl.outbox.packet_outs(),
        ctl.outbox.flow_mods(),
        ctl.outbox.stats_requests(),
        ctl.stats.tree_updates,
        ctl.stats.topology_warnings,
    );

    if let Some(path) = &args.commands_json {
        let json = serde_json::to_string_pretty(ctl.outbox.commands())?;
        fs::write(path, json).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        })?;
        eprintln!("wrote {} commands to {}", ctl.outbox.len(), path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}
