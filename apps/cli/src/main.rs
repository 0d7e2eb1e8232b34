#![deny(warnings)]

//! Headless driver: runs the engine at a fixed cadence and reports progress.

use anyhow::{bail, Context, Result};
use idle_ai::AutobuyPolicy;
use idle_core::{Decimal, ResourceKind};
use idle_pipeline::{Platform, Technique};
use idle_runtime::{Engine, EngineConfig, EngineError};
use rust_decimal_macros::dec;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Args {
    seconds: u64,
    cadence_ms: u64,
    autobuy: bool,
    analyze_every: Option<u64>,
    deploy_every: Option<u64>,
    prestige_at: Option<u64>,
    offline: Option<u64>,
    platform: Option<Platform>,
    techniques: Vec<Technique>,
    config: Option<PathBuf>,
    load: Option<PathBuf>,
    save: Option<PathBuf>,
    binary: bool,
    snapshot: bool,
    version: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            seconds: 600,
            cadence_ms: 100,
            autobuy: false,
            analyze_every: None,
            deploy_every: None,
            prestige_at: None,
            offline: None,
            platform: None,
            techniques: Vec::new(),
            config: None,
            load: None,
            save: None,
            binary: false,
            snapshot: false,
            version: false,
        }
    }
}

fn number(flag: &str, value: Option<String>) -> Result<u64> {
    let value = value.with_context(|| format!("{flag} needs a value"))?;
    value
        .parse()
        .with_context(|| format!("{flag}: not a number: {value}"))
}

fn key(flag: &str, value: Option<String>) -> Result<String> {
    value.with_context(|| format!("{flag} needs a value"))
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--seconds" => args.seconds = number(&arg, it.next())?,
            "--cadence-ms" => args.cadence_ms = number(&arg, it.next())?,
            "--autobuy" => args.autobuy = true,
            "--analyze-every" => args.analyze_every = Some(number(&arg, it.next())?),
            "--deploy-every" => args.deploy_every = Some(number(&arg, it.next())?),
            "--prestige-at" => args.prestige_at = Some(number(&arg, it.next())?),
            "--offline" => args.offline = Some(number(&arg, it.next())?),
            "--platform" => {
                let value = key(&arg, it.next())?;
                let platform = Platform::from_key(&value)
                    .with_context(|| format!("unknown platform: {value}"))?;
                args.platform = Some(platform);
            }
            "--technique" => {
                let value = key(&arg, it.next())?;
                let technique = Technique::from_key(&value)
                    .with_context(|| format!("unknown technique: {value}"))?;
                args.techniques.push(technique);
            }
            "--config" => args.config = it.next().map(PathBuf::from),
            "--load" => args.load = it.next().map(PathBuf::from),
            "--save" => args.save = it.next().map(PathBuf::from),
            "--binary" => args.binary = true,
            "--snapshot" => args.snapshot = true,
            "--version" => args.version = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    if args.cadence_ms == 0 {
        bail!("--cadence-ms must be positive");
    }
    Ok(args)
}

fn load_engine(args: &Args) -> Result<Engine> {
    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            EngineConfig::from_yaml_str(&text)?
        }
        None => EngineConfig::default(),
    };
    let mut engine = Engine::new(config)?;
    if let Some(path) = &args.load {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        if args.binary {
            engine.load_binary(&bytes)?;
        } else {
            engine.load_json(std::str::from_utf8(&bytes)?)?;
        }
        info!(path = %path.display(), "save restored");
    }
    Ok(engine)
}

/// A reset only pays off once it grants at least one point.
fn prestige_due(gain: &Decimal, threshold: u64) -> bool {
    gain.is_positive() && *gain >= threshold
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::DEBUG)
        .init();

    let args = parse_args()?;
    if args.version {
        println!("compiler-idle {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_SHA"));
        return Ok(());
    }
    info!(?args, "starting headless run");

    let mut engine = load_engine(&args)?;
    if let Some(seconds) = args.offline {
        engine.advance_offline(seconds)?;
    }

    let policy = AutobuyPolicy {
        manual_tokens_per_second: if args.analyze_every.is_some() {
            dec!(5)
        } else {
            dec!(0)
        },
    };
    let dt = Decimal::from(args.cadence_ms) / Decimal::from(1000u32);
    let ticks = args.seconds.saturating_mul(1000) / args.cadence_ms;
    let mut purchases = 0u64;
    let mut prestiges = 0u64;

    for i in 1..=ticks {
        let report = engine.tick(&dt)?;
        if report.stage3_unlocked {
            info!(tick = i, "stage 3 online");
        }
        if args.analyze_every.is_some_and(|n| n > 0 && i % n == 0) {
            engine.analyze_next_snippet()?;
        }
        if engine.stage3().unlocked {
            for technique in &args.techniques {
                match engine.upgrade_optimization_technique(*technique) {
                    Ok(_) | Err(EngineError::Pipeline(_)) => {}
                    Err(e) => return Err(e.into()),
                }
            }
            if let Some(platform) = args.platform {
                if engine.stage3().deployment_platform() != platform {
                    match engine.set_deployment_platform(platform) {
                        Ok(()) => info!(%platform, "deployment platform switched"),
                        Err(EngineError::Pipeline(_)) => {}
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }
        if args.deploy_every.is_some_and(|n| n > 0 && i % n == 0) && engine.stage3().unlocked {
            match engine.deploy() {
                Ok(_) | Err(EngineError::Pipeline(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        if args.autobuy {
            while engine.autobuy_step(&policy)?.is_some() {
                purchases += 1;
            }
        }
        if let Some(threshold) = args.prestige_at {
            if prestige_due(&engine.prestige_gain(), threshold) {
                engine.prestige()?;
                prestiges += 1;
            }
        }
    }

    let snap = engine.snapshot();
    println!(
        "Run OK | ticks: {} | simulated: {}s | purchases: {} | prestiges: {} | rating: {}",
        ticks,
        snap.statistics.simulated_seconds,
        purchases,
        prestiges,
        snap.stage3.rating
    );
    for kind in ResourceKind::ALL {
        println!(
            "{:>15}: {} (+{}/s)",
            kind.key(),
            engine.ledger().get(kind),
            snap.production_rates.produced(kind)
        );
    }

    if let Some(path) = &args.save {
        let bytes = if args.binary {
            engine.save_binary()?
        } else {
            engine.save_json()?.into_bytes()
        };
        write_atomic(path, &bytes)?;
        info!(path = %path.display(), "saved");
    }
    if args.snapshot {
        println!("{}", serde_json::to_string_pretty(&snap)?);
    }
    Ok(())
}
