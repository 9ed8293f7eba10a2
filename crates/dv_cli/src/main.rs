//! Headless replay inspector.
//!
//! Loads parsed-demo documents (JSON or compressed cache), prints round and
//! event summaries, steps playback without a renderer, dumps draw-list
//! scenes, and converts documents to the cache format.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use dv_core::provider::{load_document, save_document_cache, FileProvider, RoundDataProvider};
use dv_core::render::CanvasSize;
use dv_core::replay::{BombPhase, PlaybackStatus, ReplayEngine};

#[derive(Parser)]
#[command(name = "dv")]
#[command(about = "Inspect and play parsed demo replay documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show document metadata and the round index
    Info {
        /// Document path (.json or cache)
        file: PathBuf,
    },

    /// Print one round's event timeline
    Events {
        file: PathBuf,

        /// Round number
        #[arg(long)]
        round: u32,
    },

    /// Step playback headlessly and print sampled state
    Play {
        file: PathBuf,

        #[arg(long)]
        round: u32,

        /// Playback speed multiplier (0.25, 0.5, 1, 2, 4)
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// Frame sampling stride
        #[arg(long, default_value = "1")]
        stride: u32,

        /// Simulated host frame rate
        #[arg(long, default_value = "60")]
        fps: u32,

        /// Stop after this many wall-clock seconds (default: play to end)
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Build one frame's draw list and dump it as JSON
    Scene {
        file: PathBuf,

        #[arg(long)]
        round: u32,

        /// Tick to render (default: round start)
        #[arg(long)]
        tick: Option<u64>,

        #[arg(long, default_value = "1024")]
        width: f32,

        #[arg(long, default_value = "1024")]
        height: f32,
    },

    /// Convert a JSON document to the compressed cache format
    Cache {
        /// Input JSON document
        #[arg(long)]
        input: PathBuf,

        /// Output cache file path
        #[arg(long)]
        output: PathBuf,

        /// Verify the cache by reading it back
        #[arg(long, default_value = "false")]
        verify: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Info { file } => cmd_info(&file),
        Commands::Events { file, round } => cmd_events(&file, round),
        Commands::Play { file, round, speed, stride, fps, duration } => {
            cmd_play(&file, round, speed, stride, fps, duration)
        }
        Commands::Scene { file, round, tick, width, height } => {
            cmd_scene(&file, round, tick, width, height)
        }
        Commands::Cache { input, output, verify } => cmd_cache(&input, &output, verify),
    }
}

fn cmd_info(file: &PathBuf) -> Result<()> {
    let doc = load_document(file).with_context(|| format!("loading {}", file.display()))?;
    let meta = &doc.metadata;

    println!("Demo:     {}", meta.demo_file_name);
    println!("Map:      {}", meta.map_name);
    println!("Score:    {} {} - {} {}", meta.team1_name, meta.team1_score, meta.team2_score, meta.team2_name);
    println!("Ticks:    {} @ {}/s ({:.1}s)", meta.total_ticks, meta.tick_rate, meta.duration_seconds);
    println!("Frames:   {}", doc.frames.len());
    println!("Events:   {}", doc.events.len());
    println!();
    println!("{:>5}  {:>10}  {:>10}  {:>6}  {}", "round", "start", "end", "winner", "reason");
    for info in &doc.rounds {
        let winner = match info.winner_team {
            2 => "T",
            3 => "CT",
            _ => "?",
        };
        println!(
            "{:>5}  {:>10}  {:>10}  {:>6}  {:?}",
            info.round_number,
            info.start_tick,
            info.end_tick,
            winner,
            dv_core::WinReason::from_code(info.end_reason_code)
        );
    }
    Ok(())
}

fn cmd_events(file: &PathBuf, round: u32) -> Result<()> {
    let provider = FileProvider::open(file)?;
    let payload = provider.fetch_round(round, 1)?;
    let rate = payload.metadata.effective_tick_rate();
    let start = payload.metadata.start_tick;

    println!("Round {} events ({}):", round, payload.events.len());
    for event in &payload.events {
        let secs = event.tick().saturating_sub(start) as f64 / rate;
        println!("  [{:>7}] {:>6.1}s  {}", event.tick(), secs, describe_event(event));
    }
    Ok(())
}

fn describe_event(event: &dv_core::ReplayEvent) -> String {
    use dv_core::ReplayEvent::*;
    match event {
        Kill { attacker_id, victim_id, weapon, headshot, .. } => format!(
            "kill: {} -> {} ({}{})",
            attacker_id,
            victim_id,
            weapon,
            if *headshot { ", HS" } else { "" }
        ),
        BombPlant { player_id, site, .. } => {
            format!("bomb planted by {} (site {:?})", player_id, site)
        }
        BombDefuse { player_id, .. } => format!("bomb defused by {}", player_id),
        BombExplode { .. } => "bomb exploded".to_string(),
        GrenadeThrown { thrower_id, grenade, .. } => {
            format!("{:?} thrown by {}", grenade, thrower_id)
        }
        other => format!("{:?}", other.kind()),
    }
}

fn cmd_play(
    file: &PathBuf,
    round: u32,
    speed: f64,
    stride: u32,
    fps: u32,
    duration: Option<f64>,
) -> Result<()> {
    if fps == 0 {
        bail!("fps must be positive");
    }

    let provider = FileProvider::open(file)?;
    let mut engine = ReplayEngine::new();
    engine.begin_loading();
    match provider.fetch_round(round, stride) {
        Ok(payload) => engine.load(payload),
        Err(err) => {
            engine.fail_load(err.to_string());
            bail!("cannot play round {}: {}", round, err);
        }
    }
    if engine.status() == PlaybackStatus::Error {
        bail!("round data rejected: {}", engine.error_message().unwrap_or("unknown"));
    }

    engine.set_speed_multiplier(speed);
    engine.play();

    let dt = 1.0 / f64::from(fps);
    let mut elapsed = 0.0;
    // Print roughly once per simulated second.
    let report_every = fps as u64;
    let mut host_frame = 0u64;

    while engine.status() == PlaybackStatus::Playing {
        engine.advance(dt);
        elapsed += dt;
        host_frame += 1;

        if host_frame % report_every == 0 || engine.status() != PlaybackStatus::Playing {
            report_position(&engine);
        }
        if let Some(limit) = duration {
            if elapsed >= limit {
                engine.pause();
                report_position(&engine);
                break;
            }
        }
    }

    let info = engine.playback_info();
    println!(
        "finished at tick {} ({:.1}s / {:.1}s, {:.0}% through the round)",
        info.current_tick,
        info.current_time_seconds,
        info.total_time_seconds,
        info.progress * 100.0
    );
    Ok(())
}

fn report_position(engine: &ReplayEngine) {
    let info = engine.playback_info();
    let active = engine.active_events();
    let bomb = match active.bomb {
        BombPhase::Clear => String::new(),
        BombPhase::Planted { .. } => "  [BOMB PLANTED]".to_string(),
        BombPhase::Defused { .. } => "  [BOMB DEFUSED]".to_string(),
        BombPhase::Exploded { .. } => "  [BOMB EXPLODED]".to_string(),
    };

    let alive = engine
        .current_frame()
        .map(|f| {
            let t = f.alive_count(dv_core::Team::T);
            let ct = f.alive_count(dv_core::Team::Ct);
            format!("{}v{}", t, ct)
        })
        .unwrap_or_default();

    println!(
        "t={:>6.1}s tick={:>7} frame={:>5} {}  {} active events{}",
        info.current_time_seconds,
        info.current_tick,
        engine.frame_index(),
        alive,
        active.events.len(),
        bomb
    );
}

fn cmd_scene(
    file: &PathBuf,
    round: u32,
    tick: Option<u64>,
    width: f32,
    height: f32,
) -> Result<()> {
    let provider = FileProvider::open(file)?;
    let mut engine = ReplayEngine::new();
    engine.load(provider.fetch_round(round, 1)?);
    if let Some(tick) = tick {
        engine.seek_to_tick(tick);
    }

    let scene = engine
        .build_scene(CanvasSize::new(width, height))
        .context("no scene available (round failed to load)")?;
    println!("{}", serde_json::to_string_pretty(&scene)?);
    Ok(())
}

fn cmd_cache(input: &PathBuf, output: &PathBuf, verify: bool) -> Result<()> {
    let doc = load_document(input).with_context(|| format!("loading {}", input.display()))?;
    save_document_cache(output, &doc)?;
    println!("wrote {}", output.display());

    if verify {
        let loaded = load_document(output)?;
        if loaded != doc {
            bail!("verification failed: cache does not round-trip");
        }
        println!("verified: cache round-trips ({} rounds, {} frames)", loaded.rounds.len(), loaded.frames.len());
    }
    Ok(())
}
