//! Headless portal session.
//!
//! Loads a portal configuration, fetches all vehicle feeds concurrently, applies the control
//! toggles given on the command line and prints the resulting state of the map.
//!
//! ```shell
//! cargo run -p gandalf-portal -- --config gandalf.json --toggle wg-sal=on --toggle salinity-opacity=0.7
//! ```

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use gandalf::config::PortalConfig;
use gandalf::control::{ControlEvent, ControlInput};
use gandalf::feed::FeedLoader;
use gandalf::layer::LayerStatus;
use gandalf::overlay::TileIndex;
use gandalf::Map;
use log::{info, warn};
use parking_lot::RwLock;

#[derive(Parser)]
#[command(name = "gandalf-portal")]
#[command(about = "Load GANDALF vehicle feeds and report the map layers", long_about = None)]
struct Args {
    /// Path to the portal configuration file
    #[arg(long, short)]
    config: String,

    /// Control to activate after the feeds are loaded, as `id=on`, `id=off` or `id=<number>`.
    /// Can be given several times, controls are activated in order
    #[arg(long = "toggle", value_parser = parse_toggle)]
    toggles: Vec<(String, ControlInput)>,

    /// Print the urls of this tile (`z/x/y`) for every visible overlay
    #[arg(long, value_parser = parse_tile)]
    tile: Option<TileIndex>,
}

fn parse_toggle(value: &str) -> Result<(String, ControlInput), String> {
    let (control, input) = value
        .split_once('=')
        .ok_or_else(|| format!("expected id=value, got '{value}'"))?;

    Ok((control.to_string(), input.parse()?))
}

fn parse_tile(value: &str) -> Result<TileIndex, String> {
    let parts = value
        .split('/')
        .map(str::parse::<u32>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid tile index '{value}': {err}"))?;

    match parts[..] {
        [z, x, y] => Ok(TileIndex::new(x, y, z)),
        _ => Err(format!("expected z/x/y, got '{value}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = PortalConfig::from_file(&args.config)
        .with_context(|| format!("failed to load configuration {}", args.config))?;

    if config.feeds.is_empty() {
        return Err(anyhow!("configuration {} defines no feeds", args.config));
    }

    let map = Arc::new(RwLock::new(
        config.build_map(chrono::Utc::now().date_naive()),
    ));
    let loader = FeedLoader::new(Arc::new(config.platform()?));

    info!("Loading {} feeds", config.feeds.len());
    loader.refresh_all(&config.feeds, &map).await;

    let panel = config.build_panel();
    for (control, input) in &args.toggles {
        let event = ControlEvent::new(control, *input);
        match panel.handle(&event, &mut map.write()) {
            Ok(changed) => info!("Control {control} set to {input}, changed: {changed}"),
            Err(err) => warn!("Control {control} failed: {err}"),
        }
    }

    let map = map.read();
    report(&map, args.tile.as_ref())
}

fn report(map: &Map, tile: Option<&TileIndex>) -> Result<()> {
    let mut feeds: Vec<_> = map.feeds().collect();
    feeds.sort_by_key(|(name, _)| *name);

    println!("Feeds:");
    for (name, status) in feeds {
        println!("  {name}: {status}");
    }

    println!("Layers:");
    for layer in map.layers().iter() {
        let visibility = if layer.is_attached() { "shown" } else { "hidden" };
        let status = match layer.status() {
            LayerStatus::Pending => "pending".to_string(),
            LayerStatus::Ready => "ready".to_string(),
            LayerStatus::Unavailable(reason) => format!("unavailable ({reason})"),
        };
        println!(
            "  {}: {} markers, {visibility}, {status}",
            layer.name(),
            layer.len()
        );
    }

    println!("Groups:");
    for group in map.layers().groups() {
        let member = map.layers().visible_member(group.name()).unwrap_or("none");
        println!("  {}: {member}", group.name());
        if let Some(legend) = map.layers().active_legend(group.name()) {
            println!("    legend: {legend}");
        }
    }

    println!("Visible overlays:");
    for overlay in map.overlays().iter_visible() {
        println!("  {} (opacity {})", overlay.name(), overlay.opacity());
        if let Some(attribution) = overlay.attribution() {
            println!("    attribution: {attribution}");
        }
        if let Some(legend) = overlay.legend_url() {
            println!("    legend: {legend}");
        }
        if let Some(tile) = tile {
            println!("    tile: {}", overlay.tile_url(tile)?);
        }
    }

    Ok(())
}
