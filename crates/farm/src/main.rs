mod app;
mod config;
mod farm_window;
mod hud;
mod loader;
mod loading;
mod map_view;
mod window;

use anyhow::{Context, Result};
use clap::Parser;
use engine::HudTable;
use winit::event_loop::{ControlFlow, EventLoop};

use crate::app::App;
use crate::config::Config;

const GRANARY_TABLE: &str = include_str!("../data/granaries.json");

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::info!("Démarrage de la ferme..");

    let hud_table = HudTable::from_json(GRANARY_TABLE).context("invalid granary HUD table")?;
    log::info!("{} granary records", hud_table.len());

    let events = loader::spawn(&config);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(events, hud_table, config.seed);

    log::info!("Entrée dans la boucle principale...");
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_covers_every_structure_type() {
        let table = HudTable::from_json(GRANARY_TABLE).unwrap();
        for name in ["P1", "Q1", "L1"] {
            assert!(table.get(name).is_some(), "{name} missing");
        }
        let beans = ["red", "green", "yellow", "black"];
        for name in ["P1", "P3", "P4", "P5", "Q3", "L4"] {
            let record = table.get(name).unwrap();
            assert!(beans.contains(&record.grain_img.as_str()));
        }
    }
}
