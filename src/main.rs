use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;

use etidorhpa_client::preferences::{persist_on_change, read_low_graphics_preference};
use etidorhpa_client::{
    boot, FilePreferenceStore, GraphicsSettings, HardwareSignals, LoadOptions, ManifestCache,
    PreferenceStore, World,
};

const USAGE: &str = "Usage: etidorhpa-client <manifest.json> [--skeleton NAME]... \
[--memory GB] [--cores N] [--user-agent UA] [--low-graphics on|off] [--prefs PATH] [--spawn N]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;

    let settings = match &options.signals {
        Some(signals) => GraphicsSettings::from_signals(signals),
        None => GraphicsSettings::detect(),
    };

    let store: Option<Arc<dyn PreferenceStore>> = match &options.prefs {
        Some(path) => Some(Arc::new(
            FilePreferenceStore::open(path)
                .with_context(|| format!("failed to open preferences {path}"))?,
        )),
        None => None,
    };
    if let Some(store) = &store {
        let preferred = read_low_graphics_preference(store.as_ref(), settings.is_low_graphics())
            .context("failed to read low-graphics preference")?;
        settings.set_low_graphics(preferred);
    }
    let _persist = store.map(|store| persist_on_change(&settings, store));
    if let Some(enabled) = options.low_graphics {
        settings.set_low_graphics(enabled);
    }

    let profile = settings.profile();
    println!("Device quality: {}", settings.tier());
    println!(
        "Profile: pool={} particles={:.2} shadows={} textures={}x low_graphics={}",
        profile.initial_pool_size,
        profile.particle_multiplier,
        profile.shadow_quality,
        profile.texture_scale,
        settings.is_low_graphics()
    );

    let load_options = LoadOptions {
        texture_scale: profile.texture_scale,
        prefer_webp: true,
    };
    let names: Vec<&str> = options.skeletons.iter().map(String::as_str).collect();
    let mut cache = ManifestCache::new();
    let report = boot(&mut cache, &options.manifest, &names, &load_options);

    println!("Loaded {} skeleton(s)", report.skeletons.len());
    for data in &report.skeletons {
        println!(
            " - {} ({}, texture {})",
            data.name,
            data.skeleton_data_path,
            data.texture_path.as_deref().unwrap_or("none")
        );
    }
    for failure in &report.failures {
        println!(" ! {}", failure.message);
    }

    let mut world = World::new(report.skeletons, &settings).context("failed to build world")?;
    print_pool_stats(&world, "after boot");

    let names: Vec<String> = world.skeleton_names().map(str::to_string).collect();
    let mut spawned = 0usize;
    for name in &names {
        for index in 0..options.spawn {
            let position = Vec2::new(index as f32 * 64.0, 0.0);
            if world.spawn(name, position, "idle")?.is_some() {
                spawned += 1;
            }
        }
    }
    println!("Spawned {spawned} character(s)");
    println!("Characters updated on frame 1: {}", world.update(1));
    print_pool_stats(&world, "after spawning");

    let characters = world.active_characters().to_vec();
    for character in characters.iter().rev() {
        world.despawn(character);
    }
    print_pool_stats(&world, "after despawning");

    world.shutdown();
    println!("World shut down");
    Ok(())
}

fn print_pool_stats(world: &World, stage: &str) {
    println!("Pools {stage}:");
    for name in world.skeleton_names() {
        if let Some(stats) = world.pool_stats(name) {
            println!(
                " - {name} available={} in_use={} total={}",
                stats.available, stats.in_use, stats.total
            );
        }
    }
}

#[derive(Debug)]
struct CliOptions {
    manifest: String,
    skeletons: Vec<String>,
    /// Explicit hardware signals; `None` means detect the host.
    signals: Option<HardwareSignals>,
    low_graphics: Option<bool>,
    prefs: Option<String>,
    spawn: usize,
}

impl CliOptions {
    fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let Some(manifest) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        let mut options = Self {
            manifest,
            skeletons: Vec::new(),
            signals: None,
            low_graphics: None,
            prefs: None,
            spawn: 0,
        };

        while let Some(arg) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| anyhow!("{arg} expects a value. {USAGE}"))
            };
            match arg.as_str() {
                "--skeleton" => options.skeletons.push(value()?),
                "--memory" => {
                    let memory = value()?
                        .parse::<f64>()
                        .context("--memory expects a number of gigabytes")?;
                    options.signals_mut().memory_gb = Some(memory);
                }
                "--cores" => {
                    let cores = value()?
                        .parse::<u32>()
                        .context("--cores expects a whole number")?;
                    options.signals_mut().logical_cores = Some(cores);
                }
                "--user-agent" => {
                    let user_agent = value()?;
                    options.signals_mut().user_agent = Some(user_agent);
                }
                "--low-graphics" => {
                    options.low_graphics = Some(match value()?.as_str() {
                        "on" | "true" => true,
                        "off" | "false" => false,
                        other => {
                            return Err(anyhow!("--low-graphics expects on or off, got {other}"))
                        }
                    });
                }
                "--prefs" => options.prefs = Some(value()?),
                "--spawn" => {
                    options.spawn = value()?
                        .parse::<usize>()
                        .context("--spawn expects a whole number")?;
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }

        if options.skeletons.is_empty() {
            options.skeletons = etidorhpa_client::boot::ESSENTIAL_SKELETONS
                .iter()
                .map(|name| name.to_string())
                .collect();
        }
        Ok(options)
    }

    fn signals_mut(&mut self) -> &mut HardwareSignals {
        self.signals.get_or_insert_with(HardwareSignals::default)
    }
}
