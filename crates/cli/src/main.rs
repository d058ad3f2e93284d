//! cosmic-mouse CLI: command-line lighting and DPI configuration tool.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use cosmic_mouse_core::device::{UsbDevice, UsbId};
use cosmic_mouse_core::profile::{self, Profile, Rgb, DPI_LEVELS, LED_COUNT};
use cosmic_mouse_core::selectors::{self, SelectorTable};
use cosmic_mouse_core::{comm, presets, safety};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cosmic-mouse",
    version,
    about = "Cosmic Byte Firestorm gaming mouse configuration"
)]
struct Cli {
    /// USB identifier of the mouse, VID:PID in hex (see `lsusb`).
    #[arg(long, global = true)]
    device: Option<UsbId>,

    /// Profile file [default: <config dir>/cosmic-mouse/profile.json].
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Selector table file [default: <config dir>/cosmic-mouse/selectors.json].
    #[arg(long, global = true)]
    selectors: Option<PathBuf>,

    /// Re-send the whole configuration this many times on transient failures.
    #[arg(long, global = true, default_value_t = 0)]
    retries: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// RGB LED control.
    #[command(subcommand)]
    Rgb(RgbCommand),
    /// DPI control.
    #[command(subcommand)]
    Dpi(DpiCommand),
    /// Profile management.
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Subcommand)]
enum RgbCommand {
    /// Set the lighting effect.
    SetEffect {
        /// Effect name (see `rgb list`).
        effect: String,
    },
    /// Set the 8 LED zone colors.
    SetColors(ColorSource),
    /// List effects and color presets.
    List,
}

#[derive(Subcommand)]
enum DpiCommand {
    /// Set the active DPI level.
    SetMode {
        /// DPI level (1-6).
        level: u8,
    },
    /// Set the 6 DPI values.
    SetValues {
        /// Six DPI values, multiples of 100 in 100-25500.
        #[arg(num_args = 6, required = true)]
        values: Vec<u16>,
        /// Also set the active level (1-6).
        #[arg(long)]
        active: Option<u8>,
    },
    /// Set the 6 DPI indicator colors.
    SetColors(ColorSource),
    /// List DPI color presets.
    List,
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Show the stored profile.
    Show,
    /// Send the stored profile to the device.
    Apply,
    /// Reset the stored profile to defaults.
    Reset,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ColorSource {
    /// Named color preset.
    #[arg(long)]
    preset: Option<String>,
    /// Explicit colors as R,G,B.
    #[arg(long, num_args = 1..)]
    colors: Option<Vec<Rgb>>,
}

/// Paths and device settings shared by every command.
struct Session {
    device: Option<UsbId>,
    profile_path: PathBuf,
    selectors_path: PathBuf,
    retries: u32,
}

impl Session {
    fn load_profile(&self) -> Result<Profile> {
        Ok(profile::load_profile(&self.profile_path)?)
    }

    fn load_selectors(&self) -> Result<SelectorTable> {
        SelectorTable::load(&self.selectors_path).with_context(|| {
            format!(
                "selector table required at {}",
                self.selectors_path.display()
            )
        })
    }

    /// Validate, persist, then send the full configuration.
    fn store_and_send(&self, profile: &Profile) -> Result<()> {
        let table = self.load_selectors()?;
        comm::prepare(profile, &table)?;
        profile::save_profile(&self.profile_path, profile)?;
        self.send(profile, &table)
    }

    fn send(&self, profile: &Profile, table: &SelectorTable) -> Result<()> {
        let id = self
            .device
            .context("no device given; pass --device VID:PID")?;
        let mut device = UsbDevice::open(id)?;
        eprintln!("{}", safety::BRICKING_DISCLAIMER);
        comm::send_config_with_retry(&mut device, profile, table, self.retries)?;
        Ok(())
    }
}

fn resolve_colors<const N: usize>(
    source: ColorSource,
    lookup: fn(&str) -> Option<&'static [Rgb; N]>,
) -> Result<Vec<Rgb>> {
    if let Some(name) = source.preset {
        return lookup(&name)
            .map(|c| c.to_vec())
            .with_context(|| format!("unknown color preset '{name}'"));
    }
    let colors = source.colors.unwrap_or_default();
    if colors.len() != N {
        bail!("need {N} colors, got {}", colors.len());
    }
    Ok(colors)
}

fn run_rgb(ctx: &Session, cmd: RgbCommand) -> Result<()> {
    match cmd {
        RgbCommand::SetEffect { effect } => {
            let mut profile = ctx.load_profile()?;
            profile.effect = effect;
            ctx.store_and_send(&profile)?;
            println!("[*] Effect set to: {}", profile.effect);
        }
        RgbCommand::SetColors(source) => {
            let named = source.preset.clone();
            let mut profile = ctx.load_profile()?;
            profile.led_colors = resolve_colors::<LED_COUNT>(source, presets::led_preset)?;
            ctx.store_and_send(&profile)?;
            match named {
                Some(name) => println!("[*] Colors set to preset: {name}"),
                None => println!("[*] Custom colors set"),
            }
        }
        RgbCommand::List => {
            println!("Effects:");
            match ctx.load_selectors() {
                Ok(table) => {
                    for name in table.effect_names() {
                        println!("  {name}");
                    }
                }
                Err(e) => println!("  (unavailable: {e:#})"),
            }
            println!("\nColor presets:");
            for (name, _) in presets::LED_PRESETS {
                println!("  {name}");
            }
        }
    }
    Ok(())
}

fn run_dpi(ctx: &Session, cmd: DpiCommand) -> Result<()> {
    match cmd {
        DpiCommand::SetMode { level } => {
            safety::validate_dpi_level(level)?;
            let mut profile = ctx.load_profile()?;
            profile.active_dpi = level;
            ctx.store_and_send(&profile)?;
            println!("[*] Active DPI set to level: {level}");
        }
        DpiCommand::SetValues { values, active } => {
            let mut profile = ctx.load_profile()?;
            profile.dpi_values = values;
            if let Some(level) = active {
                profile.active_dpi = level;
            }
            ctx.store_and_send(&profile)?;
            println!("[*] DPI values set: {:?}", profile.dpi_values);
            if active.is_some() {
                println!(
                    "  Active level: {} ({} DPI)",
                    profile.active_dpi,
                    profile.active_dpi_value().unwrap_or_default()
                );
            }
        }
        DpiCommand::SetColors(source) => {
            let named = source.preset.clone();
            let mut profile = ctx.load_profile()?;
            profile.dpi_colors = resolve_colors::<DPI_LEVELS>(source, presets::dpi_preset)?;
            ctx.store_and_send(&profile)?;
            match named {
                Some(name) => println!("[*] DPI colors set to preset: {name}"),
                None => println!("[*] Custom DPI colors set"),
            }
        }
        DpiCommand::List => {
            println!("DPI color presets:");
            for (name, _) in presets::DPI_PRESETS {
                println!("  {name}");
            }
        }
    }
    Ok(())
}

fn run_profile(ctx: &Session, cmd: ProfileCommand) -> Result<()> {
    match cmd {
        ProfileCommand::Show => {
            let p = ctx.load_profile()?;
            println!("Current profile ({}):", ctx.profile_path.display());
            println!("  Effect: {}", p.effect);
            for (i, c) in p.led_colors.iter().enumerate() {
                println!("  LED {}: {c}", i + 1);
            }
            println!("  DPI values: {:?}", p.dpi_values);
            match p.active_dpi_value() {
                Some(dpi) => println!("  Active DPI: {} ({dpi} DPI)", p.active_dpi),
                None => println!("  Active DPI: {} (invalid)", p.active_dpi),
            }
            for (i, c) in p.dpi_colors.iter().enumerate() {
                println!("  DPI {} color: {c}", i + 1);
            }
        }
        ProfileCommand::Apply => {
            let profile = ctx.load_profile()?;
            let table = ctx.load_selectors()?;
            ctx.send(&profile, &table)?;
            println!("[*] Profile applied to device");
        }
        ProfileCommand::Reset => {
            profile::save_profile(&ctx.profile_path, &Profile::default())?;
            println!("[*] Profile reset to defaults");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let ctx = Session {
        device: cli.device,
        profile_path: cli.profile.unwrap_or_else(profile::default_profile_path),
        selectors_path: cli
            .selectors
            .unwrap_or_else(selectors::default_selectors_path),
        retries: cli.retries,
    };
    tracing::debug!(
        profile = %ctx.profile_path.display(),
        selectors = %ctx.selectors_path.display(),
        "Resolved paths"
    );

    match cli.command {
        Commands::Rgb(cmd) => run_rgb(&ctx, cmd),
        Commands::Dpi(cmd) => run_dpi(&ctx, cmd),
        Commands::Profile(cmd) => run_profile(&ctx, cmd),
    }
}
