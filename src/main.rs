use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sound_studio::audio::export::render_sound_to_wav;
use sound_studio::{Session, SoundCatalog, StudioConfig};
use tracing_subscriber::EnvFilter;

/// Extra time to let the device drain after a preview
const PREVIEW_TAIL: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(version, about = "Procedural sound effect studio.")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists categories and their sounds.
    Catalog,
    /// Prints the resolved synthesis recipe of a sound as JSON.
    Recipe { sound_id: String },
    /// Plays one sound on the default output device.
    Preview { sound_id: String },
    /// Renders one sound to a WAV file.
    Render { sound_id: String, out: PathBuf },
    /// Arranges a short sequence and prints its cue table.
    Demo {
        /// Bounce the arrangement to this WAV file.
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Export the session document to this file (.json or .ron).
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<StudioConfig, Box<dyn Error>> {
    Ok(match path {
        Some(path) => StudioConfig::load(path)?,
        None => StudioConfig::load_default()?,
    })
}

/// A docking sequence over a quiet ambience bed
fn arrange_demo(session: &mut Session) -> Result<(), Box<dyn Error>> {
    session.set_timeline_length(6.0);

    let bed = session.add_track();
    session.rename_track(bed, "Ambience")?;
    session.add_clip("space_hum", bed, 0.0)?;
    session.set_track_volume(bed, -6.0)?;

    let sfx = session.add_track();
    session.rename_track(sfx, "Docking")?;
    session.set_track_pan(sfx, -0.3)?;
    session.add_clip("engine_thrust", sfx, 0.5)?;
    session.add_clip("dock_clamp", sfx, 2.0)?;
    session.add_clip("door_open", sfx, 3.0)?;

    let ui = session.add_track();
    session.rename_track(ui, "UI")?;
    session.add_clip("ui_click", ui, 4.5)?;
    session.add_clip("ui_confirm", ui, 5.0)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Catalog => {
            let catalog = SoundCatalog::builtin();
            for category in catalog.categories() {
                println!("{} {} ({})", category.icon, category.display_name, category.id);
                for sound in &category.sounds {
                    println!(
                        "    {:<24} {:<28} {:>5.2}s",
                        sound.id, sound.display_name, sound.nominal_duration
                    );
                }
            }
            println!("{} sounds", catalog.sound_count());
        }
        Commands::Recipe { sound_id } => {
            let (recipe, volume) = SoundCatalog::builtin().resolve(&sound_id)?;
            let json = serde_json::json!({
                "sound_id": sound_id,
                "kind": recipe.kind(),
                "duration": recipe.duration(),
                "volume": volume,
                "recipe": recipe,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Preview { sound_id } => {
            let mut session = Session::with_device(config);
            let (recipe, _) = session.catalog().resolve(&sound_id)?;
            if !session.preview_sound(&sound_id)? {
                for notice in session.drain_notifications() {
                    eprintln!("{}", notice.message);
                }
                return Err("audio output unavailable".into());
            }
            std::thread::sleep(Duration::from_secs_f32(recipe.duration()) + PREVIEW_TAIL);
        }
        Commands::Render { sound_id, out } => {
            let (recipe, volume) = SoundCatalog::builtin().resolve(&sound_id)?;
            let frames =
                render_sound_to_wav(&out, &sound_id, &recipe, volume, config.fallback_sample_rate)?;
            tracing::info!(path = %out.display(), frames, "Rendered sound");
        }
        Commands::Demo { out, export } => {
            let sample_rate = config.fallback_sample_rate;
            let (mut session, _handle) = Session::offline(config);
            arrange_demo(&mut session)?;
            print!("{}", session.render_cue_table());

            if let Some(path) = out {
                let frames = session.bounce_to_wav(&path, sample_rate)?;
                tracing::info!(path = %path.display(), frames, "Bounced arrangement");
            }
            if let Some(path) = export {
                session.export_document().save(&path)?;
                tracing::info!(path = %path.display(), "Exported session");
            }
        }
    }

    Ok(())
}
