use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use eframe::{egui::ViewportBuilder, run_native};
use smart_alarm::{
    config::{Config, Sound},
    gui::AlarmApp,
    ServiceHandle,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// use this config file instead of the one in the config directory
    #[clap(long, short)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config and create the sounds directory
    Init {
        /// overwrite an existing config
        #[clap(long, short)]
        force: bool,
    },
    /// add a sound to the library
    NewSound { name: String, path: PathBuf },
}

fn main() -> Result<(), Box<dyn Error>> {
    if let Err(err) = simple_file_logger::init_logger!("smart_alarm") {
        eprintln!("couldn't initialize logger: {err:?}");
    }

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    match args.command {
        Some(Command::Init { force }) => {
            if force || !config_path.exists() {
                Config::new().save(&config_path)?;
                std::fs::create_dir_all(Config::sounds_path()?)?;
                println!("wrote {}", config_path.display());
            } else {
                println!(
                    "{} already exists, use --force to overwrite it",
                    config_path.display()
                );
            }
            return Ok(());
        }
        Some(Command::NewSound { name, path }) => {
            let mut config = Config::load_or_default(&config_path);
            let path = path.canonicalize()?;
            let sound = Sound::new(name.clone(), path);
            println!("added {sound}");
            config.sounds.insert(name, sound);
            config.save(&config_path)?;
            return Ok(());
        }
        None => {}
    }

    let config = Config::load_or_default(&config_path);
    let service = ServiceHandle::spawn(config.alarm.clone())?;
    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default().with_inner_size([520., 420.]),
        ..Default::default()
    };
    run_native(
        "Smart Alarm",
        native_options,
        Box::new(move |_| Ok(Box::new(AlarmApp::new(config, config_path, service)))),
    )
    .map_err(Into::into)
}
