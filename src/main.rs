mod app;
mod settings;
mod util;
mod vault;

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Vault directory to visualize.
    #[arg(long, default_value = ".")]
    vault: PathBuf,
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "vaultmap",
        options,
        Box::new(move |cc| Ok(Box::new(app::VaultMapApp::new(cc, args.vault.clone())))),
    )
}
