use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Disk image file
    #[arg(long, short, default_value = "disk.img")]
    pub image: PathBuf,

    /// Create a zero-filled image if it does not exist
    #[arg(long, short)]
    pub create: bool,
}
