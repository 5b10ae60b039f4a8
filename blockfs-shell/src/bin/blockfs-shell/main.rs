mod cli;

use std::io;
use std::sync::Arc;

use blockfs::{BLOCK_COUNT, BLOCK_SIZE, BlockDevice, BlockFileSystem};
use blockfs_shell::{BlockFile, Shell};
use clap::Parser;
use cli::Cli;
use typed_bytesize::ByteSizeIec;

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let disk_size = ByteSizeIec::mib(4).0;
    debug_assert_eq!((BLOCK_COUNT * BLOCK_SIZE) as u64, disk_size);

    if !cli.image.exists() {
        if !cli.create {
            eprintln!("{}: no such image, pass --create to make one", cli.image.display());
            return Err(io::ErrorKind::NotFound.into());
        }
        BlockFile::create(&cli.image, disk_size)?;
        log::info!("created {} ({disk_size} bytes)", cli.image.display());
    }

    let block_dev: Arc<dyn BlockDevice> = Arc::new(BlockFile::new(&cli.image));
    let fs = BlockFileSystem::new(block_dev);

    let stdin = io::stdin();
    let mut shell = Shell::new(fs, stdin.lock(), io::stdout());
    if let Err(err) = shell.ensure_formatted() {
        eprintln!("{}: {err}", cli.image.display());
    }

    shell.run()
}
