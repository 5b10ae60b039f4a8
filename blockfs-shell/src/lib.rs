
mod block_file;
mod shell;

pub use self::block_file::BlockFile;
pub use self::shell::{Flow, Shell, ShellError};
