use alloc::string::String;

use derive_more::Display;

/// 目录列举所交换的目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Inode number
    pub inode: u64,
    pub ty: DirEntryType,
    pub name: String,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DirEntryType {
    #[display(fmt = "DIR")]
    Directory,
    #[default]
    #[display(fmt = "FILE")]
    Regular,
}
