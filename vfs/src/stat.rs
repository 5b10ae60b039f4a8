use alloc::vec::Vec;

use crate::DirEntryType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub mode: DirEntryType,
    /// Occupying blocks
    pub blocks: u64,
    /// File size
    pub size: u64,
    /// Hard links
    pub links: u32,
    /// 直接索引的原始块编号，未使用的槽位同样列出
    pub pointers: Vec<u32>,
}
