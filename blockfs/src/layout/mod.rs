//! # 磁盘数据结构层
//!
//! blockfs 的磁盘布局：
//! 超级块(含两张位图) | 索引节点区域 | 数据块区域
//!
//! 盘上记录一律小端序，位域由各记录的 `encode`/`decode` 显式打包与拆包。

mod super_block;
pub use super_block::SuperBlock;

mod bitmap;
pub use bitmap::Bitmap;

mod inode;
pub use inode::{DiskInode, DiskInodeKind};

/// 目录项，也属于磁盘文件系统数据结构
mod dir_entry;
pub use dir_entry::DirEntry;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BLOCK_SIZE, DIR_ENTRY_SIZE, INODE_SIZE};

    #[test]
    fn layout() {
        assert_eq!(272, SuperBlock::SIZE);
        assert_eq!(32, INODE_SIZE);
        assert_eq!(128, DIR_ENTRY_SIZE);
        assert!(SuperBlock::SIZE <= BLOCK_SIZE);
        assert_eq!(0, BLOCK_SIZE % DIR_ENTRY_SIZE);
    }
}
