//! blockfs：直接建立在块设备之上的极简文件系统。
//!
//! 整个磁盘镜像由单一进程独占，没有日志、没有间接索引，也没有删除操作。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

/* blockfs 的整体架构，自上而下 */

// 文件数据层：按字节读写、追加、克隆
mod file;

// 路径解析层：自根目录逐级查找
mod path;
pub use path::Path;

// 目录块管理层：目录项的查找与创建
mod dir;
pub use dir::DirBlock;

// 磁盘块管理器层：超级块、位图与 inode 表
mod bfs;
pub use bfs::BlockFileSystem;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
pub mod layout;

// 块转换层：文件系统块与设备扇区之间的换算
mod block;

pub use block_dev::{BlockDevice, DeviceError, RamDisk, SECTOR_SIZE};
pub use vfs::{DirEntry, DirEntryType, Error, Result, Stat};

pub const MAGIC: i32 = 0x7fff_ffff;
/// 文件系统块大小
pub const BLOCK_SIZE: usize = 4096;
/// 文件系统块总数
pub const BLOCK_COUNT: usize = 1024;
pub const SECTORS_PER_BLOCK: usize = BLOCK_SIZE / SECTOR_SIZE;
/// 设备至少要提供的扇区数
pub const DEVICE_SECTORS: usize = BLOCK_COUNT * SECTORS_PER_BLOCK;

pub const INODE_COUNT: usize = 1024;
pub const INODE_SIZE: usize = 4 + 4 * N_DIRECT_PTR;
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;
/// inode 表紧随超级块
pub const INODE_AREA_BLOCKS: usize = (INODE_COUNT * INODE_SIZE).div_ceil(BLOCK_SIZE);
/// 数据区的起始块，inode 中的块编号均相对于此
pub const DATA_BEGIN: usize = 1 + INODE_AREA_BLOCKS;
pub const DATA_BLOCKS: usize = BLOCK_COUNT - DATA_BEGIN;

/// 直接索引个数
pub const N_DIRECT_PTR: usize = 7;
pub const MAX_FILE_SIZE: usize = N_DIRECT_PTR * BLOCK_SIZE;

pub const NAME_LEN: usize = 126;
pub const DIR_ENTRY_SIZE: usize = 2 + NAME_LEN;
pub const ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / DIR_ENTRY_SIZE;
/// 单个目录最多容纳的目录项
pub const MAX_DIR_ENTRIES: usize = N_DIRECT_PTR * ENTRIES_PER_BLOCK;

pub const ROOT_INODE: u32 = 0;
pub const CWD_NAME: &str = ".";
pub const PARENT_NAME: &str = "..";

pub type DataBlock = [u8; BLOCK_SIZE];
