use alloc::string::String;

use vfs::{Error, Result};

use super::DiskInodeKind;
use crate::{DIR_ENTRY_SIZE, NAME_LEN};

const INDEX_BITS: u32 = 13;
const VALID_BIT: u16 = 1 << 13;
const KIND_SHIFT: u32 = 14;

/// 目录项：名字到 inode 的映射。
///
/// 盘上128字节：一个 `u16` 打包 `index`(0..13 位)、`valid`(第13位)、`type`(14..16 位)，
/// 其后为 [`NAME_LEN`] 字节、以0填充的名字。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    index: u16,
    valid: bool,
    kind: DiskInodeKind,
    // 最后一字节留给 \0
    name: [u8; NAME_LEN],
}

impl DirEntry {
    /// `index` 位域能表示的最大 inode ID
    pub const MAX_INDEX: u32 = (1 << INDEX_BITS) - 1;

    pub fn new(name: &str, index: u32, kind: DiskInodeKind) -> Result<Self> {
        Self::check_name(name)?;
        if index > Self::MAX_INDEX {
            return Err(Error::OutOfRange);
        }

        let mut raw_name = [0; NAME_LEN];
        raw_name[..name.len()].copy_from_slice(name.as_bytes());

        Ok(Self {
            index: index as u16,
            valid: true,
            kind,
            name: raw_name,
        })
    }

    /// 名字非空、不含 `/` 与 `\0`，且要为结尾的 `\0` 留出一字节
    pub fn check_name(name: &str) -> Result<()> {
        if name.is_empty() || name.len() >= NAME_LEN || name.contains(['/', '\0']) {
            log::warn!("rejected entry name {name:?}");
            return Err(Error::InvalidName);
        }
        Ok(())
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index as u32
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    pub fn kind(&self) -> DiskInodeKind {
        self.kind
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(Self::trim(&self.name)).into_owned()
    }

    /// 不解码整个目录项，只看有效位
    #[inline]
    pub fn peek_valid(raw: &[u8]) -> bool {
        u16::from_le_bytes([raw[0], raw[1]]) & VALID_BIT != 0
    }

    /// 不解码整个目录项，只取名字部分
    #[inline]
    pub fn peek_name(raw: &[u8]) -> &[u8] {
        Self::trim(&raw[2..DIR_ENTRY_SIZE])
    }

    pub fn decode(raw: &[u8]) -> Result<Self> {
        debug_assert_eq!(DIR_ENTRY_SIZE, raw.len());
        let packed = u16::from_le_bytes([raw[0], raw[1]]);
        let mut name = [0; NAME_LEN];
        name.copy_from_slice(&raw[2..DIR_ENTRY_SIZE]);

        Ok(Self {
            index: packed & Self::MAX_INDEX as u16,
            valid: packed & VALID_BIT != 0,
            kind: DiskInodeKind::try_from((packed >> KIND_SHIFT) as u8)?,
            name,
        })
    }

    pub fn encode(&self, raw: &mut [u8]) {
        debug_assert_eq!(DIR_ENTRY_SIZE, raw.len());
        let valid = if self.valid { VALID_BIT } else { 0 };
        let packed = self.index | valid | (self.kind as u16) << KIND_SHIFT;
        raw[0..2].copy_from_slice(&packed.to_le_bytes());
        raw[2..DIR_ENTRY_SIZE].copy_from_slice(&self.name);
    }

    fn trim(name: &[u8]) -> &[u8] {
        let len = name.iter().position(|&c| c == 0).unwrap_or(name.len());
        &name[..len]
    }
}
