//! # 路径解析层

use vfs::{Error, Result};

use crate::{BlockFileSystem, ROOT_INODE};

pub trait Path {
    fn is_absolute(&self) -> bool;

    /// 返回路径的`(父目录, 文件名)`，父目录保留结尾的`/`。
    ///
    /// 相对路径、以`/`结尾的路径或根目录返回`None`。
    fn parent_file(&self) -> Option<(&Self, &Self)>;
}

impl Path for str {
    #[inline]
    fn is_absolute(&self) -> bool {
        self.starts_with('/')
    }

    fn parent_file(&self) -> Option<(&Self, &Self)> {
        if !self.is_absolute() {
            return None;
        }
        let at = self.rfind('/')? + 1;
        let (parent, name) = self.split_at(at);
        if name.is_empty() {
            return None;
        }
        Some((parent, name))
    }
}

impl BlockFileSystem {
    /// 自根目录逐级查找绝对路径，返回目标 inode 的ID。
    ///
    /// 进入每一级之前都要求当前节点是目录，
    /// 因此`/file/`会以[`Error::NotADirectory`]失败，`/`解析为根目录。
    pub fn resolve(&self, path: &str) -> Result<u32> {
        if !path.is_absolute() {
            log::warn!("{path:?} is not absolute");
            return Err(Error::InvalidPath);
        }

        let mut inode_id = ROOT_INODE;
        let mut rest = &path[1..];
        loop {
            let inode = self.read_inode(inode_id)?;
            if !inode.is_dir() {
                return Err(Error::NotADirectory);
            }
            if rest.is_empty() {
                return Ok(inode_id);
            }

            let (name, tail) = match rest.split_once('/') {
                Some((name, tail)) => (name, Some(tail)),
                None => (rest, None),
            };
            inode_id = self.find(&inode, name)?.ok_or(Error::NotFound)?;
            log::trace!("{path:?}: {name:?} -> inode {inode_id}");

            match tail {
                Some(tail) => rest = tail,
                None => return Ok(inode_id),
            }
        }
    }

    /// 解析路径的父目录，并返回其中的文件名
    pub fn resolve_parent<'a>(&self, path: &'a str) -> Result<(u32, &'a str)> {
        let (parent, name) = path.parent_file().ok_or(Error::InvalidPath)?;
        Ok((self.resolve(parent)?, name))
    }
}

#[cfg(test)]
mod tests {
    use super::Path;

    #[test]
    fn parent_file() {
        assert_eq!(Some(("/", "a")), "/a".parent_file());
        assert_eq!(Some(("/d/", "a")), "/d/a".parent_file());
        assert_eq!(None, "/".parent_file());
        assert_eq!(None, "/d/".parent_file());
        assert_eq!(None, "a".parent_file());
    }
}
