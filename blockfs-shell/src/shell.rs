use std::io::{self, BufRead, Write};

use blockfs::{BlockFileSystem, DirEntryType, MAX_FILE_SIZE};
use derive_more::{Display, From};

const HELP: &str = "\
ls: list all contents of a directory
mkdir: create a blank directory
touch: create a blank file
cp: copy a file
tee: write a file
cat: read a file
help: show this help
stat: show information of a file or directory
format: deploy a fresh new file system
exit: exit this program";

#[derive(Debug, Display, From)]
pub enum ShellError {
    #[display(fmt = "{}", _0)]
    Fs(blockfs::Error),
    #[display(fmt = "{}", _0)]
    Io(io::Error),
}

impl std::error::Error for ShellError {}

type Result<T> = std::result::Result<T, ShellError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// 交互式命令解释器，从 `input` 读命令与数据，向 `output` 输出
pub struct Shell<R, W> {
    fs: BlockFileSystem,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(fs: BlockFileSystem, input: R, output: W) -> Self {
        Self { fs, input, output }
    }

    #[inline]
    pub fn fs(&self) -> &BlockFileSystem {
        &self.fs
    }

    #[inline]
    pub fn into_output(self) -> W {
        self.output
    }

    /// 设备上没有文件系统时询问是否格式化
    pub fn ensure_formatted(&mut self) -> Result<()> {
        if self.fs.exists()? {
            return Ok(());
        }

        write!(
            self.output,
            "No file system found on your disk. Do you want to create one? (1 for yes)"
        )?;
        if self.confirm()? {
            self.fs.format()?;
            writeln!(self.output, "format: completed")?;
        }
        Ok(())
    }

    /// 逐行执行命令，直到 `exit` 或输入结束
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            write!(self.output, "$ ")?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                return Ok(());
            };
            if self.exec(&line)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// 执行一行命令，文件系统错误打印为 `<cmd>: <error>`
    pub fn exec(&mut self, line: &str) -> io::Result<Flow> {
        // 至多三个词，其余忽略
        let argv: Vec<&str> = line.split_whitespace().take(3).collect();
        let Some(&cmd) = argv.first() else {
            return Ok(Flow::Continue);
        };
        log::debug!("exec {argv:?}");

        let result = match (cmd, &argv[1..]) {
            ("exit", _) => return Ok(Flow::Exit),
            ("help", _) => writeln!(self.output, "{HELP}").map_err(ShellError::from),
            ("format", _) => self.format(),
            ("ls", []) => self.ls("/"),
            ("ls", [path]) => self.ls(path),
            ("cp", [src, dst]) => self.cp(src, dst),
            ("cp", _) => return self.usage(cmd, "too few arguments"),
            ("mkdir" | "touch" | "tee" | "cat" | "stat", []) => {
                return self.usage(cmd, "missing the path");
            }
            ("mkdir", [path]) => self.mkdir(path),
            ("touch", [path]) => self.touch(path).map(drop),
            ("tee", [path]) => self.tee(path),
            ("cat", [path]) => self.cat(path),
            ("stat", [path]) => self.stat(path),
            ("ls" | "mkdir" | "touch" | "tee" | "cat" | "stat", _) => {
                return self.usage(cmd, "too many arguments");
            }
            _ => {
                writeln!(self.output, "exec {cmd} failed")?;
                return Ok(Flow::Continue);
            }
        };

        match result {
            Ok(()) => Ok(Flow::Continue),
            Err(ShellError::Fs(err)) => {
                log::warn!("{cmd}: {err:?}");
                writeln!(self.output, "{cmd}: {err}")?;
                Ok(Flow::Continue)
            }
            Err(ShellError::Io(err)) => Err(err),
        }
    }

    fn usage(&mut self, cmd: &str, message: &str) -> io::Result<Flow> {
        writeln!(self.output, "{cmd}: {message}")?;
        Ok(Flow::Continue)
    }

    fn format(&mut self) -> Result<()> {
        write!(
            self.output,
            "All data will be LOST. Are you ABSOLUTELY sure? (1 to continue)"
        )?;
        if self.confirm()? {
            self.fs.format()?;
            writeln!(self.output, "format: completed")?;
        }
        Ok(())
    }

    fn ls(&mut self, path: &str) -> Result<()> {
        let dir = self.fs.resolve(path)?;
        for entry in self.fs.read_dir(dir)? {
            write!(self.output, "{} {}", entry.name, entry.inode)?;
            if entry.ty == DirEntryType::Directory {
                write!(self.output, " <DIR>")?;
            }
            writeln!(self.output)?;
        }
        Ok(())
    }

    fn mkdir(&mut self, path: &str) -> Result<()> {
        let (parent, name) = self.fs.resolve_parent(path)?;
        self.fs.mkdir(parent, name)?;
        Ok(())
    }

    fn touch(&mut self, path: &str) -> Result<u32> {
        let (parent, name) = self.fs.resolve_parent(path)?;
        Ok(self.fs.touch(parent, name)?)
    }

    /// 新建 `dst` 并把 `src` 的内容克隆过去
    fn cp(&mut self, src: &str, dst: &str) -> Result<()> {
        let src = self.fs.resolve(src)?;
        let dst = self.touch(dst)?;
        self.fs.clone_file(src, dst)?;
        Ok(())
    }

    /// 把输入逐行写入文件，直到空行、输入结束或文件写满
    fn tee(&mut self, path: &str) -> Result<()> {
        let file = self.fs.resolve(path)?;
        if self.fs.stat(file)?.mode == DirEntryType::Directory {
            return Err(blockfs::Error::IsADirectory.into());
        }

        let mut offset = 0;
        while let Some(line) = self.read_line()? {
            if line.is_empty() {
                break;
            }
            let mut bytes = line.into_bytes();
            bytes.push(b'\n');

            let written = self.fs.write_from(file, offset, &bytes)?;
            offset += written;
            if written < bytes.len() || offset >= MAX_FILE_SIZE {
                log::info!("tee: {path} is full");
                break;
            }
        }
        Ok(())
    }

    fn cat(&mut self, path: &str) -> Result<()> {
        let file = self.fs.resolve(path)?;
        let content = self.fs.read_to_vec(file)?;
        self.output.write_all(&content)?;
        Ok(())
    }

    fn stat(&mut self, path: &str) -> Result<()> {
        let stat = self.fs.stat(self.fs.resolve(path)?)?;
        writeln!(self.output, "Type: {}", stat.mode)?;
        writeln!(self.output, "Size: {}", stat.size)?;
        writeln!(self.output, "Links: {}", stat.links)?;
        for (i, ptr) in stat.pointers.iter().enumerate() {
            writeln!(self.output, "Pointer {i}: {ptr}")?;
        }
        Ok(())
    }

    /// 读一行作为确认，只有 `1` 算同意
    fn confirm(&mut self) -> Result<bool> {
        self.output.flush()?;
        let answer = self.read_line()?;
        writeln!(self.output)?;
        Ok(answer.as_deref().map(str::trim) == Some("1"))
    }

    /// 去掉行尾换行，输入结束时返回 `None`
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(Some(line))
    }
}
