//! Runs an external TeX compiler over the report template and removes its
//! intermediate files afterwards.

use std::env;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::report::ReportAssembler;

/// Extensions of compiler byproducts removed after a successful run.
pub const INTERMEDIATE_EXTENSIONS: [&str; 4] = ["aux", "log", "out", "gz"];

/// Number of trailing output lines kept in a `Compilation` error.
const OUTPUT_TAIL_LINES: usize = 20;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("no data to compile, assemble the report fragments first")]
    NotReady,
    #[error("no document compiler found, looked for tectonic and pdflatex")]
    CompilerNotFound,
    #[error("{} failed with {status}:\n{output}", .compiler.program())]
    Compilation {
        compiler: Compiler,
        status: ExitStatus,
        output: String,
    },
    #[error("{} did not finish within {timeout:?}", .compiler.program())]
    Timeout {
        compiler: Compiler,
        timeout: Duration,
    },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl CompileError {
    fn io<S: Into<String>>(context: S) -> impl FnOnce(io::Error) -> CompileError {
        let context = context.into();
        move |source| CompileError::Io { context, source }
    }
}

/// The supported compilers, in order of preference.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Compiler {
    Tectonic,
    Pdflatex,
}

impl Compiler {
    pub const ALL: [Compiler; 2] = [Compiler::Tectonic, Compiler::Pdflatex];

    pub fn program(&self) -> &'static str {
        use Compiler::*;
        match self {
            Tectonic => "tectonic",
            Pdflatex => "pdflatex",
        }
    }

    /// Arguments compiling `template` into `output_dir`, naming the result
    /// after `job_id`.
    fn args(&self, template: &Path, output_dir: &Path, job_id: &str) -> Vec<OsString> {
        use Compiler::*;
        match self {
            Tectonic => vec![
                template.into(),
                "-o".into(),
                output_dir.join(job_id).into(),
            ],
            Pdflatex => {
                let mut out_arg = OsString::from("-output-directory=");
                out_arg.push(output_dir);
                vec![
                    "-interaction=batchmode".into(),
                    out_arg,
                    format!("-jobname={}", job_id).into(),
                    template.into(),
                ]
            }
        }
    }
}

/// Compiles the report template.
///
/// Relative `template` and `output_dir` paths are interpreted relative to
/// `root`, which is also the compiler's working directory and the tree that
/// intermediate files are removed from.
#[derive(Debug)]
pub struct CompilerDriver {
    pub root: PathBuf,
    pub template: PathBuf,
    pub output_dir: PathBuf,
    pub timeout: Duration,
    /// Directories to look for compilers in. `None` uses `PATH`.
    pub search_path: Option<Vec<PathBuf>>,
}

impl CompilerDriver {
    /// Finds the first available compiler.
    pub fn find_compiler(&self) -> Option<(Compiler, PathBuf)> {
        let dirs: Vec<PathBuf> = match &self.search_path {
            Some(dirs) => dirs.clone(),
            None => env::var_os("PATH")
                .map(|p| env::split_paths(&p).collect())
                .unwrap_or_default(),
        };
        Compiler::ALL.into_iter().find_map(|compiler| {
            dirs.iter()
                .map(|dir| dir.join(compiler.program()))
                .find(|path| is_executable(path))
                .map(|path| (compiler, path))
        })
    }

    /// Compiles the fragments written by `assembler` into a document named
    /// after `job_id`.
    ///
    /// Intermediate files are removed after a successful run unless
    /// `keep_intermediates` is set. They are always kept when the compiler
    /// fails.
    pub fn compile(
        &self,
        assembler: &ReportAssembler,
        job_id: &str,
        keep_intermediates: bool,
    ) -> Result<(), CompileError> {
        if !assembler.is_set() {
            return Err(CompileError::NotReady);
        }
        let (compiler, program) = self
            .find_compiler()
            .ok_or(CompileError::CompilerNotFound)?;
        info!(compiler = compiler.program(), path = ?program, job_id, "compiling report");

        let output_dir = self.root.join(&self.output_dir);
        let job_dir = match compiler {
            Compiler::Tectonic => output_dir.join(job_id),
            Compiler::Pdflatex => output_dir.clone(),
        };
        fs::create_dir_all(&job_dir)
            .map_err(CompileError::io(format!("creating directory {:?}", job_dir)))?;

        let args = compiler.args(&self.template, &self.output_dir, job_id);
        debug!(?args, "running {}", compiler.program());
        self.run(compiler, &program, &args)?;

        if keep_intermediates {
            debug!("keeping intermediate files");
        } else {
            let removed = clean_intermediates(&self.root)?;
            info!(removed, "removed intermediate files");
        }
        Ok(())
    }

    fn run(
        &self,
        compiler: Compiler,
        program: &Path,
        args: &[OsString],
    ) -> Result<(), CompileError> {
        let mut log = tempfile::tempfile()
            .map_err(CompileError::io("creating compiler output capture file"))?;
        let clone_log = |log: &File| {
            log.try_clone()
                .map_err(CompileError::io("cloning compiler output capture file"))
        };

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(clone_log(&log)?)
            .stderr(clone_log(&log)?)
            .spawn()
            .map_err(CompileError::io(format!("running {:?}", program)))?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            let waited = child
                .try_wait()
                .map_err(CompileError::io(format!("waiting for {:?}", program)))?;
            if let Some(status) = waited {
                break status;
            }
            if Instant::now() >= deadline {
                warn!(compiler = compiler.program(), timeout = ?self.timeout, "killing compiler");
                // The child may have exited in the meantime.
                let _ = child.kill();
                let _ = child.wait();
                return Err(CompileError::Timeout {
                    compiler,
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        if status.success() {
            return Ok(());
        }
        let output = read_tail(&mut log)
            .map_err(CompileError::io("reading compiler output"))?;
        Err(CompileError::Compilation {
            compiler,
            status,
            output,
        })
    }
}

fn read_tail(log: &mut File) -> io::Result<String> {
    log.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    log.read_to_end(&mut buf)?;
    let text = String::from_utf8_lossy(&buf);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(OUTPUT_TAIL_LINES);
    Ok(lines[start..].join("\n"))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// Recursively removes files under `root` with one of the
/// `INTERMEDIATE_EXTENSIONS`. Returns the number of files removed.
pub fn clean_intermediates(root: &Path) -> Result<usize, CompileError> {
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let mut removed = 0;
    for ext in INTERMEDIATE_EXTENSIONS {
        let pattern = format!("{}/**/*.{}", escaped_root, ext);
        let paths = glob::glob(&pattern).map_err(|e| CompileError::Io {
            context: format!("bad pattern {:?}", pattern),
            source: io::Error::new(io::ErrorKind::InvalidInput, e.to_string()),
        })?;
        for entry in paths {
            let path = entry.map_err(|e| {
                let context = format!("searching {:?}", e.path());
                CompileError::io(context)(e.into_error())
            })?;
            if !path.is_file() {
                continue;
            }
            fs::remove_file(&path).map_err(CompileError::io(format!("removing {:?}", path)))?;
            debug!(path = ?path, "removed");
            removed += 1;
        }
    }
    Ok(removed)
}
