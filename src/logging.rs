use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Filter directives, e.g. `debug` or `mongo_chat=debug,reqwest=warn`.
pub(crate) const LOG_LEVEL_ENV: &str = "MONGO_CHAT_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

/// Routes log lines to the session log file. The full-screen UI owns the
/// terminal, so stderr is only used by line-mode commands, and only when the
/// file cannot be opened.
#[derive(Clone)]
pub(crate) struct LogFileMakeWriter {
    pub file: Option<Arc<Mutex<File>>>,
    pub mirror_stderr: bool,
}

impl<'a> MakeWriter<'a> for LogFileMakeWriter {
    type Writer = LogFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter {
            file: self.file.clone(),
            mirror_stderr: self.mirror_stderr,
        }
    }
}

pub(crate) struct LogFileWriter {
    file: Option<Arc<Mutex<File>>>,
    mirror_stderr: bool,
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(file) = &self.file {
            let mut file = file.lock().unwrap_or_else(|e| e.into_inner());
            file.write_all(buf)?;
        }
        if self.mirror_stderr {
            std::io::stderr().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(file) = &self.file {
            file.lock().unwrap_or_else(|e| e.into_inner()).flush()?;
        }
        if self.mirror_stderr {
            std::io::stderr().flush()?;
        }
        Ok(())
    }
}

pub(crate) fn log_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join("logs").join("mongo-chat.log")
}

fn open_log_file(data_dir: &Path) -> std::io::Result<File> {
    let path = log_file_path(data_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Reads `MONGO_CHAT_LOG`, falling back to `info` when it is unset or invalid.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber. `owns_terminal` is true for the
/// full-screen UI, which must never see log output on its screen.
pub(crate) fn init(data_dir: &Path, owns_terminal: bool) {
    let file = open_log_file(data_dir).ok().map(|f| Arc::new(Mutex::new(f)));
    let make_writer = LogFileMakeWriter {
        mirror_stderr: file.is_none() && !owns_terminal,
        file,
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter())
        .with_ansi(false)
        .with_writer(make_writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn default_filter_enables_info() {
        let filter = EnvFilter::new(DEFAULT_LOG_FILTER);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn per_target_directives_are_accepted() {
        let filter = EnvFilter::try_new("mongo_chat=debug,reqwest=warn").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let quiet = EnvFilter::try_new("error").unwrap();
        assert_eq!(quiet.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn writer_appends_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = open_log_file(dir.path()).unwrap();
        let make_writer = LogFileMakeWriter {
            file: Some(Arc::new(Mutex::new(file))),
            mirror_stderr: false,
        };

        make_writer.make_writer().write_all(b"first\n").unwrap();
        let mut second = make_writer.make_writer();
        second.write_all(b"second\n").unwrap();
        second.flush().unwrap();

        let mut contents = String::new();
        File::open(log_file_path(dir.path()))
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
