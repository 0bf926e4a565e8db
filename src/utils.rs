use anyhow::Result;
use chrono::{DateTime, Local};
use log::{LevelFilter, Record};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

// File logger for the terminal front end. The TUI owns stdout, so log output
// goes to a file unless none is configured.

pub struct SimpleLogger {
    log_file: Option<Mutex<std::fs::File>>,
}

impl SimpleLogger {
    pub fn new(log_file_path: Option<&Path>) -> Result<Self> {
        let log_file = match log_file_path {
            Some(path) => Some(Mutex::new(OpenOptions::new().create(true).append(true).open(path)?)),
            None => None,
        };

        Ok(SimpleLogger { log_file })
    }
}

fn format_record(record: &Record) -> String {
    let now: DateTime<Local> = Local::now();
    format!(
        "[{}] {} [{}:{}] {}\n",
        now.format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        record.args()
    )
}

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(record);

        match &self.log_file {
            Some(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = file.write_all(line.as_bytes());
                }
            }
            None => print!("{}", line),
        }
    }

    fn flush(&self) {
        match &self.log_file {
            Some(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = file.flush();
                }
            }
            None => {
                let _ = std::io::stdout().flush();
            }
        }
    }
}

pub fn setup_logging(log_file: Option<&Path>, level: LevelFilter) -> Result<()> {
    let logger = SimpleLogger::new(log_file)?;
    log::set_boxed_logger(Box::new(logger)).map(|()| log::set_max_level(level))?;

    log::info!("Logging initialized at level: {}", level);
    log::info!("{} version {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log};
    use tempfile::tempdir;

    #[test]
    fn test_logger_appends_formatted_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chatline.log");
        let logger = SimpleLogger::new(Some(path.as_path())).unwrap();

        log::set_max_level(LevelFilter::Debug);
        logger.log(
            &Record::builder()
                .args(format_args!("hello from the test"))
                .level(Level::Info)
                .file(Some("src/sync.rs"))
                .line(Some(42))
                .build(),
        );
        logger.flush();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("INFO [src/sync.rs:42] hello from the test"));
        assert!(written.ends_with('\n'));
    }
}
