use crate::parser::LineParser;
use crate::pipeline::Sender;
use crate::record::TelemetryRecord;
use crate::source::locator::FileLocator;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Timing knobs for the tail loop.
#[derive(Debug, Clone)]
pub struct TailerOptions {
    /// Sleep at end-of-file before re-checking for new data and rotation.
    pub poll_interval: Duration,
    /// Sleep between directory polls while no log file exists.
    pub seek_retry_interval: Duration,
    /// Sleep before re-seeking after a vanished file or a read error.
    pub error_delay: Duration,
}

/// How one tailed file ended.
enum TailEnd {
    /// The locator now names a different file; re-seek immediately.
    Rotated,
    /// The open path is gone or unreadable; re-seek after a delay.
    Vanished,
    /// Shutdown was requested or every consumer is gone.
    Closed,
}

/// Follows the station's current log file and feeds parsed records
/// downstream.
///
/// The tailer is the sole owner of the open file handle and its read
/// position. It never replays history: each file is opened seeked to its
/// end, so only lines appended while we watch become records. Within one
/// file, records leave in exact read order; across a rotation the old file
/// is closed before the new one is opened.
pub struct Tailer {
    locator: FileLocator,
    parser: LineParser,
    options: TailerOptions,
}

impl Tailer {
    pub fn new(locator: FileLocator, parser: LineParser, options: TailerOptions) -> Self {
        Self {
            locator,
            parser,
            options,
        }
    }

    /// Outer loop: seek a file, tail it until it rotates or vanishes, seek
    /// again. Nothing in here is fatal; the loop only exits on shutdown or
    /// when the output channel closes.
    pub async fn run(self, output: Sender<TelemetryRecord>, shutdown: CancellationToken) {
        info!(directory = %self.locator.directory().display(), "Tailer started");

        loop {
            let path = tokio::select! {
                _ = shutdown.cancelled() => break,
                path = self.seek_file() => path,
            };

            let mut active = match ActiveFile::open_at_end(&path) {
                Ok(active) => active,
                Err(e) => {
                    // Lost a race with rotation or deletion between locate
                    // and open.
                    warn!(path = %path.display(), error = %e, "Failed to open log file");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = sleep(self.options.error_delay) => continue,
                    }
                }
            };

            info!(path = %path.display(), "Tailing log file");
            match self.tail(&mut active, &output, &shutdown).await {
                TailEnd::Rotated => {
                    info!(path = %path.display(), "Log rotation detected");
                }
                TailEnd::Vanished => {
                    warn!(path = %path.display(), "Log file vanished");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = sleep(self.options.error_delay) => {}
                    }
                }
                TailEnd::Closed => break,
            }
        }

        info!("Tailer shutdown complete");
    }

    /// Poll the locator until a log file appears.
    async fn seek_file(&self) -> PathBuf {
        loop {
            if let Some(path) = self.locator.locate() {
                return path;
            }
            debug!(
                directory = %self.locator.directory().display(),
                "No log file found, retrying"
            );
            sleep(self.options.seek_retry_interval).await;
        }
    }

    /// Inner read loop over one open file.
    async fn tail(
        &self,
        active: &mut ActiveFile,
        output: &Sender<TelemetryRecord>,
        shutdown: &CancellationToken,
    ) -> TailEnd {
        loop {
            match active.read_line() {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let record = self.parser.parse(trimmed);
                    if output.send(record).await.is_err() {
                        return TailEnd::Closed;
                    }
                }
                Ok(None) => {
                    // No new data. Wait a tick, then decide whether the file
                    // we hold is still the current one.
                    tokio::select! {
                        _ = shutdown.cancelled() => return TailEnd::Closed,
                        _ = sleep(self.options.poll_interval) => {}
                    }
                    if let Some(latest) = self.locator.locate() {
                        if latest != active.path {
                            return TailEnd::Rotated;
                        }
                    }
                    if !active.path.exists() {
                        return TailEnd::Vanished;
                    }
                }
                Err(e) => {
                    // Permission loss or disk trouble mid-read: treat like a
                    // vanished file and let the outer loop recover.
                    warn!(path = %active.path.display(), error = %e, "Read error on log file");
                    return TailEnd::Vanished;
                }
            }
        }
    }
}

/// The one open file handle plus its path, positioned past everything that
/// existed at open time.
struct ActiveFile {
    path: PathBuf,
    reader: BufReader<File>,
}

impl ActiveFile {
    fn open_at_end(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::End(0))?;
        Ok(Self {
            path: path.to_path_buf(),
            reader,
        })
    }

    /// Next available line, or None at end-of-file.
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line)?;
        if bytes == 0 {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{create_channel, Receiver};
    use crate::record::Category;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::time::SystemTime;
    use tempfile::TempDir;
    use tokio::time::timeout;

    fn fast_options() -> TailerOptions {
        TailerOptions {
            poll_interval: Duration::from_millis(20),
            seek_retry_interval: Duration::from_millis(20),
            error_delay: Duration::from_millis(20),
        }
    }

    fn append(path: &Path, lines: &[&str]) {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
    }

    fn spawn_tailer(
        dir: &Path,
    ) -> (
        Receiver<TelemetryRecord>,
        CancellationToken,
        tokio::task::JoinHandle<()>,
    ) {
        let (tx, rx) = create_channel(256);
        let shutdown = CancellationToken::new();
        let tailer = Tailer::new(
            FileLocator::new(dir, "estacao"),
            LineParser::new(),
            fast_options(),
        );
        let handle = tokio::spawn(tailer.run(tx, shutdown.clone()));
        (rx, shutdown, handle)
    }

    async fn recv_within(rx: &mut Receiver<TelemetryRecord>, secs: u64) -> TelemetryRecord {
        timeout(Duration::from_secs(secs), rx.recv())
            .await
            .expect("timed out waiting for record")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_appended_lines_become_records_in_order() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("estacao_1.log");
        append(&log, &["2024-01-15 09:59:59 INFO [EST01] pre-existing line"]);

        let (mut rx, shutdown, handle) = spawn_tailer(dir.path());
        // Give the tailer time to open the file at its end.
        tokio::time::sleep(Duration::from_millis(150)).await;

        append(
            &log,
            &[
                "2024-01-15 10:00:00 INFO [EST01] first",
                "2024-01-15 10:00:01 WARNING [EST01] second",
            ],
        );

        let first = recv_within(&mut rx, 5).await;
        let second = recv_within(&mut rx, 5).await;
        // The pre-existing line was before our start-of-watch position.
        assert_eq!(first.body, "first");
        assert_eq!(second.body, "second");
        assert_eq!(second.severity_text, "WARNING");

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_blank_lines_are_dropped_before_parsing() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("estacao_1.log");
        append(&log, &[]);

        let (mut rx, shutdown, handle) = spawn_tailer(dir.path());
        tokio::time::sleep(Duration::from_millis(150)).await;

        append(&log, &["", "   ", "not a structured line"]);

        let record = recv_within(&mut rx, 5).await;
        assert_eq!(record.category, Category::Unstructured);
        assert_eq!(record.body, "not a structured line");

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_rotation_switches_to_newer_file_at_its_end() {
        let dir = TempDir::new().unwrap();
        let old_log = dir.path().join("estacao_old.log");
        append(&old_log, &[]);

        let (mut rx, shutdown, handle) = spawn_tailer(dir.path());
        tokio::time::sleep(Duration::from_millis(150)).await;

        append(&old_log, &["2024-01-15 10:00:00 INFO [EST01] from old file"]);
        let record = recv_within(&mut rx, 5).await;
        assert_eq!(record.body, "from old file");

        // Rotate: a new file with content that predates our watch, stamped
        // newer than the old one so the locator prefers it.
        let new_log = dir.path().join("estacao_new.log");
        append(&new_log, &["2024-01-15 10:00:01 INFO [EST01] skipped history"]);
        File::options()
            .write(true)
            .open(&new_log)
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();

        // Let the tailer notice the rotation and reopen at the new end.
        tokio::time::sleep(Duration::from_millis(300)).await;
        append(&new_log, &["2024-01-15 10:00:02 INFO [EST01] from new file"]);

        let record = recv_within(&mut rx, 5).await;
        assert_eq!(record.body, "from new file");

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_vanished_file_recovers_on_replacement() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("estacao_1.log");
        append(&log, &[]);

        let (mut rx, shutdown, handle) = spawn_tailer(dir.path());
        tokio::time::sleep(Duration::from_millis(150)).await;

        std::fs::remove_file(&log).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // A fresh file appears and grows.
        append(&log, &[]);
        tokio::time::sleep(Duration::from_millis(200)).await;
        append(&log, &["2024-01-15 10:05:00 INFO [EST01] back online"]);

        let record = recv_within(&mut rx, 5).await;
        assert_eq!(record.body, "back online");

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_stops_seeking_loop() {
        let dir = TempDir::new().unwrap();
        // Empty directory: the tailer sits in SeekingFile.
        let (_rx, shutdown, handle) = spawn_tailer(dir.path());
        tokio::time::sleep(Duration::from_millis(100)).await;

        shutdown.cancel();
        timeout(Duration::from_secs(5), handle)
            .await
            .expect("tailer did not stop on shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn test_closed_channel_ends_tailer() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("estacao_1.log");
        append(&log, &[]);

        let (tx, rx) = create_channel(4);
        let shutdown = CancellationToken::new();
        let tailer = Tailer::new(
            FileLocator::new(dir.path(), "estacao"),
            LineParser::new(),
            fast_options(),
        );
        let handle = tokio::spawn(tailer.run(tx, shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(150)).await;

        drop(rx);
        append(&log, &["2024-01-15 10:00:00 INFO [EST01] into the void"]);

        timeout(Duration::from_secs(5), handle)
            .await
            .expect("tailer did not stop after channel close")
            .unwrap();
    }
}
