use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use log::warn;
use tokio::sync::Mutex;

use crate::error::Result;

const HIGHLIGHT: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Everything worth keeping about one checked key pair.
#[derive(Debug, Clone)]
pub struct Record {
    pub wif: String,
    pub public_key: String,
    pub address: String,
    pub amount: f64,
}

impl Record {
    pub fn to_line(&self, unit: &str) -> String {
        format!(
            "Private Key: {} | Public Key: {} | Address: {} | Balance: {} {}",
            self.wif, self.public_key, self.address, self.amount, unit
        )
    }
}

/// Writes result lines to the run's log file and mirrors them to stdout.
/// Each destination has its own lock so concurrent emits never interleave
/// mid-line; the locks are held for a single line only.
pub struct ResultSink {
    log: Mutex<File>,
    console: Mutex<()>,
    unit: String,
}

impl ResultSink {
    /// Creates the log file fresh. Failing here means the run cannot record
    /// anything and must not start.
    pub fn create(path: &Path, unit: &str) -> Result<Self> {
        let file = File::create(path)?;

        Ok(Self {
            log: Mutex::new(file),
            console: Mutex::new(()),
            unit: unit.to_string(),
        })
    }

    /// Writes one record to both destinations. The durable write comes first
    /// and its failure is the caller's problem; a console failure after that
    /// point is only worth a warning.
    pub async fn emit(&self, record: &Record) -> Result<()> {
        let line = record.to_line(&self.unit);
        self.append(&line).await?;

        if let Err(e) = self.console_line(&line, record.amount > 0.0).await {
            warn!("console write failed: {e}");
        }

        Ok(())
    }

    /// Banner and separator lines, written to both destinations without
    /// highlighting.
    pub async fn note(&self, line: &str) -> Result<()> {
        self.append(line).await?;

        if let Err(e) = self.console_line(line, false).await {
            warn!("console write failed: {e}");
        }

        Ok(())
    }

    async fn append(&self, line: &str) -> Result<()> {
        let mut file = self.log.lock().await;
        writeln!(file, "{line}")?;
        file.flush()?;

        Ok(())
    }

    async fn console_line(&self, line: &str, highlight: bool) -> io::Result<()> {
        let _serialized = self.console.lock().await;
        let stdout = io::stdout();
        let mut out = stdout.lock();

        let written = write_styled(&mut out, line, highlight);
        let flushed = out.flush();
        written.and(flushed)
    }
}

fn write_styled(out: &mut impl Write, line: &str, highlight: bool) -> io::Result<()> {
    if highlight {
        let body = write!(out, "{HIGHLIGHT}{line}");
        // the reset is attempted even when the styled write failed, so a bad
        // line never leaves the terminal green
        let restored = writeln!(out, "{RESET}");
        body.and(restored)
    } else {
        writeln!(out, "{line}")
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("klib-sink-{}-{}.txt", name, std::process::id()))
    }

    fn sample_record(n: usize) -> Record {
        Record {
            wif: format!("KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHno{n:02}"),
            public_key: format!("02{n:064x}"),
            address: format!("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SA{n:02}"),
            amount: 0.0,
        }
    }

    fn assert_whole_line(line: &str) {
        let parts: Vec<&str> = line.split(" | ").collect();
        assert_eq!(4, parts.len(), "fragmented line: {line}");
        assert!(parts[0].starts_with("Private Key: "));
        assert!(parts[1].starts_with("Public Key: "));
        assert!(parts[2].starts_with("Address: "));
        assert!(parts[3].starts_with("Balance: "));
        assert!(parts[3].ends_with(" BTC"));
    }

    // errors out on the first write, then behaves, so the reset attempt after
    // a failed styled write is observable
    struct FlakyWriter {
        failed_once: bool,
        written: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.failed_once {
                self.failed_once = true;
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn positive_amount_is_highlighted_and_reset() {
        let mut out = Vec::new();
        write_styled(&mut out, "hit", true).unwrap();

        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.starts_with(HIGHLIGHT));
        assert!(rendered.ends_with(&format!("{RESET}\n")));
        assert!(rendered.contains("hit"));
    }

    #[test]
    fn zero_amount_is_unstyled() {
        let mut out = Vec::new();
        write_styled(&mut out, "miss", false).unwrap();

        assert_eq!("miss\n", String::from_utf8(out).unwrap());
    }

    #[test]
    fn reset_is_attempted_after_a_failed_styled_write() {
        let mut out = FlakyWriter {
            failed_once: false,
            written: Vec::new(),
        };

        let result = write_styled(&mut out, "hit", true);

        assert!(result.is_err());
        let rendered = String::from_utf8(out.written).unwrap();
        assert!(rendered.contains(RESET), "styling was left on: {rendered:?}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_emits_never_interleave() {
        let path = scratch_path("stress");
        let sink = Arc::new(ResultSink::create(&path, "BTC").unwrap());

        let mut handles = Vec::new();
        for n in 0..64 {
            let sink = Arc::clone(&sink);
            handles.push(tokio::spawn(async move {
                sink.emit(&sample_record(n)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let written = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(64, lines.len());
        for line in lines {
            assert_whole_line(line);
        }

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn notes_reach_the_log_unstyled() {
        let path = scratch_path("notes");
        let sink = ResultSink::create(&path, "BTC").unwrap();

        sink.note("Running on 8 CPU cores").await.unwrap();
        sink.note("--------------------------------------------------")
            .await
            .unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            "Running on 8 CPU cores\n--------------------------------------------------\n",
            written
        );

        fs::remove_file(&path).unwrap();
    }
}
