//! Command sourcing: the commands file first, then interactive input.

use std::collections::VecDeque;
use std::io;
use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

/// Read the non-blank lines of a commands file.
///
/// A missing file yields no commands.
pub async fn load_commands(path: &Path) -> io::Result<Vec<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No commands file provided");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Yields queued lines first, then lines from an interactive reader until
/// it reaches EOF.
pub struct CommandSource<R> {
    queued: VecDeque<String>,
    interactive: Option<Lines<R>>,
}

impl CommandSource<BufReader<Stdin>> {
    /// Commands file followed by standard input (unless `interactive` is
    /// false).
    pub async fn open(commands_file: &Path, interactive: bool) -> io::Result<Self> {
        let queued = load_commands(commands_file).await?;
        info!(commands = queued.len(), "Loaded commands file");

        let stdin = interactive.then(|| BufReader::new(tokio::io::stdin()));
        Ok(Self::new(queued, stdin))
    }
}

impl<R: AsyncBufRead + Unpin> CommandSource<R> {
    pub fn new(queued: impl IntoIterator<Item = String>, interactive: Option<R>) -> Self {
        Self {
            queued: queued.into_iter().collect(),
            interactive: interactive.map(AsyncBufReadExt::lines),
        }
    }

    /// Next command line, or `None` once every source is exhausted.
    pub async fn next_line(&mut self) -> Option<String> {
        if let Some(line) = self.queued.pop_front() {
            return Some(line);
        }

        let lines = self.interactive.as_mut()?;
        match lines.next_line().await {
            Ok(Some(line)) => Some(line),
            Ok(None) => {
                self.interactive = None;
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to read standard input");
                self.interactive = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_missing_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let commands = load_commands(&dir.path().join("absent.txt")).await.unwrap();
        assert!(commands.is_empty());
    }

    #[tokio::test]
    async fn test_blank_lines_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SPAWN 10 PUSH").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "   ").unwrap();
        writeln!(file, "UNICAST 0").unwrap();

        let commands = load_commands(file.path()).await.unwrap();

        assert_eq!(commands, vec!["SPAWN 10 PUSH", "UNICAST 0"]);
    }

    #[tokio::test]
    async fn test_queued_lines_come_before_interactive() {
        let interactive: &[u8] = b"STATUS\nKILL\n";
        let mut source = CommandSource::new(
            vec!["SPAWN 3 PUSH".to_string()],
            Some(BufReader::new(interactive)),
        );

        assert_eq!(source.next_line().await.as_deref(), Some("SPAWN 3 PUSH"));
        assert_eq!(source.next_line().await.as_deref(), Some("STATUS"));
        assert_eq!(source.next_line().await.as_deref(), Some("KILL"));
        assert_eq!(source.next_line().await, None);
        assert_eq!(source.next_line().await, None);
    }

    #[tokio::test]
    async fn test_without_interactive_input() {
        let mut source: CommandSource<BufReader<&[u8]>> =
            CommandSource::new(vec!["KILL".to_string()], None);

        assert_eq!(source.next_line().await.as_deref(), Some("KILL"));
        assert_eq!(source.next_line().await, None);
    }
}
