use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{info, warn};

use crate::aggregate::{aggregate, Selector, MAX_TOP_N, MIN_TOP_N};
use crate::cache::DatasetCache;
use crate::config::DatasetSource;
use crate::error::{AnalysisError, AnalysisResult};
use crate::export::export_to_path;
use crate::normalize::CanonicalTable;
use crate::report::render_analysis;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run {
        selector: Selector,
        top_n: Option<usize>,
    },
    Export {
        selector: Selector,
        path: PathBuf,
        top_n: Option<usize>,
    },
    List,
    Reload,
    Help,
    Quit,
}

pub fn parse_top_n(raw: &str) -> Result<usize, String> {
    let value: usize = raw
        .trim()
        .parse()
        .map_err(|_| format!("top N must be a number, got '{raw}'"))?;
    if (MIN_TOP_N..=MAX_TOP_N).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "top N must be between {MIN_TOP_N} and {MAX_TOP_N}, got {value}"
        ))
    }
}

const EXPORT_USAGE: &str = "usage: export <analysis> <path> [top_n]";

/// Parses one input line. A line that is not a keyword is read as an
/// analysis selector, optionally followed by a top N; anything else left
/// over is an error.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let trimmed = line.trim();
    let mut parts = trimmed.split_whitespace();
    let head = parts.next().unwrap_or_default().to_lowercase();

    match head.as_str() {
        "" | "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        "list" | "ls" => Ok(Command::List),
        "reload" => Ok(Command::Reload),
        "export" => {
            let selector = parts.next().ok_or(EXPORT_USAGE)?.parse::<Selector>()?;
            let path = parts.next().ok_or(EXPORT_USAGE)?;
            let top_n = parts.next().map(parse_top_n).transpose()?;
            if parts.next().is_some() {
                return Err(EXPORT_USAGE.to_string());
            }
            Ok(Command::Export {
                selector,
                path: PathBuf::from(path),
                top_n,
            })
        }
        _ => {
            // Titles contain spaces, so try the whole line first.
            if let Ok(selector) = trimmed.parse::<Selector>() {
                return Ok(Command::Run {
                    selector,
                    top_n: None,
                });
            }
            let (name, top_n) = match trimmed.rsplit_once(char::is_whitespace) {
                Some((name, last)) if last.parse::<usize>().is_ok() => {
                    (name, Some(parse_top_n(last)?))
                }
                _ => (trimmed, None),
            };
            let selector = name.parse::<Selector>()?;
            Ok(Command::Run { selector, top_n })
        }
    }
}

pub fn help_text() -> String {
    let mut lines = vec![
        "Commands:".to_string(),
        "  <analysis> [top_n]                run an analysis (id, number or title)".to_string(),
        "  export <analysis> <path> [top_n]  write the analysis result as CSV".to_string(),
        "  list                              show available analyses".to_string(),
        "  reload                            drop the cached dataset".to_string(),
        "  quit                              leave the session".to_string(),
    ];
    lines.push(String::new());
    lines.push(list_text());
    lines.join("\n")
}

pub fn list_text() -> String {
    Selector::ALL
        .iter()
        .map(|selector| {
            format!(
                "{}. {:<28} {} [{}]",
                selector.number(),
                selector.id(),
                selector.title(),
                selector.category().label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One exploration session: every request recomputes from the cached
/// canonical dataset, which is re-read once the TTL has passed.
pub struct Session {
    source: DatasetSource,
    cache: DatasetCache<CanonicalTable>,
    top_n: usize,
}

impl Session {
    pub fn new(source: DatasetSource, ttl: Duration, top_n: usize) -> Self {
        Session {
            source,
            cache: DatasetCache::new(ttl),
            top_n,
        }
    }

    pub fn dataset(&mut self, now: DateTime<Utc>) -> AnalysisResult<&CanonicalTable> {
        if !self.cache.is_fresh(now) {
            info!("reading dataset");
        }
        let source = &self.source;
        self.cache.get_or_load(now, || source.load_canonical())
    }

    /// Handles one request. `Ok(None)` means the session should end.
    pub fn handle(&mut self, command: Command, now: DateTime<Utc>) -> AnalysisResult<Option<String>> {
        match command {
            Command::Quit => Ok(None),
            Command::Help => Ok(Some(help_text())),
            Command::List => Ok(Some(list_text())),
            Command::Reload => {
                self.cache.invalidate();
                let rows = self.dataset(now)?.height();
                Ok(Some(format!("Reloaded dataset ({rows} rows).")))
            }
            Command::Run { selector, top_n } => {
                let top_n = top_n.unwrap_or(self.top_n);
                let canonical = self.dataset(now)?;
                let result = aggregate(canonical, selector, Some(top_n))?;
                Ok(Some(render_analysis(selector, &result)))
            }
            Command::Export {
                selector,
                path,
                top_n,
            } => {
                let top_n = top_n.unwrap_or(self.top_n);
                let canonical = self.dataset(now)?;
                let result = aggregate(canonical, selector, Some(top_n))?;
                export_to_path(&result, &path)?;
                Ok(Some(format!(
                    "Wrote {} rows to {}.",
                    result.len(),
                    path.display()
                )))
            }
        }
    }
}

/// Interactive loop. Missing-column and per-request failures are reported and
/// the loop continues; a schema error ends the session.
pub fn run(mut session: Session) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new().context("failed to start line editor")?;
    println!("{}", list_text());
    println!("Type 'help' for commands.");

    loop {
        let line = match editor.readline("churn> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("failed to read input"),
        };
        let _ = editor.add_history_entry(line.as_str());

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match session.handle(command, Utc::now()) {
            Ok(Some(output)) => println!("{output}"),
            Ok(None) => break,
            Err(err @ AnalysisError::Schema { .. }) => {
                return Err(err).context("dataset cannot be analysed");
            }
            Err(err) if err.is_missing_column() => {
                warn!(error = %err, "analysis unavailable");
                println!("Warning: {err}");
            }
            Err(err) => println!("Error: {err}"),
        }
    }

    info!("session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn source_with(contents: &str) -> (tempfile::TempDir, DatasetSource) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("churn.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{contents}").unwrap();
        (dir, DatasetSource::Upload(path))
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_800_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
        assert_eq!(parse_command(""), Ok(Command::Help));
        assert_eq!(
            parse_command("state-churn 10"),
            Ok(Command::Run {
                selector: Selector::StateChurn,
                top_n: Some(10)
            })
        );
        assert_eq!(
            parse_command("Churn by International Plan"),
            Ok(Command::Run {
                selector: Selector::IntlPlanChurn,
                top_n: None
            })
        );
        assert_eq!(
            parse_command("export 5 out.csv"),
            Ok(Command::Export {
                selector: Selector::ServiceCallsChurn,
                path: PathBuf::from("out.csv"),
                top_n: None
            })
        );
        assert!(parse_command("state-churn 3").is_err());
        assert!(parse_command("nonsense").is_err());
    }

    #[test]
    fn top_n_follows_ids_and_titles() {
        assert_eq!(
            parse_command("Churn Rate by State 10"),
            Ok(Command::Run {
                selector: Selector::StateChurn,
                top_n: Some(10)
            })
        );
        assert_eq!(
            parse_command("export state-churn out.csv 7"),
            Ok(Command::Export {
                selector: Selector::StateChurn,
                path: PathBuf::from("out.csv"),
                top_n: Some(7)
            })
        );
    }

    #[test]
    fn leftover_words_are_rejected() {
        assert!(parse_command("state-churn 10 extra").is_err());
        assert!(parse_command("state-churn extra").is_err());
        assert_eq!(
            parse_command("export state-churn out.csv 7 extra"),
            Err(EXPORT_USAGE.to_string())
        );
        assert!(parse_command("export state-churn out.csv 60").is_err());
    }

    #[test]
    fn top_n_range_is_enforced() {
        assert_eq!(parse_top_n("5"), Ok(5));
        assert_eq!(parse_top_n("50"), Ok(50));
        assert!(parse_top_n("51").is_err());
        assert!(parse_top_n("x").is_err());
    }

    #[test]
    fn cached_dataset_survives_file_changes_until_expiry() {
        let (dir, source) = source_with("State,Churn\nNY,Yes\n");
        let mut session = Session::new(source, Duration::seconds(3600), 20);
        assert_eq!(session.dataset(at(0)).unwrap().height(), 1);

        let path = dir.path().join("churn.csv");
        std::fs::write(&path, "State,Churn\nNY,Yes\nCA,No\n").unwrap();
        assert_eq!(session.dataset(at(60)).unwrap().height(), 1);
        assert_eq!(session.dataset(at(3600)).unwrap().height(), 2);
    }

    #[test]
    fn missing_column_keeps_session_alive() {
        let (_dir, source) = source_with("State,Churn\nNY,Yes\n");
        let mut session = Session::new(source, Duration::seconds(3600), 20);
        let err = session
            .handle(
                Command::Run {
                    selector: Selector::IntlPlanChurn,
                    top_n: None,
                },
                at(0),
            )
            .unwrap_err();
        assert!(err.is_missing_column());

        let output = session
            .handle(
                Command::Run {
                    selector: Selector::StateChurn,
                    top_n: None,
                },
                at(1),
            )
            .unwrap()
            .unwrap();
        assert!(output.contains("| NY | 1 |"));
    }

    #[test]
    fn schema_error_surfaces() {
        let (_dir, source) = source_with("State\nNY\n");
        let mut session = Session::new(source, Duration::seconds(3600), 20);
        let err = session.handle(Command::Reload, at(0)).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema { .. }));
    }

    #[test]
    fn export_writes_csv() {
        let (dir, source) = source_with("State,Churn\nNY,Yes\nCA,No\n");
        let mut session = Session::new(source, Duration::seconds(3600), 20);
        let path = dir.path().join("state.csv");
        let output = session
            .handle(
                Command::Export {
                    selector: Selector::StateChurn,
                    path: path.clone(),
                    top_n: None,
                },
                at(0),
            )
            .unwrap()
            .unwrap();
        assert!(output.starts_with("Wrote 2 rows"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "State,churn_count\nNY,1\nCA,0\n");
    }

    #[test]
    fn export_honours_top_n() {
        let (dir, source) = source_with("State,Churn\nWV,Yes\nTX,Yes\nNY,Yes\nMN,Yes\nCA,Yes\nAL,Yes\n");
        let mut session = Session::new(source, Duration::seconds(3600), 20);
        let path = dir.path().join("top.csv");
        let command = parse_command(&format!("export state-churn {} 5", path.display())).unwrap();
        session.handle(command, at(0)).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "State,churn_count\nAL,1\nCA,1\nMN,1\nNY,1\nTX,1\n");
    }
}
