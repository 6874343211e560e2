//! Text-mode rendering for the `flightdb` binary. JSON output bypasses it.

use std::fmt::Display;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use flightdb::query::RowSet;
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Theme {
    Auto,
    Light,
    Dark,
    Plain,
}

/// Kind of one-line notice.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tone {
    Info,
    Done,
    /// Written to stderr.
    Warn,
}

impl Tone {
    fn marker(self) -> &'static str {
        match self {
            Tone::Info => "·",
            Tone::Done => "ok",
            Tone::Warn => "!!",
        }
    }
}

pub struct Ui {
    styles: Styles,
    quiet: bool,
}

impl Ui {
    pub fn new(theme: Theme, quiet: bool) -> Self {
        let paint = theme != Theme::Plain && !quiet && std::io::stdout().is_terminal();
        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }
        Self {
            styles: if paint {
                Styles::for_theme(theme)
            } else {
                Styles::default()
            },
            quiet,
        }
    }

    /// Right-aligned `label: value` lines under `title`; nothing for no rows.
    pub fn fields<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(&str, String)> = rows
            .into_iter()
            .map(|(label, value)| (label, value.to_string()))
            .collect();
        if rows.is_empty() {
            return;
        }
        self.title(title);
        let width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
        for (label, value) in rows {
            let label = format!("{label:>width$}:");
            println!(
                "  {} {}",
                self.styles.label.paint(label),
                self.styles.value.paint(value)
            );
        }
    }

    /// One dashed line per entry under `title`.
    pub fn bullets<I>(&self, title: &str, entries: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut entries = entries.into_iter().peekable();
        if entries.peek().is_none() {
            return;
        }
        self.title(title);
        for entry in entries {
            println!("  - {entry}");
        }
    }

    /// Column-aligned rendering of a result set, header first.
    pub fn table(&self, rows: &RowSet) {
        let cells: Vec<Vec<String>> = rows
            .rows()
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        let mut widths: Vec<usize> = rows.columns().iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let line = |values: &[String]| -> String {
            values
                .iter()
                .zip(&widths)
                .map(|(value, width)| format!("{value:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };
        println!("{}", self.styles.label.paint(line(rows.columns())));
        for row in &cells {
            println!("{}", line(row));
        }
    }

    /// Prints `message`; quiet mode drops the marker.
    pub fn say(&self, tone: Tone, message: &str) {
        let line = if self.quiet {
            message.to_string()
        } else {
            let style = match tone {
                Tone::Info => self.styles.info,
                Tone::Done => self.styles.done,
                Tone::Warn => self.styles.warn,
            };
            format!("{} {message}", style.paint(tone.marker()))
        };
        match tone {
            Tone::Warn => eprintln!("{line}"),
            Tone::Info | Tone::Done => println!("{line}"),
        }
    }

    /// Spinner shown while an extract loads; hidden in quiet mode.
    pub fn spinner(&self, label: impl Into<String>) -> Spinner {
        let bar = (!self.quiet).then(|| {
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("◐◓◑◒ ");
            let bar = ProgressBar::new_spinner().with_style(style);
            bar.set_message(label.into());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        Spinner {
            bar,
            started: Instant::now(),
        }
    }

    fn title(&self, title: &str) {
        println!("{}", self.styles.title.paint(title));
    }
}

pub struct Spinner {
    bar: Option<ProgressBar>,
    started: Instant,
}

impl Spinner {
    /// Clears the spinner and returns the time since it started.
    pub fn finish(self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs >= 1.0 {
        format!("{secs:.2}s")
    } else {
        format!("{:.0}ms", secs * 1_000.0)
    }
}

#[derive(Default)]
struct Styles {
    title: Style,
    label: Style,
    value: Style,
    info: Style,
    done: Style,
    warn: Style,
}

impl Styles {
    fn for_theme(theme: Theme) -> Self {
        let (accent, text) = match theme {
            Theme::Light => (Color::Blue, Color::Black),
            Theme::Dark | Theme::Auto | Theme::Plain => (Color::Cyan, Color::White),
        };
        Self {
            title: accent.bold().underline(),
            label: accent.normal(),
            value: text.normal(),
            info: accent.normal(),
            done: Color::Green.bold(),
            warn: Color::Yellow.bold(),
        }
    }
}
