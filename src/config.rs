//! Command-line configuration. Every option can also be set through an `ISSUE_FILTER_*`
//! environment variable.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing_subscriber::EnvFilter;

use crate::milestone::current_milestone_index;
use crate::model::Snapshot;

#[derive(Debug, Clone, clap::Parser)]
#[command(name = "issue_filter", version, about = "Filter and order a snapshot of issues")]
pub struct Config {
    /// Filter expression, e.g. "milestone:current label:bug sort:-updated count:10"
    pub filter: String,

    /// JSON snapshot of issues, milestones, labels and collaborators
    #[arg(long, short, env = "ISSUE_FILTER_SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Index of the current milestone; defaults to the snapshot's, then to the first open
    /// milestone due on or after today
    #[arg(long, env = "ISSUE_FILTER_CURRENT_MILESTONE")]
    pub current_milestone: Option<usize>,

    /// Date relative qualifiers are measured from (YYYY-MM-DD); defaults to now
    #[arg(long, env = "ISSUE_FILTER_TODAY")]
    pub today: Option<NaiveDate>,

    /// Log filter, e.g. "debug" or "issue_filter=trace"
    #[arg(long, env = "ISSUE_FILTER_LOG", default_value = "warn")]
    pub log_level: String,

    /// Disable colored diagnostics and logs
    #[arg(long, env = "ISSUE_FILTER_NO_COLOR")]
    pub no_color: bool,

    /// Print the compiled expression before the results
    #[arg(long)]
    pub show_tree: bool,
}

impl Config {
    /// The reference instant: midnight UTC of `--today`, or the current time.
    pub fn now(&self) -> DateTime<Utc> {
        match self.today {
            Some(today) => today.and_time(NaiveTime::MIN).and_utc(),
            None => Utc::now(),
        }
    }

    pub fn current_milestone(&self, snapshot: &Snapshot) -> Option<usize> {
        self.current_milestone
            .or(snapshot.current_milestone)
            .or_else(|| current_milestone_index(&snapshot.milestones, self.now().date_naive()))
    }

    /// Installs the stderr log subscriber. An invalid filter falls back to "warn".
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_new(&self.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(!self.no_color)
            .try_init();
    }
}
