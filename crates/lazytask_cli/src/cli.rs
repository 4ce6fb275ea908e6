use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lazytask")]
#[command(about = "Extract and track tasks from natural-language notes", long_about = None)]
pub struct Cli {
    #[arg(long, global = true, default_value = "lazytask.db", help = "SQLite task database")]
    pub db: PathBuf,

    #[arg(long, global = true, help = "Parser config JSON (defaults apply to missing fields)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Absolute directory for rolling log files")]
    pub log_dir: Option<String>,

    #[arg(long, global = true, help = "Log level: trace|debug|info|warn|error")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Parse text and print the extracted task as JSON")]
    Parse {
        #[arg(help = "Task description")]
        text: String,

        #[arg(long, value_parser = parse_date, help = "Reference date (YYYY-MM-DD), default today")]
        date: Option<NaiveDate>,

        #[arg(long, help = "Also run the similarity-model path")]
        semantic: bool,
    },

    #[command(about = "Parse text and store the task")]
    Add {
        #[arg(help = "Task description")]
        text: String,

        #[arg(long, value_parser = parse_date, help = "Reference date (YYYY-MM-DD), default today")]
        date: Option<NaiveDate>,

        #[arg(long, help = "Also run the similarity-model path")]
        semantic: bool,
    },

    #[command(about = "List stored tasks")]
    List {
        #[arg(long, help = "todo|in_progress|done")]
        status: Option<String>,

        #[arg(long, help = "Category tag, e.g. statistics")]
        category: Option<String>,

        #[arg(long, help = "high|medium|low")]
        priority: Option<String>,

        #[arg(long, help = "Only unfinished tasks past their deadline")]
        overdue: bool,
    },

    #[command(about = "Change the status of the first task with this exact title")]
    Update {
        title: String,

        #[arg(help = "todo|in_progress|done")]
        status: String,
    },

    #[command(about = "Raise priorities of tasks whose deadline is now closer")]
    Refresh {
        #[arg(long, value_parser = parse_date, help = "Reference date (YYYY-MM-DD), default today")]
        date: Option<NaiveDate>,
    },
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD, got `{value}`: {err}"))
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
