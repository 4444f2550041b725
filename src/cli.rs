use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::center::filter::{ReadFilter, Tab, TypeFilter};

/// GearHub: notification center and gear activity reports
#[derive(Parser)]
#[command(name = "gearhub", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (defaults to GEARHUB_PORT)
        #[arg(short, long)]
        port: Option<u16>,
        /// Keep all data in process instead of PostgreSQL
        #[arg(long)]
        in_memory: bool,
    },

    /// Show a user's notifications and announcements
    Inbox {
        #[arg(long)]
        user: Uuid,
        /// all | unread
        #[arg(long, default_value = "all")]
        filter: ReadFilter,
        /// all | system | request | gear
        #[arg(long = "type", default_value = "all")]
        type_filter: TypeFilter,
        /// all | system | announcements
        #[arg(long, default_value = "all")]
        tab: Tab,
        /// Mark every unread item of the tab as read before printing
        #[arg(long)]
        mark_all: bool,
        /// Keep refreshing until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Generate a gear activity report (defaults to the current week)
    Report {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Write the report as CSV to this path
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write the report as PDF to this path
        #[arg(long)]
        pdf: Option<PathBuf>,
    },

    /// Publish an announcement to every user
    Announce {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inbox_flags() {
        let cli = Cli::try_parse_from([
            "gearhub",
            "inbox",
            "--user",
            "00000000-0000-0000-0000-000000000001",
            "--filter",
            "unread",
            "--tab",
            "announcements",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Inbox { filter, tab, type_filter, watch, .. }) => {
                assert_eq!(filter, ReadFilter::Unread);
                assert_eq!(tab, Tab::Announcements);
                assert_eq!(type_filter, TypeFilter::All);
                assert!(!watch);
            }
            _ => panic!("expected inbox command"),
        }
    }

    #[test]
    fn test_rejects_unknown_tab() {
        let res = Cli::try_parse_from([
            "gearhub",
            "inbox",
            "--user",
            "00000000-0000-0000-0000-000000000001",
            "--tab",
            "archived",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_parse_report_dates() {
        let cli = Cli::try_parse_from(["gearhub", "report", "--from", "2024-05-06", "--to", "2024-05-12"])
            .unwrap();
        match cli.command {
            Some(Commands::Report { from, to, csv, .. }) => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2024, 5, 6));
                assert_eq!(to, NaiveDate::from_ymd_opt(2024, 5, 12));
                assert!(csv.is_none());
            }
            _ => panic!("expected report command"),
        }
    }
}
