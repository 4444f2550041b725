use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use clap::Parser;
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gearhub::center::filter::{InboxQuery, Tab};
use gearhub::center::{refresh, InboxView, NotificationCenter};
use gearhub::models::report::{format_number, week_containing, UsageReportView};
use gearhub::report::{DateRange, ReportSession};
use gearhub::store::memory::MemoryStore;
use gearhub::store::postgres::PgStore;
use gearhub::store::InboxStore;
use gearhub::{api, cli, config, notification, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "gearhub=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port, in_memory }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port, in_memory).await
        }
        Some(cli::Commands::Inbox {
            user,
            filter,
            type_filter,
            tab,
            mark_all,
            watch,
        }) => {
            let query = InboxQuery {
                filter,
                type_filter,
                tab,
            };
            handle_inbox_command(&cfg, user, query, mark_all, watch).await
        }
        Some(cli::Commands::Report { from, to, csv, pdf }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            handle_report_command(Arc::new(db), from, to, csv, pdf).await
        }
        Some(cli::Commands::Announce { title, content }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            let announcement = db.create_announcement(&title, &content).await?;
            println!(
                "Announcement published:\n  ID:     {}\n  Title:  {}",
                announcement.id, announcement.title
            );
            Ok(())
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port, false).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16, in_memory: bool) -> anyhow::Result<()> {
    let mailer = notification::from_config(&cfg)?;

    let state = if in_memory {
        tracing::warn!("Running with the in-memory store; data is lost on exit");
        AppState::with_store(Arc::new(MemoryStore::new()), mailer, cfg)
    } else {
        tracing::info!("Connecting to database...");
        let db = PgStore::connect(&cfg.database_url).await?;

        tracing::info!("Running migrations...");
        db.migrate().await?;

        AppState::with_store(Arc::new(db), mailer, cfg)
    };

    let app = api::router(Arc::new(state)).layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("GearHub listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_inbox_command(
    cfg: &config::Config,
    user: uuid::Uuid,
    query: InboxQuery,
    mark_all: bool,
    watch: bool,
) -> anyhow::Result<()> {
    let db = Arc::new(PgStore::connect(&cfg.database_url).await?);
    let mut center = NotificationCenter::new(user, db.clone(), db);

    if !watch {
        center.load().await;
        if mark_all {
            let marked = center.mark_all_read(query.tab).await;
            println!("Marked {} item(s) as read.", marked);
        }
        print_inbox(&center.view(&query), query.tab);
        return Ok(());
    }

    if mark_all {
        center.load().await;
        let marked = center.mark_all_read(query.tab).await;
        println!("Marked {} item(s) as read.", marked);
    }

    let center = Arc::new(Mutex::new(center));
    let handle = refresh::spawn(center, cfg.refresh_interval(), move |c| {
        print_inbox(&c.view(&query), query.tab);
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    handle.stop();
    Ok(())
}

fn print_inbox(view: &InboxView, tab: Tab) {
    println!(
        "Unread: {} ({} system, {} announcements)",
        view.unread.total, view.unread.notifications, view.unread.announcements
    );

    if !matches!(tab, Tab::Announcements) {
        println!("\nSystem alerts:");
        if view.notifications.is_empty() {
            println!("  (none)");
        }
        for n in &view.notifications {
            println!(
                "  {} [{:<16}] {}  {}",
                if n.read { " " } else { "*" },
                n.r#type.as_str(),
                n.created_at.format("%Y-%m-%d %H:%M"),
                n.message
            );
        }
    }

    if !matches!(tab, Tab::System) {
        println!("\nAnnouncements:");
        if view.announcements.is_empty() {
            println!("  (none)");
        }
        for a in &view.announcements {
            println!(
                "  {} {}  {}: {}",
                if a.read { " " } else { "*" },
                a.created_at.format("%Y-%m-%d %H:%M"),
                a.title,
                a.content
            );
        }
    }
}

async fn handle_report_command(
    source: Arc<PgStore>,
    from: Option<chrono::NaiveDate>,
    to: Option<chrono::NaiveDate>,
    csv: Option<std::path::PathBuf>,
    pdf: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    let range = if from.is_none() && to.is_none() {
        let (start, end) = week_containing(chrono::Local::now().date_naive());
        DateRange::new(start, end)
    } else {
        DateRange { from, to }
    };

    let mut session = ReportSession::new(source);
    let report = session.generate(range).await?;
    let view = UsageReportView::from(&*report);

    println!("{}", report.title());
    if view.gear_usage.is_empty() {
        println!("No activity data found for the selected period.");
    } else {
        println!(
            "{:<32} {:>9} {:>10} {:>9} {:>9} {:>8} {:>8}",
            "GEAR", "REQUESTS", "CHECK-OUTS", "CHECK-INS", "BOOKINGS", "DAMAGES", "TOTAL"
        );
        for row in &view.gear_usage {
            println!(
                "{:<32} {:>9} {:>10} {:>9} {:>9} {:>8} {:>8}",
                row.usage.gear_name,
                row.usage.request_count,
                row.usage.checkout_count,
                row.usage.checkin_count,
                row.usage.booking_count,
                row.usage.damage_count,
                row.total_activity
            );
        }
        let t = view.totals;
        println!(
            "{:<32} {:>9} {:>10} {:>9} {:>9} {:>8} {:>8}",
            "TOTAL",
            format_number(t.requests),
            format_number(t.checkouts),
            format_number(t.checkins),
            format_number(t.bookings),
            format_number(t.damages),
            format_number(t.total_activity())
        );
    }

    if let Some(path) = csv {
        if let Some(file) = session.download_as_csv()? {
            std::fs::write(&path, &file.bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("CSV written to {}", path.display());
        }
    }
    if let Some(path) = pdf {
        if let Some(file) = session.download_as_pdf()? {
            std::fs::write(&path, &file.bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("PDF written to {}", path.display());
        }
    }

    Ok(())
}
