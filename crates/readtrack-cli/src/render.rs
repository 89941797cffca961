use readtrack_core::dates::format_display_date;
use readtrack_core::{BookDashboard, CurrentBook, HistoryEntry, LifetimeStats, TargetStatus};

pub const TARGET_RESET_NOTICE: &str = "Target date has been reset!";

fn progress_label(progress: Option<u8>) -> String {
    match progress {
        Some(p) => format!("{p:>3}%"),
        None => "not started".to_string(),
    }
}

pub fn current_line(book: &CurrentBook) -> String {
    let b = &book.record.book;
    format!(
        "{id:>4}  {title:<40}  {author:<25}  {progress}",
        id = b.id.0,
        title = b.title,
        author = b.author,
        progress = progress_label(book.progress),
    )
}

pub fn dashboard(view: &BookDashboard) -> String {
    let record = &view.record;
    let book = &record.book;
    let mut lines = vec![
        format!("{} by {}", book.title, book.author),
        format!("ISBN {}, {} pages", book.isbn, book.pages),
    ];

    if view.target_reset {
        lines.push(TARGET_RESET_NOTICE.to_string());
    }

    match (record.start_date, view.current.as_ref()) {
        (Some(start), Some(current)) => {
            lines.push(format!(
                "Progress: {} (page {}, {} pages left)",
                progress_label(view.progress).trim_start(),
                record.page.unwrap_or(0),
                view.pages_left
            ));
            lines.push(format!("Started: {}", format_display_date(start)));
            let finish = match current.completion_date {
                Some(date) => format!("finishing {}", format_display_date(date)),
                None => "no finish date yet".to_string(),
            };
            lines.push(format!("Current pace: {:.1} pages/day, {finish}", current.daily_rate));
        }
        _ => lines.push(format!("Not started yet. Record a page with `readtrack update {} <page>`.", book.id)),
    }

    match view.target {
        TargetStatus::Active { target, required_rate } => lines.push(format!(
            "Target: {}, {:.1} pages/day needed",
            format_display_date(target),
            required_rate
        )),
        TargetStatus::Unset | TargetStatus::Expired { .. } => lines.push(format!(
            "Target: none (earliest possible {})",
            format_display_date(view.earliest_target)
        )),
    }

    if !view.fixed.is_empty() {
        lines.push("Fixed sessions:".to_string());
        for fixed in &view.fixed {
            lines.push(format!(
                "  {:>3} min/day ({} pages): finishing {}",
                fixed.minutes,
                fixed.pages_per_day,
                format_display_date(fixed.completion_date)
            ));
        }
    }

    lines.join("\n")
}

pub fn history_line(entry: &HistoryEntry) -> String {
    format!(
        "{title:<40}  {author:<25}  {start} to {end}  {days} days, {rate:.1} pages/day",
        title = entry.book.title,
        author = entry.book.author,
        start = format_display_date(entry.start_date),
        end = format_display_date(entry.end_date),
        days = entry.days,
        rate = entry.rate,
    )
}

pub fn stats(stats: &LifetimeStats) -> String {
    format!(
        "Books completed:    {}\nPages read:         {}\nAverage pages/day:  {}",
        stats.total_books_completed, stats.total_pages_read, stats.average_daily_rate
    )
}
