//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `lifegrid_core` linkage without a UI host.
//! - Print one month grid as plain text: `lifegrid [year] [month0]`.
//!
//! Months are zero-indexed like everywhere else in core; the current local
//! month is used when arguments are omitted.

use lifegrid_core::calendar::labels::{is_today, month_label, weekday_labels};
use lifegrid_core::{build_month_grid, core_version, DayDate};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("lifegrid_core version={}", core_version());

    let today = DayDate::today().ok();
    let (year, month) = match parse_args(std::env::args().skip(1), today) {
        Ok(position) => position,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("usage: lifegrid [year] [month0]");
            return ExitCode::from(2);
        }
    };

    match build_month_grid(year, month) {
        Ok(grid) => {
            let title = month_label(grid.month()).unwrap_or("?");
            println!("{title} {}", grid.year());
            let header: String = weekday_labels()
                .iter()
                .map(|label| format!("{label:>3}"))
                .collect();
            println!("{header}");
            for week in grid.weeks() {
                let row: String = week
                    .iter()
                    .map(|cell| render_cell(*cell, today))
                    .collect();
                println!("{row}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("cannot build grid: {err}");
            ExitCode::from(2)
        }
    }
}

fn parse_args(
    mut args: impl Iterator<Item = String>,
    today: Option<DayDate>,
) -> Result<(i32, i32), String> {
    let year = args.next();
    let month = args.next();
    let (default_year, default_month) = today.map_or((1970, 0), |day| (day.year, day.month));

    let year = match year {
        Some(raw) => raw
            .parse::<i32>()
            .map_err(|_| format!("invalid year `{raw}`"))?,
        None => default_year,
    };
    let month = match month {
        Some(raw) => raw
            .parse::<i32>()
            .map_err(|_| format!("invalid month `{raw}`"))?,
        None => default_month,
    };
    Ok((year, month))
}

fn render_cell(cell: DayDate, today: Option<DayDate>) -> String {
    if cell.is_padding() {
        return "   ".to_string();
    }
    let marker = if today.is_some_and(|today| is_today(cell, today)) {
        '*'
    } else {
        ' '
    };
    format!("{:>2}{marker}", cell.day)
}
