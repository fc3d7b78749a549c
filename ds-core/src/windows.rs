use chrono::{
    NaiveTime,
    Timelike,
};
use ds_api::v1alpha1::Window;

use crate::errors::*;

err_impl! {WindowError,
    #[error("invalid time of day: {0}")]
    InvalidTime(String),

    #[error("window start must be before its end: {0}")]
    EmptyWindow(String),
}

/// Outcome of checking the current time against a set of alive windows.  Windows that could
/// not be evaluated do not stop the check; their errors are collected in `error`.
#[derive(Debug)]
pub struct WindowCheck {
    pub has_windows: bool,
    pub alive: bool,
    pub error: Option<anyhow::Error>,
}

pub fn parse_time_of_day(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| WindowError::invalid_time(s))
}

fn parse_window(w: &Window) -> anyhow::Result<(NaiveTime, NaiveTime)> {
    let from = parse_time_of_day(&w.from)?;
    let to = parse_time_of_day(&w.to)?;
    if from >= to {
        bail!(WindowError::empty_window(&format!("{} - {}", w.from, w.to)));
    }
    Ok((from, to))
}

pub fn is_in_alive_windows(now: NaiveTime, windows: &[Window]) -> WindowCheck {
    if windows.is_empty() {
        return WindowCheck { has_windows: false, alive: true, error: None };
    }

    let now = now.with_nanosecond(0).unwrap_or(now);
    let mut errs = vec![];
    let mut alive = false;
    for w in windows {
        match parse_window(w) {
            Ok((from, to)) if from < now && now < to => {
                alive = true;
                break;
            },
            Ok(_) => (),
            Err(e) => errs.push(e),
        }
    }

    WindowCheck { has_windows: true, alive, error: join_errors(errs).err() }
}
