//! Trading-session clock.
//!
//! Everything here is a pure function of a timestamp plus configured
//! session hours, so gating decisions are deterministic under test.
//! Hours are expressed in the reference timezone and may span midnight
//! (the US regular session seen from Asia/Shanghai runs 21:30–04:00).

use anyhow::{Context, Result};
use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::PolicyRejection;

/// Timezone the bot's clock and config are stated in.
pub const REFERENCE_TZ: Tz = chrono_tz::Asia::Shanghai;

/// Timezone of the traded market, drives daylight-saving refreshes.
pub const MARKET_TZ: Tz = chrono_tz::America::New_York;

const MARKET_OPEN: (u32, u32) = (9, 30);
const MARKET_CLOSE: (u32, u32) = (16, 0);

/// Session open/close, local to [`REFERENCE_TZ`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHours {
    pub open_hour: u32,
    pub open_minute: u32,
    pub close_hour: u32,
    pub close_minute: u32,
}

impl SessionHours {
    pub const fn new(open_hour: u32, open_minute: u32, close_hour: u32, close_minute: u32) -> Self {
        Self {
            open_hour,
            open_minute,
            close_hour,
            close_minute,
        }
    }

    pub fn open_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.open_hour, self.open_minute, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn close_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.close_hour, self.close_minute, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn spans_midnight(&self) -> bool {
        self.open_time() > self.close_time()
    }

    /// Recompute session hours for a given market-local trading date.
    ///
    /// Projects the market's regular 09:30–16:00 into the reference
    /// timezone, so the configured hours track daylight-saving shifts
    /// of the target market.
    ///
    /// # Errors
    /// Returns an error if either boundary does not exist in local time
    /// (a market open inside a DST gap, which US markets never schedule).
    pub fn for_market_date(market_date: NaiveDate) -> Result<Self> {
        let open = local_instant(MARKET_TZ, market_date, MARKET_OPEN.0, MARKET_OPEN.1)
            .context("market open not representable")?
            .with_timezone(&REFERENCE_TZ);
        let close = local_instant(MARKET_TZ, market_date, MARKET_CLOSE.0, MARKET_CLOSE.1)
            .context("market close not representable")?
            .with_timezone(&REFERENCE_TZ);

        Ok(Self::new(
            open.time().hour(),
            open.time().minute(),
            close.time().hour(),
            close.time().minute(),
        ))
    }
}

fn local_instant(tz: Tz, date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Tz>> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    tz.from_local_datetime(&date.and_time(time)).earliest()
}

/// Open/close instants of the session containing `now`, or `None` when
/// `now` falls outside any session. Handles the span-midnight case: a
/// timestamp just after midnight belongs to yesterday's session.
pub fn session_window(
    now: DateTime<Utc>,
    hours: &SessionHours,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let local = now.with_timezone(&REFERENCE_TZ);
    let t = local.time();
    let open = hours.open_time();
    let close = hours.close_time();

    let open_date = if hours.spans_midnight() {
        if t >= open {
            local.date_naive()
        } else if t <= close {
            local.date_naive() - Duration::days(1)
        } else {
            return None;
        }
    } else if t >= open && t <= close {
        local.date_naive()
    } else {
        return None;
    };

    let close_date = if hours.spans_midnight() {
        open_date + Duration::days(1)
    } else {
        open_date
    };

    let open_instant = local_instant(REFERENCE_TZ, open_date, hours.open_hour, hours.open_minute)?;
    let close_instant =
        local_instant(REFERENCE_TZ, close_date, hours.close_hour, hours.close_minute)?;

    Some((
        open_instant.with_timezone(&Utc),
        close_instant.with_timezone(&Utc),
    ))
}

/// Whether a new entry is permitted at `now`.
///
/// Rejected: weekends; the last trading day of the week from session
/// open onward (the position could not be closed before the week-end);
/// entirely outside the session; inside the guard window after open or
/// before close.
pub fn check_entry(
    now: DateTime<Utc>,
    hours: &SessionHours,
    guard_minutes: i64,
) -> Result<(), PolicyRejection> {
    let local = now.with_timezone(&REFERENCE_TZ);

    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return Err(PolicyRejection::WeekendOrLastDay);
    }
    if local.weekday() == Weekday::Fri && local.time() >= hours.open_time() {
        return Err(PolicyRejection::WeekendOrLastDay);
    }

    let (open_instant, close_instant) =
        session_window(now, hours).ok_or(PolicyRejection::OutsideSession)?;

    let guard = Duration::minutes(guard_minutes);
    if now < open_instant + guard || now > close_instant - guard {
        return Err(PolicyRejection::GuardWindow);
    }

    Ok(())
}

/// The current trading day: the date of the most recent session-open
/// instant, not the calendar date. Daily policy resets key off this.
pub fn trading_day(now: DateTime<Utc>, hours: &SessionHours) -> NaiveDate {
    let local = now.with_timezone(&REFERENCE_TZ);
    if local.time() >= hours.open_time() {
        local.date_naive()
    } else {
        local.date_naive() - Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours() -> SessionHours {
        SessionHours::new(21, 30, 4, 0)
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        REFERENCE_TZ
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn entry_rejected_before_open() {
        // Monday 21:00, session opens 21:30
        let res = check_entry(at(2024, 7, 1, 21, 0), &hours(), 30);
        assert_eq!(res, Err(PolicyRejection::OutsideSession));
    }

    #[test]
    fn entry_accepted_mid_session() {
        assert!(check_entry(at(2024, 7, 1, 22, 0), &hours(), 30).is_ok());
    }

    #[test]
    fn entry_accepted_after_midnight() {
        // Tuesday 01:00 is inside Monday's session
        assert!(check_entry(at(2024, 7, 2, 1, 0), &hours(), 30).is_ok());
    }

    #[test]
    fn entry_rejected_in_closing_guard() {
        // Tuesday 03:45, session closes 04:00
        let res = check_entry(at(2024, 7, 2, 3, 45), &hours(), 30);
        assert_eq!(res, Err(PolicyRejection::GuardWindow));
    }

    #[test]
    fn entry_rejected_in_opening_guard() {
        let res = check_entry(at(2024, 7, 1, 21, 45), &hours(), 30);
        assert_eq!(res, Err(PolicyRejection::GuardWindow));
    }

    #[test]
    fn weekend_rejected() {
        // Saturday and Sunday evenings
        assert_eq!(
            check_entry(at(2024, 7, 6, 22, 0), &hours(), 30),
            Err(PolicyRejection::WeekendOrLastDay)
        );
        assert_eq!(
            check_entry(at(2024, 7, 7, 22, 0), &hours(), 30),
            Err(PolicyRejection::WeekendOrLastDay)
        );
    }

    #[test]
    fn friday_session_rejected_from_open() {
        assert_eq!(
            check_entry(at(2024, 7, 5, 22, 0), &hours(), 30),
            Err(PolicyRejection::WeekendOrLastDay)
        );
        // Friday daytime is just outside the session, not a weekend ban
        assert_eq!(
            check_entry(at(2024, 7, 5, 12, 0), &hours(), 30),
            Err(PolicyRejection::OutsideSession)
        );
    }

    #[test]
    fn window_spans_midnight() {
        let (open, close) = session_window(at(2024, 7, 2, 1, 0), &hours()).unwrap();
        assert_eq!(open, at(2024, 7, 1, 21, 30));
        assert_eq!(close, at(2024, 7, 2, 4, 0));
    }

    #[test]
    fn trading_day_rolls_at_open_not_midnight() {
        // 21:29 still belongs to the previous trading day
        assert_eq!(
            trading_day(at(2024, 7, 2, 21, 29), &hours()),
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
        );
        assert_eq!(
            trading_day(at(2024, 7, 2, 21, 30), &hours()),
            NaiveDate::from_ymd_opt(2024, 7, 2).unwrap()
        );
        // After midnight, still the prior day's session
        assert_eq!(
            trading_day(at(2024, 7, 3, 2, 0), &hours()),
            NaiveDate::from_ymd_opt(2024, 7, 2).unwrap()
        );
    }

    #[test]
    fn market_hours_follow_daylight_saving() {
        // July: EDT, open 09:30 ET = 21:30 Shanghai
        let summer = SessionHours::for_market_date(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap())
            .unwrap();
        assert_eq!(summer, SessionHours::new(21, 30, 4, 0));

        // January: EST, open 09:30 ET = 22:30 Shanghai
        let winter = SessionHours::for_market_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
            .unwrap();
        assert_eq!(winter, SessionHours::new(22, 30, 5, 0));
    }
}
