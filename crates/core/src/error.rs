use thiserror::Error;

/// A genuine fault: bad input, bad credentials, or a collaborator that
/// failed. Policy refusals are *not* errors; see [`PolicyRejection`].
#[derive(Debug, Error)]
pub enum TradeError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("authentication failed")]
    Auth,

    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

/// An expected "no trade" outcome. These are normal results of entry
/// gating, logged and reported but never escalated as faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyRejection {
    /// Outside the configured trading session entirely.
    OutsideSession,
    /// Inside the session but within the post-open / pre-close guard.
    GuardWindow,
    /// Weekend, or the last trading day of the week from open onward.
    WeekendOrLastDay,
    /// Too soon after the previous entry.
    CooldownActive,
    /// A position is already open.
    PositionAlreadyOpen,
    /// An entry order is still awaiting a fill/cancel decision.
    EntryPending,
    /// A trade already closed profitably today.
    ProfitLockedToday,
    /// Two trades were already opened today.
    DailyCapReached,
    /// Second trade of the day must reverse direction.
    SameDirectionRepeat,
    /// Market data produced no tradable contract.
    NoContractFound,
    /// Purchasing-power estimate came back zero.
    NoBuyingPower,
}

impl PolicyRejection {
    /// Machine-readable code surfaced in webhook responses.
    pub fn code(self) -> &'static str {
        match self {
            Self::OutsideSession => "outside_session",
            Self::GuardWindow => "guard_window",
            Self::WeekendOrLastDay => "weekend_or_last_day",
            Self::CooldownActive => "cooldown_active",
            Self::PositionAlreadyOpen => "position_open",
            Self::EntryPending => "entry_pending",
            Self::ProfitLockedToday => "profit_locked",
            Self::DailyCapReached => "daily_cap",
            Self::SameDirectionRepeat => "same_direction",
            Self::NoContractFound => "no_contract",
            Self::NoBuyingPower => "no_buying_power",
        }
    }
}

impl std::fmt::Display for PolicyRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
