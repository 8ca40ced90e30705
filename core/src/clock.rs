//! Simulation clock — owns elapsed time, calendar anchor, speed control, and pause.

use crate::types::Days;
use chrono::{Datelike, Days as CalendarDays, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimClock {
    /// Days elapsed since the run started. Monotonic, never negative.
    pub current_time: Days,
    /// Calendar date the run started on.
    pub start_date:   NaiveDate,
    pub speed:        GameSpeed,
    pub paused:       bool,
}

impl SimClock {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            current_time: 0.0,
            start_date,
            speed: GameSpeed::X1,
            paused: false,
        }
    }

    /// Advance by `delta` days. Negative or non-finite deltas are ignored.
    /// Returns the new elapsed time.
    pub fn advance(&mut self, delta: Days) -> Days {
        if delta.is_finite() && delta > 0.0 {
            self.current_time += delta;
        }
        self.current_time
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_speed(&mut self, speed: GameSpeed) {
        self.speed = speed;
    }

    /// In-game days an external driver should advance per step.
    pub fn days_per_step(&self) -> Days {
        self.speed.multiplier()
    }

    /// Calendar date for an elapsed-day offset.
    pub fn date_at(&self, elapsed: Days) -> NaiveDate {
        let whole = if elapsed.is_finite() && elapsed > 0.0 { elapsed.floor() as u64 } else { 0 };
        self.start_date
            .checked_add_days(CalendarDays::new(whole))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn current_date(&self) -> NaiveDate {
        self.date_at(self.current_time)
    }

    /// True when moving from `previous` to `current` elapsed days crosses
    /// a calendar month boundary.
    pub fn crossed_month(&self, previous: Days, current: Days) -> bool {
        let a = self.date_at(previous);
        let b = self.date_at(current);
        a.month() != b.month() || a.year() != b.year()
    }
}

/// Days advanced per driver step. On the wire it is the bare number 1, 2 or 4.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum GameSpeed {
    X1,
    X2,
    X4,
}

impl From<GameSpeed> for u8 {
    fn from(speed: GameSpeed) -> u8 {
        match speed {
            GameSpeed::X1 => 1,
            GameSpeed::X2 => 2,
            GameSpeed::X4 => 4,
        }
    }
}

impl TryFrom<u8> for GameSpeed {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Self::X1),
            2 => Ok(Self::X2),
            4 => Ok(Self::X4),
            other => Err(format!("unsupported game speed {other}; expected 1, 2 or 4")),
        }
    }
}

impl GameSpeed {
    pub fn multiplier(&self) -> Days {
        match self {
            Self::X1 => 1.0,
            Self::X2 => 2.0,
            Self::X4 => 4.0,
        }
    }

    /// Parse a raw 1/2/4 speed. Other values snap to the nearest supported speed.
    pub fn from_factor(factor: u32) -> Self {
        match factor {
            0 | 1 => Self::X1,
            2 | 3 => Self::X2,
            _     => Self::X4,
        }
    }
}
