//! Countdown derivation.
//!
//! A pure mapping from `(unlock_time, now)` to the remaining-time value the
//! UI renders, plus a one-second ticker task that republishes it while a
//! view is watching.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::sync::StateMirror;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3_600;
const SECS_PER_DAY: u64 = 86_400;

/// Whole-unit decomposition of the time left until unlock. `days` is
/// unbounded; the other fields stay within their natural bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

/// Derived lock status. `NoLock` (no unlock time configured) is distinct
/// from `Unlocked` (a configured unlock time that has passed); withdrawal is
/// only permitted in the latter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    NoLock,
    Locked(Remaining),
    Unlocked,
}

impl Countdown {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, Countdown::Unlocked)
    }

    pub fn remaining(&self) -> Option<Remaining> {
        match self {
            Countdown::Locked(remaining) => Some(*remaining),
            _ => None,
        }
    }
}

/// Compute the countdown for an unlock timestamp.
///
/// `unlock_time` is `None` while the field has not been fetched; a fetched
/// value of `0` means the contract has no lock configured. Both map to
/// `NoLock`.
pub fn countdown(unlock_time: Option<u64>, now: u64) -> Countdown {
    let unlock_time = match unlock_time {
        None | Some(0) => return Countdown::NoLock,
        Some(t) => t,
    };
    if now >= unlock_time {
        return Countdown::Unlocked;
    }

    let total = unlock_time - now;
    Countdown::Locked(Remaining {
        days: total / SECS_PER_DAY,
        hours: (total % SECS_PER_DAY) / SECS_PER_HOUR,
        minutes: (total % SECS_PER_HOUR) / SECS_PER_MINUTE,
        seconds: total % SECS_PER_MINUTE,
    })
}

/// Current unix time in whole seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// One-second recomputation loop over the mirror's unlock time.
///
/// Started once per active view; the background task is aborted when the
/// ticker is dropped, so no timer outlives its consumer.
pub struct CountdownTicker {
    rx: watch::Receiver<Countdown>,
    task: JoinHandle<()>,
}

impl CountdownTicker {
    pub fn start(mirror: StateMirror) -> Self {
        let initial = countdown(mirror.snapshot().unlock_time, unix_now());
        let (tx, rx) = watch::channel(initial);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                let current = countdown(mirror.snapshot().unlock_time, unix_now());
                if tx.send(current).is_err() {
                    break;
                }
            }
        });

        Self { rx, task }
    }

    /// Most recently published countdown.
    pub fn latest(&self) -> Countdown {
        *self.rx.borrow()
    }

    /// Watch the countdown; receivers see every published change.
    pub fn subscribe(&self) -> watch::Receiver<Countdown> {
        self.rx.clone()
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    #[test]
    fn past_unlock_time_is_unlocked() {
        for unlock in [NOW - 1, NOW - SECS_PER_DAY, 1] {
            let result = countdown(Some(unlock), NOW);
            assert_eq!(result, Countdown::Unlocked);
            assert!(result.is_unlocked());
            assert_eq!(result.remaining(), None);
        }
    }

    #[test]
    fn unlock_time_equal_to_now_is_unlocked() {
        assert_eq!(countdown(Some(NOW), NOW), Countdown::Unlocked);
    }

    #[test]
    fn one_of_each_unit_ahead() {
        // 1 day + 1 hour + 1 minute + 1 second
        let result = countdown(Some(NOW + 90_061), NOW);
        assert_eq!(
            result,
            Countdown::Locked(Remaining {
                days: 1,
                hours: 1,
                minutes: 1,
                seconds: 1,
            })
        );
        assert!(!result.is_unlocked());
    }

    #[test]
    fn unset_unlock_time_is_no_lock_not_unlocked() {
        let result = countdown(None, NOW);
        assert_eq!(result, Countdown::NoLock);
        assert!(!result.is_unlocked());
        assert_ne!(result, Countdown::Unlocked);
    }

    #[test]
    fn zero_unlock_time_is_no_lock() {
        assert_eq!(countdown(Some(0), NOW), Countdown::NoLock);
    }

    #[test]
    fn fields_stay_within_their_bounds() {
        // 2 days minus one second
        let result = countdown(Some(NOW + 2 * SECS_PER_DAY - 1), NOW);
        assert_eq!(
            result.remaining().unwrap(),
            Remaining {
                days: 1,
                hours: 23,
                minutes: 59,
                seconds: 59,
            }
        );
    }

    #[test]
    fn one_second_left() {
        assert_eq!(
            countdown(Some(NOW + 1), NOW).remaining().unwrap(),
            Remaining {
                days: 0,
                hours: 0,
                minutes: 0,
                seconds: 1,
            }
        );
    }
}
