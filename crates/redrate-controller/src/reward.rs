//! Caller reward for triggering an update.
//!
//! The reward is [`RewardSchedule::base`] when an update lands exactly when
//! due and compounds by [`RewardSchedule::per_second_increase`] for every
//! second it is overdue, capped at [`RewardSchedule::max`]:
//!
//! ```text
//! reward = min(max, base * increase^(now - due))
//! ```
//!
//! An update is due `integral_period_size` seconds after the previous one.
//! The first update is due immediately.

use redrate_core::config::RewardSchedule;
use redrate_core::constants::RAY;
use redrate_core::fixed::rmul;
use redrate_core::traits::RateCompounder;
use redrate_core::types::Fixed;

/// Time the next update becomes due, or `None` before the first update.
pub fn due_time(last_update_time: Option<u64>, integral_period_size: u64) -> Option<u64> {
    last_update_time.map(|t| t.saturating_add(integral_period_size))
}

/// Reward (WAD) owed to whoever triggers an update at `now`.
///
/// Growth that overflows saturates at the cap.
pub fn caller_reward(
    schedule: &RewardSchedule,
    compounder: &dyn RateCompounder,
    due: Option<u64>,
    now: u64,
) -> Fixed {
    if schedule.base <= Fixed::ZERO || schedule.max <= Fixed::ZERO {
        return Fixed::ZERO;
    }
    let overdue = match due {
        Some(due) if now > due => now - due,
        _ => return schedule.base.min(schedule.max),
    };
    compounder
        .pow(schedule.per_second_increase, overdue, RAY)
        .ok()
        .and_then(|growth| rmul(schedule.base, growth))
        .map_or(schedule.max, |reward| reward.min(schedule.max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use redrate_compound::Compounder;
    use redrate_core::constants::WAD;

    fn reward(due: Option<u64>, now: u64) -> Fixed {
        caller_reward(&RewardSchedule::default(), &Compounder, due, now)
    }

    #[test]
    fn due_time_after_period() {
        assert_eq!(due_time(None, 3_600), None);
        assert_eq!(due_time(Some(0), 3_600), Some(3_600));
        assert_eq!(due_time(Some(1_000), 3_600), Some(4_600));
        assert_eq!(due_time(Some(u64::MAX), 3_600), Some(u64::MAX));
    }

    #[test]
    fn first_update_pays_base() {
        assert_eq!(reward(None, 1_700_000_000), WAD);
    }

    #[test]
    fn on_time_update_pays_base() {
        assert_eq!(reward(Some(4_600), 4_600), WAD);
    }

    #[test]
    fn overdue_reward_grows() {
        let later = reward(Some(4_600), 4_700);
        assert!(later > WAD);
        assert!(later < reward(Some(4_600), 4_800));
    }

    #[test]
    fn default_increase_is_about_166_percent_per_hour() {
        let after_hour = reward(Some(0), 3_600);
        let expected = WAD * Fixed::new(8) / Fixed::new(3);
        assert!((after_hour - expected).abs() < WAD / Fixed::new(1_000));
    }

    #[test]
    fn reward_is_capped() {
        assert_eq!(reward(Some(0), 86_400), WAD * Fixed::new(10));
        assert_eq!(reward(Some(0), u64::MAX), WAD * Fixed::new(10));
    }

    #[test]
    fn disabled_schedule_pays_nothing() {
        let r = caller_reward(&RewardSchedule::disabled(), &Compounder, Some(0), 10_000);
        assert_eq!(r, Fixed::ZERO);
    }
}
