//! Persistent controller state and its fixed-width storage layout.
//!
//! [`ControllerState`] is the single mutable record behind a controller. It is
//! created once from validated parameters and afterwards changed only by a
//! committed update, by window growth after a rejected update, or by a
//! parameter setter.
//!
//! # Storage layout
//!
//! [`ControllerState::encode`] writes a [`PersistedState`] with bincode's
//! fixed-int encoding. Fields appear in this order:
//!
//! | field                      | encoding                               |
//! |----------------------------|----------------------------------------|
//! | `proportional_gain`        | 32-byte big-endian two's complement, WAD |
//! | `integral_gain`            | 32 bytes, WAD                          |
//! | `integral_accumulator`     | 32 bytes, RAY · seconds                |
//! | `leak_per_second`          | 32 bytes, RAY                          |
//! | `has_updated`              | 1 byte, 0 or 1                         |
//! | `last_update_time`         | u64 little-endian, 0 when never updated |
//! | `last_approved_rate`       | 32 bytes, RAY                          |
//! | `allowed_deviation_window` | 5 × 32 bytes: lower, upper, growth, floor lower, floor upper |
//! | `noise_barrier`            | 32 bytes, RAY                          |
//! | `output_bounds`            | 2 × 32 bytes: lower, upper             |
//! | `min_rate_timeline`        | u64 little-endian                      |
//!
//! The diagnostic history is not persisted.

use crate::constants::{HISTORY_LEN, RAY, SECONDS_PER_YEAR};
use crate::error::ConfigError;
use crate::types::{Fixed, Snapshot};

/// Tolerance band around the last approved rate.
///
/// Widths are absolute RAY units. The band widens by `growth_factor` after
/// every rejected update and snaps back to the floor on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviationWindow {
    pub lower_bound: Fixed,
    pub upper_bound: Fixed,
    /// Multiplier (RAY, >= 1.0) applied to both widths per rejection.
    pub growth_factor: Fixed,
    pub floor_lower: Fixed,
    pub floor_upper: Fixed,
}

impl DeviationWindow {
    /// A window sitting at its floor.
    pub fn new(lower: Fixed, upper: Fixed, growth_factor: Fixed) -> Self {
        Self {
            lower_bound: lower,
            upper_bound: upper,
            growth_factor,
            floor_lower: lower,
            floor_upper: upper,
        }
    }

    /// Whether `candidate` lies within the band around `center`.
    pub fn admits(&self, center: Fixed, candidate: Fixed) -> bool {
        let low = center.saturating_sub(self.lower_bound);
        let high = center.saturating_add(self.upper_bound);
        candidate >= low && candidate <= high
    }

    /// Grow both widths. Each width strictly increases, by at least one unit.
    pub fn widen(&mut self) {
        self.lower_bound = grow(self.lower_bound, self.growth_factor);
        self.upper_bound = grow(self.upper_bound, self.growth_factor);
    }

    /// Return to the configured floor.
    pub fn reset(&mut self) {
        self.lower_bound = self.floor_lower;
        self.upper_bound = self.floor_upper;
    }

    pub fn is_at_floor(&self) -> bool {
        self.lower_bound == self.floor_lower && self.upper_bound == self.floor_upper
    }
}

fn grow(width: Fixed, factor: Fixed) -> Fixed {
    let scaled = width
        .checked_mul(factor)
        .map(|v| v / RAY)
        .unwrap_or(Fixed::MAX);
    scaled.max(width.saturating_add(Fixed::ONE))
}

/// Hard clamp on the controller output (RAY).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputBounds {
    pub lower: Fixed,
    pub upper: Fixed,
}

impl OutputBounds {
    pub fn clamp(&self, value: Fixed) -> Fixed {
        value.max(self.lower).min(self.upper)
    }

    pub fn contains(&self, value: Fixed) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Fixed-size ring of the most recent committed snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    slots: [Option<Snapshot>; HISTORY_LEN],
    next: usize,
}

impl History {
    /// Record a snapshot, overwriting the oldest once full.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.slots[self.next] = Some(snapshot);
        self.next = (self.next + 1) % HISTORY_LEN;
    }

    /// Snapshots from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        let (newer, older) = self.slots.split_at(self.next);
        older.iter().chain(newer.iter()).flatten()
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        let idx = (self.next + HISTORY_LEN - 1) % HISTORY_LEN;
        self.slots[idx].as_ref()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The PI controller's persistent state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    /// Kp (WAD).
    pub proportional_gain: Fixed,
    /// Ki (WAD).
    pub integral_gain: Fixed,
    /// Leaky integral of the deviation (RAY · seconds).
    pub integral_accumulator: Fixed,
    /// Per-second decay of the accumulator, in `(0, RAY]`.
    pub leak_per_second: Fixed,
    /// Time of the last committed update; `None` before the first one.
    pub last_update_time: Option<u64>,
    /// Last committed per-second rate (RAY).
    pub last_approved_rate: Fixed,
    pub allowed_deviation_window: DeviationWindow,
    /// Deviations with a smaller magnitude are treated as zero (RAY).
    pub noise_barrier: Fixed,
    pub output_bounds: OutputBounds,
    /// Shortest timeline, in seconds, a global rate may be spread over.
    pub min_rate_timeline: u64,
    pub history: History,
}

impl ControllerState {
    /// Whether any update has been committed yet.
    pub fn has_updated(&self) -> bool {
        self.last_update_time.is_some()
    }

    /// Check every field against its domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_gains(self.proportional_gain, self.integral_gain)?;
        validate_leak(self.leak_per_second)?;
        validate_window(&self.allowed_deviation_window)?;
        validate_noise_barrier(self.noise_barrier)?;
        validate_output_bounds(&self.output_bounds)?;
        validate_min_rate_timeline(self.min_rate_timeline)?;
        if self.last_approved_rate <= Fixed::ZERO {
            return Err(ConfigError::invalid("last_approved_rate", "must be positive"));
        }
        Ok(())
    }

    /// Serialize to the fixed-width storage layout.
    pub fn encode(&self) -> Result<Vec<u8>, ConfigError> {
        bincode::encode_to_vec(PersistedState::from(self), layout())
            .map_err(|e| ConfigError::Encoding(e.to_string()))
    }

    /// Restore from the storage layout. The result is validated; the
    /// history starts empty.
    pub fn decode(bytes: &[u8]) -> Result<Self, ConfigError> {
        let (persisted, read): (PersistedState, usize) =
            bincode::decode_from_slice(bytes, layout())
                .map_err(|e| ConfigError::Encoding(e.to_string()))?;
        if read != bytes.len() {
            return Err(ConfigError::Encoding(format!(
                "{} trailing bytes",
                bytes.len() - read
            )));
        }
        let state = Self::from(persisted);
        state.validate()?;
        Ok(state)
    }
}

pub fn validate_gains(kp: Fixed, ki: Fixed) -> Result<(), ConfigError> {
    if kp < Fixed::ZERO {
        return Err(ConfigError::invalid("proportional_gain", "must not be negative"));
    }
    if ki < Fixed::ZERO {
        return Err(ConfigError::invalid("integral_gain", "must not be negative"));
    }
    Ok(())
}

pub fn validate_leak(leak: Fixed) -> Result<(), ConfigError> {
    if leak <= Fixed::ZERO || leak > RAY {
        return Err(ConfigError::invalid("leak_per_second", "must be in (0, RAY]"));
    }
    Ok(())
}

pub fn validate_window(window: &DeviationWindow) -> Result<(), ConfigError> {
    if window.floor_lower < Fixed::ZERO || window.floor_upper < Fixed::ZERO {
        return Err(ConfigError::invalid("allowed_deviation_window", "widths must not be negative"));
    }
    if window.lower_bound < window.floor_lower || window.upper_bound < window.floor_upper {
        return Err(ConfigError::invalid("allowed_deviation_window", "widths below floor"));
    }
    if window.growth_factor < RAY {
        return Err(ConfigError::invalid("allowed_deviation_window", "growth factor below RAY"));
    }
    Ok(())
}

pub fn validate_noise_barrier(barrier: Fixed) -> Result<(), ConfigError> {
    if barrier < Fixed::ZERO || barrier > RAY {
        return Err(ConfigError::invalid("noise_barrier", "must be in [0, RAY]"));
    }
    Ok(())
}

pub fn validate_output_bounds(bounds: &OutputBounds) -> Result<(), ConfigError> {
    if bounds.lower < Fixed::ONE {
        return Err(ConfigError::invalid("output_bounds", "lower bound must be positive"));
    }
    if bounds.lower > bounds.upper {
        return Err(ConfigError::invalid("output_bounds", "lower bound above upper bound"));
    }
    Ok(())
}

pub fn validate_min_rate_timeline(timeline: u64) -> Result<(), ConfigError> {
    if timeline == 0 || timeline > SECONDS_PER_YEAR {
        return Err(ConfigError::invalid(
            "min_rate_timeline",
            format!("must be in [1, {SECONDS_PER_YEAR}]"),
        ));
    }
    Ok(())
}

fn layout() -> impl bincode::config::Config {
    bincode::config::standard().with_fixed_int_encoding()
}

type Word = [u8; 32];

fn word(value: Fixed) -> Word {
    value.to_be_bytes()
}

fn unword(bytes: Word) -> Fixed {
    Fixed::from_be_bytes(bytes)
}

/// Deviation window as stored.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct PersistedWindow {
    pub lower_bound: Word,
    pub upper_bound: Word,
    pub growth_factor: Word,
    pub floor_lower: Word,
    pub floor_upper: Word,
}

/// Fixed-width storage record for [`ControllerState`].
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct PersistedState {
    pub proportional_gain: Word,
    pub integral_gain: Word,
    pub integral_accumulator: Word,
    pub leak_per_second: Word,
    pub has_updated: bool,
    pub last_update_time: u64,
    pub last_approved_rate: Word,
    pub allowed_deviation_window: PersistedWindow,
    pub noise_barrier: Word,
    pub output_bounds: [Word; 2],
    pub min_rate_timeline: u64,
}

impl From<&ControllerState> for PersistedState {
    fn from(state: &ControllerState) -> Self {
        let window = &state.allowed_deviation_window;
        Self {
            proportional_gain: word(state.proportional_gain),
            integral_gain: word(state.integral_gain),
            integral_accumulator: word(state.integral_accumulator),
            leak_per_second: word(state.leak_per_second),
            has_updated: state.last_update_time.is_some(),
            last_update_time: state.last_update_time.unwrap_or(0),
            last_approved_rate: word(state.last_approved_rate),
            allowed_deviation_window: PersistedWindow {
                lower_bound: word(window.lower_bound),
                upper_bound: word(window.upper_bound),
                growth_factor: word(window.growth_factor),
                floor_lower: word(window.floor_lower),
                floor_upper: word(window.floor_upper),
            },
            noise_barrier: word(state.noise_barrier),
            output_bounds: [word(state.output_bounds.lower), word(state.output_bounds.upper)],
            min_rate_timeline: state.min_rate_timeline,
        }
    }
}

impl From<PersistedState> for ControllerState {
    fn from(p: PersistedState) -> Self {
        let w = p.allowed_deviation_window;
        Self {
            proportional_gain: unword(p.proportional_gain),
            integral_gain: unword(p.integral_gain),
            integral_accumulator: unword(p.integral_accumulator),
            leak_per_second: unword(p.leak_per_second),
            last_update_time: p.has_updated.then_some(p.last_update_time),
            last_approved_rate: unword(p.last_approved_rate),
            allowed_deviation_window: DeviationWindow {
                lower_bound: unword(w.lower_bound),
                upper_bound: unword(w.upper_bound),
                growth_factor: unword(w.growth_factor),
                floor_lower: unword(w.floor_lower),
                floor_upper: unword(w.floor_upper),
            },
            noise_barrier: unword(p.noise_barrier),
            output_bounds: OutputBounds {
                lower: unword(p.output_bounds[0]),
                upper: unword(p.output_bounds[1]),
            },
            min_rate_timeline: p.min_rate_timeline,
            history: History::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use proptest::prelude::*;

    fn state() -> ControllerState {
        ControllerConfig::default().initial_state().unwrap()
    }

    fn snap(time: u64) -> Snapshot {
        Snapshot {
            time,
            proportional_term: Fixed::ZERO,
            integral_term: Fixed::ZERO,
            rate: RAY,
            timeline: None,
        }
    }

    // --- DeviationWindow ---

    #[test]
    fn window_admits_inclusive_band() {
        let w = DeviationWindow::new(Fixed::new(10), Fixed::new(20), RAY);
        assert!(w.admits(RAY, RAY - Fixed::new(10)));
        assert!(w.admits(RAY, RAY + Fixed::new(20)));
        assert!(!w.admits(RAY, RAY - Fixed::new(11)));
        assert!(!w.admits(RAY, RAY + Fixed::new(21)));
    }

    #[test]
    fn window_widen_is_strict_even_at_unit_growth() {
        let mut w = DeviationWindow::new(Fixed::ZERO, Fixed::new(3), RAY);
        w.widen();
        assert_eq!(w.lower_bound, Fixed::ONE);
        assert_eq!(w.upper_bound, Fixed::new(4));
    }

    #[test]
    fn window_widen_applies_growth() {
        let growth = RAY * Fixed::new(2);
        let mut w = DeviationWindow::new(Fixed::new(100), Fixed::new(50), growth);
        w.widen();
        assert_eq!(w.lower_bound, Fixed::new(200));
        assert_eq!(w.upper_bound, Fixed::new(100));
        assert!(!w.is_at_floor());
        w.reset();
        assert!(w.is_at_floor());
        assert_eq!(w.lower_bound, Fixed::new(100));
    }

    #[test]
    fn window_widen_saturates() {
        let mut w = DeviationWindow::new(Fixed::MAX, Fixed::MAX, RAY * Fixed::new(2));
        w.widen();
        assert_eq!(w.lower_bound, Fixed::MAX);
    }

    // --- OutputBounds ---

    #[test]
    fn bounds_clamp() {
        let b = OutputBounds { lower: Fixed::new(5), upper: Fixed::new(10) };
        assert_eq!(b.clamp(Fixed::new(1)), Fixed::new(5));
        assert_eq!(b.clamp(Fixed::new(7)), Fixed::new(7));
        assert_eq!(b.clamp(Fixed::new(70)), Fixed::new(10));
        assert!(b.contains(Fixed::new(10)));
        assert!(!b.contains(Fixed::new(11)));
    }

    // --- History ---

    #[test]
    fn history_starts_empty() {
        let h = History::default();
        assert!(h.is_empty());
        assert!(h.latest().is_none());
        assert_eq!(h.iter().count(), 0);
    }

    #[test]
    fn history_keeps_insertion_order_before_wrap() {
        let mut h = History::default();
        for t in 1..=3 {
            h.push(snap(t));
        }
        let times: Vec<u64> = h.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![1, 2, 3]);
        assert_eq!(h.latest().unwrap().time, 3);
    }

    #[test]
    fn history_overwrites_oldest() {
        let mut h = History::default();
        for t in 1..=8 {
            h.push(snap(t));
        }
        assert_eq!(h.len(), HISTORY_LEN);
        let times: Vec<u64> = h.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![4, 5, 6, 7, 8]);
        assert_eq!(h.latest().unwrap().time, 8);
    }

    // --- validation ---

    #[test]
    fn default_state_is_valid() {
        assert!(state().validate().is_ok());
        assert!(!state().has_updated());
    }

    #[test]
    fn rejects_leak_above_one() {
        let mut s = state();
        s.leak_per_second = RAY + Fixed::ONE;
        assert!(matches!(
            s.validate(),
            Err(ConfigError::InvalidParameter { name: "leak_per_second", .. })
        ));
    }

    #[test]
    fn rejects_zero_lower_output_bound() {
        let mut s = state();
        s.output_bounds.lower = Fixed::ZERO;
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_inverted_output_bounds() {
        let mut s = state();
        s.output_bounds = OutputBounds { lower: RAY * Fixed::new(2), upper: RAY };
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_shrinking_growth() {
        let mut s = state();
        s.allowed_deviation_window.growth_factor = RAY - Fixed::ONE;
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_timeline_past_one_year() {
        let mut s = state();
        s.min_rate_timeline = SECONDS_PER_YEAR + 1;
        assert!(s.validate().is_err());
        s.min_rate_timeline = 0;
        assert!(s.validate().is_err());
    }

    // --- storage layout ---

    #[test]
    fn encoded_size_is_fixed() {
        let bytes = state().encode().unwrap();
        // 13 words + 1 flag + 2 u64
        assert_eq!(bytes.len(), 13 * 32 + 1 + 2 * 8);
    }

    #[test]
    fn encode_decode_preserves_fields_but_not_history() {
        let mut s = state();
        s.integral_accumulator = Fixed::new(-123_456_789);
        s.last_update_time = Some(1_700_000_000);
        s.allowed_deviation_window.widen();
        s.history.push(snap(1));

        let back = ControllerState::decode(&s.encode().unwrap()).unwrap();
        assert_eq!(back.integral_accumulator, s.integral_accumulator);
        assert_eq!(back.last_update_time, s.last_update_time);
        assert_eq!(back.allowed_deviation_window, s.allowed_deviation_window);
        assert!(back.history.is_empty());
    }

    #[test]
    fn update_at_time_zero_survives_storage() {
        let mut s = state();
        s.last_update_time = Some(0);
        let back = ControllerState::decode(&s.encode().unwrap()).unwrap();
        assert!(back.has_updated());
        assert_eq!(back.last_update_time, Some(0));

        let fresh = ControllerState::decode(&state().encode().unwrap()).unwrap();
        assert!(!fresh.has_updated());
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut bytes = state().encode().unwrap();
        bytes.push(0);
        assert!(matches!(ControllerState::decode(&bytes), Err(ConfigError::Encoding(_))));
    }

    #[test]
    fn decode_rejects_truncated_input() {
        let bytes = state().encode().unwrap();
        assert!(ControllerState::decode(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn decode_validates() {
        let mut s = state();
        s.leak_per_second = Fixed::ZERO;
        let bytes = s.encode().unwrap();
        assert!(matches!(
            ControllerState::decode(&bytes),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn fixed_words_are_big_endian_twos_complement() {
        let mut s = state();
        s.proportional_gain = Fixed::ONE;
        let bytes = s.encode().unwrap();
        assert_eq!(&bytes[..31], &[0u8; 31]);
        assert_eq!(bytes[31], 1);
    }

    proptest! {
        #[test]
        fn accumulator_survives_storage(acc in any::<i128>(), t in any::<Option<u64>>()) {
            let mut s = state();
            s.integral_accumulator = Fixed::new(acc);
            s.last_update_time = t;
            let back = ControllerState::decode(&s.encode().unwrap()).unwrap();
            prop_assert_eq!(back.integral_accumulator, s.integral_accumulator);
            prop_assert_eq!(back.last_update_time, t);
        }
    }
}
