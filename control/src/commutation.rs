// Six-step (block) commutation driven by three hall sensors

/// Motor phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    A,
    B,
    C,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::A, Phase::B, Phase::C];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Half-bridge leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Leg {
    High,
    Low,
}

/// Rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Forward,
    Reverse,
}

/// Hall sector code
/// Bit layout: (H1 << 2) | (H2 << 1) | H3
/// Valid codes are 1-6 (0b001 to 0b110), 0b000 and 0b111 are indeterminate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SectorCode(u8);

impl SectorCode {
    /// Build a code from raw bits (upper bits are ignored)
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    pub const fn from_halls(h1: bool, h2: bool, h3: bool) -> Self {
        Self(((h1 as u8) << 2) | ((h2 as u8) << 1) | (h3 as u8))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Individual sensor levels (H1, H2, H3)
    pub const fn halls(self) -> (bool, bool, bool) {
        (self.0 & 0b100 != 0, self.0 & 0b010 != 0, self.0 & 0b001 != 0)
    }

    pub const fn is_valid(self) -> bool {
        self.0 >= 1 && self.0 <= 6
    }
}

/// Phase pair energized for one sector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActiveLegs {
    /// Phase whose high side is switched
    pub high: Phase,
    /// Phase whose low side is switched
    pub low: Phase,
}

const fn legs(high: Phase, low: Phase) -> Option<ActiveLegs> {
    Some(ActiveLegs { high, low })
}

/// Forward commutation indexed by sector code
const FORWARD_TABLE: [Option<ActiveLegs>; 8] = [
    None,                      // 0b000: indeterminate
    legs(Phase::C, Phase::B),  // 0b001
    legs(Phase::B, Phase::A),  // 0b010
    legs(Phase::C, Phase::A),  // 0b011
    legs(Phase::A, Phase::C),  // 0b100
    legs(Phase::A, Phase::B),  // 0b101
    legs(Phase::B, Phase::C),  // 0b110
    None,                      // 0b111: indeterminate
];

/// Reverse commutation: same phase pair per code, legs swapped
const REVERSE_TABLE: [Option<ActiveLegs>; 8] = [
    None,                      // 0b000: indeterminate
    legs(Phase::B, Phase::C),  // 0b001
    legs(Phase::A, Phase::B),  // 0b010
    legs(Phase::A, Phase::C),  // 0b011
    legs(Phase::C, Phase::A),  // 0b100
    legs(Phase::B, Phase::A),  // 0b101
    legs(Phase::C, Phase::B),  // 0b110
    None,                      // 0b111: indeterminate
];

/// Look up the energized phase pair
///
/// # Returns
/// `None` for indeterminate codes
pub fn active_legs(code: SectorCode, direction: Direction) -> Option<ActiveLegs> {
    let table = match direction {
        Direction::Forward => &FORWARD_TABLE,
        Direction::Reverse => &REVERSE_TABLE,
    };
    table[code.bits() as usize]
}

/// Duty of all six switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseOutputs {
    /// High-side duty per phase (A, B, C)
    pub high: [u16; 3],
    /// Low-side duty per phase (A, B, C)
    pub low: [u16; 3],
}

impl PhaseOutputs {
    pub const OFF: Self = Self {
        high: [0; 3],
        low: [0; 3],
    };

    pub fn duty(&self, phase: Phase, leg: Leg) -> u16 {
        match leg {
            Leg::High => self.high[phase.index()],
            Leg::Low => self.low[phase.index()],
        }
    }

    /// True when neither leg of `phase` is switched
    pub fn is_floating(&self, phase: Phase) -> bool {
        self.high[phase.index()] == 0 && self.low[phase.index()] == 0
    }
}

/// Compute the six switch duties for one sector
///
/// # Arguments
/// * `code` - Hall sector code
/// * `direction` - Rotation direction
/// * `magnitude` - Duty applied to both active legs
///
/// # Returns
/// `None` for indeterminate codes
pub fn phase_outputs(code: SectorCode, direction: Direction, magnitude: u16) -> Option<PhaseOutputs> {
    active_legs(code, direction).map(|active| {
        let mut outputs = PhaseOutputs::OFF;
        outputs.high[active.high.index()] = magnitude;
        outputs.low[active.low.index()] = magnitude;
        outputs
    })
}

/// Gate drive capability for the three half-bridges
pub trait PhaseOutputSink {
    /// Set the duty of one switch
    fn set_duty(&mut self, phase: Phase, leg: Leg, duty: u16);

    /// Write all six switches
    fn apply(&mut self, outputs: &PhaseOutputs) {
        for phase in Phase::ALL {
            self.set_duty(phase, Leg::High, outputs.high[phase.index()]);
            self.set_duty(phase, Leg::Low, outputs.low[phase.index()]);
        }
    }
}

/// Diagnostic indicators mirroring the sector code
pub trait SectorIndicator {
    fn show_sector(&mut self, code: SectorCode);
}

/// Drive the bridge for the current sector
///
/// Indeterminate codes leave both the outputs and the indicators untouched.
///
/// # Arguments
/// * `code` - Hall sector code read at call time
/// * `direction` - Rotation direction
/// * `magnitude` - Requested duty, clamped to `max_duty`
/// * `max_duty` - Full-scale duty
///
/// # Returns
/// The outputs written, or `None` when nothing was written
pub fn commutate<S, I>(
    code: SectorCode,
    direction: Direction,
    magnitude: u16,
    max_duty: u16,
    sink: &mut S,
    indicator: &mut I,
) -> Option<PhaseOutputs>
where
    S: PhaseOutputSink + ?Sized,
    I: SectorIndicator + ?Sized,
{
    let outputs = phase_outputs(code, direction, magnitude.min(max_duty))?;
    sink.apply(&outputs);
    indicator.show_sector(code);
    Some(outputs)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Sink recording the last written duty of every switch
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub outputs: PhaseOutputs,
        pub writes: usize,
    }

    impl PhaseOutputSink for RecordingSink {
        fn set_duty(&mut self, phase: Phase, leg: Leg, duty: u16) {
            match leg {
                Leg::High => self.outputs.high[phase.index()] = duty,
                Leg::Low => self.outputs.low[phase.index()] = duty,
            }
            self.writes += 1;
        }
    }

    #[derive(Debug, Default)]
    pub struct RecordingIndicator {
        pub shown: Option<SectorCode>,
    }

    impl SectorIndicator for RecordingIndicator {
        fn show_sector(&mut self, code: SectorCode) {
            self.shown = Some(code);
        }
    }

    const VALID_CODES: [u8; 6] = [0b001, 0b010, 0b011, 0b100, 0b101, 0b110];
    const DIRECTIONS: [Direction; 2] = [Direction::Forward, Direction::Reverse];

    #[test]
    fn test_sector_code_bits() {
        let code = SectorCode::from_halls(true, true, false);
        assert_eq!(code.bits(), 0b110);
        assert_eq!(code.halls(), (true, true, false));
        assert_eq!(SectorCode::from_bits(0b1111_0010).bits(), 0b010);
        assert!(!SectorCode::from_bits(0).is_valid());
        assert!(SectorCode::from_bits(1).is_valid());
        assert!(SectorCode::from_bits(6).is_valid());
        assert!(!SectorCode::from_bits(7).is_valid());
    }

    #[test]
    fn test_every_valid_entry_drives_one_high_and_one_low() {
        for bits in VALID_CODES {
            for direction in DIRECTIONS {
                let outputs = phase_outputs(SectorCode::from_bits(bits), direction, 40).unwrap();

                let highs: Vec<Phase> =
                    Phase::ALL.into_iter().filter(|p| outputs.duty(*p, Leg::High) != 0).collect();
                let lows: Vec<Phase> =
                    Phase::ALL.into_iter().filter(|p| outputs.duty(*p, Leg::Low) != 0).collect();

                assert_eq!(highs.len(), 1, "code {:03b} {:?}", bits, direction);
                assert_eq!(lows.len(), 1, "code {:03b} {:?}", bits, direction);
                assert_ne!(highs[0], lows[0]);
                assert_eq!(outputs.duty(highs[0], Leg::High), 40);
                assert_eq!(outputs.duty(lows[0], Leg::Low), 40);

                let floating: Vec<Phase> =
                    Phase::ALL.into_iter().filter(|p| outputs.is_floating(*p)).collect();
                assert_eq!(floating.len(), 1);
            }
        }
    }

    #[test]
    fn test_reverse_swaps_the_forward_legs() {
        for bits in VALID_CODES {
            let code = SectorCode::from_bits(bits);
            let forward = active_legs(code, Direction::Forward).unwrap();
            let reverse = active_legs(code, Direction::Reverse).unwrap();
            assert_eq!(reverse.high, forward.low);
            assert_eq!(reverse.low, forward.high);
            assert_ne!(reverse, forward);
        }
    }

    #[test]
    fn test_forward_sequence_visits_each_pair_once() {
        let mut seen = Vec::new();
        for bits in VALID_CODES {
            let active = active_legs(SectorCode::from_bits(bits), Direction::Forward).unwrap();
            assert!(!seen.contains(&active));
            seen.push(active);
        }
    }

    #[test]
    fn test_forward_table_entries() {
        let fwd = |bits| active_legs(SectorCode::from_bits(bits), Direction::Forward).unwrap();
        assert_eq!(fwd(0b110), ActiveLegs { high: Phase::B, low: Phase::C });
        assert_eq!(fwd(0b010), ActiveLegs { high: Phase::B, low: Phase::A });
        assert_eq!(fwd(0b011), ActiveLegs { high: Phase::C, low: Phase::A });
        assert_eq!(fwd(0b001), ActiveLegs { high: Phase::C, low: Phase::B });
        assert_eq!(fwd(0b101), ActiveLegs { high: Phase::A, low: Phase::B });
        assert_eq!(fwd(0b100), ActiveLegs { high: Phase::A, low: Phase::C });
    }

    #[test]
    fn test_indeterminate_codes_leave_outputs_untouched() {
        let mut sink = RecordingSink::default();
        let mut indicator = RecordingIndicator::default();

        let first = commutate(
            SectorCode::from_bits(0b101),
            Direction::Forward,
            30,
            100,
            &mut sink,
            &mut indicator,
        );
        assert!(first.is_some());
        let writes = sink.writes;

        for bits in [0b000, 0b111] {
            for direction in DIRECTIONS {
                let result = commutate(
                    SectorCode::from_bits(bits),
                    direction,
                    80,
                    100,
                    &mut sink,
                    &mut indicator,
                );
                assert_eq!(result, None);
            }
        }

        assert_eq!(sink.writes, writes);
        assert_eq!(sink.outputs, first.unwrap());
        assert_eq!(indicator.shown, Some(SectorCode::from_bits(0b101)));
    }

    #[test]
    fn test_commutate_writes_all_six_switches_and_clamps() {
        let mut sink = RecordingSink::default();
        let mut indicator = RecordingIndicator::default();
        sink.outputs.high = [9, 9, 9];
        sink.outputs.low = [9, 9, 9];

        let outputs = commutate(
            SectorCode::from_bits(0b011),
            Direction::Forward,
            500,
            100,
            &mut sink,
            &mut indicator,
        )
        .unwrap();

        assert_eq!(sink.writes, 6);
        assert_eq!(sink.outputs, outputs);
        assert_eq!(outputs.high, [0, 0, 100]);
        assert_eq!(outputs.low, [100, 0, 0]);
        assert_eq!(indicator.shown, Some(SectorCode::from_bits(0b011)));
    }

    #[test]
    fn test_forward_transition_110_to_010() {
        let mut sink = RecordingSink::default();
        let mut indicator = RecordingIndicator::default();

        commutate(SectorCode::from_bits(0b110), Direction::Forward, 55, 100, &mut sink, &mut indicator);
        assert_eq!(sink.outputs.high, [0, 55, 0]);
        assert_eq!(sink.outputs.low, [0, 0, 55]);

        commutate(SectorCode::from_bits(0b010), Direction::Forward, 55, 100, &mut sink, &mut indicator);
        assert_eq!(sink.outputs.high, [0, 55, 0]);
        assert_eq!(sink.outputs.low, [55, 0, 0]);
        assert!(sink.outputs.is_floating(Phase::C));
    }
}
