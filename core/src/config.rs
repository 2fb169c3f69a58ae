//! Analysis configuration: the handful of knobs the orchestrator needs
//! that are not themselves semantic rules (SPEC_FULL.md A.3).

/// PAL/NTSC drive the cadence recommendation the SID analysis attaches to
/// a function that drives all three voices (spec 4.12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetVariant {
    Pal50,
    Ntsc60,
}

impl TargetVariant {
    pub fn irq_hz(&self) -> u32 {
        match self {
            TargetVariant::Pal50 => 50,
            TargetVariant::Ntsc60 => 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroPageWindow {
    pub reserved_low: std::ops::RangeInclusive<u16>,
    pub safe: std::ops::RangeInclusive<u16>,
    pub reserved_high: std::ops::RangeInclusive<u16>,
}

impl Default for ZeroPageWindow {
    /// C64 defaults from spec 4.11: `$00-$01` and `$90-$FF` reserved,
    /// `$02-$8F` safe for user allocation.
    fn default() -> Self {
        Self { reserved_low: 0x00..=0x01, safe: 0x02..=0x8F, reserved_high: 0x90..=0xFF }
    }
}

/// Knobs the VIC-II raster-timing analysis needs that spec 4.13 leaves as
/// platform assumptions rather than per-program facts (the real sprite
/// count and bad-line schedule depend on the running program's own raster
/// interrupts, which are outside this analysis's reach): `sprite_count`
/// assumes the worst case (all 8 sprites active) unless overridden, and
/// `bad_line_penalty` is the typical PAL stall in CPU cycles a bad line
/// steals from the raster budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vic2Config {
    pub bad_line_penalty: u32,
    pub sprite_count: u32,
}

impl Default for Vic2Config {
    fn default() -> Self {
        Self { bad_line_penalty: 40, sprite_count: 8 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub target: TargetVariant,
    pub run_hardware_analysis: bool,
    pub zero_page: ZeroPageWindow,
    pub vic2: Vic2Config,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target: TargetVariant::Pal50,
            run_hardware_analysis: true,
            zero_page: ZeroPageWindow::default(),
            vic2: Vic2Config::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(target) = std::env::var("BLEND65_TARGET") {
            if target.eq_ignore_ascii_case("ntsc") {
                config.target = TargetVariant::Ntsc60;
            }
        }
        if let Ok(flag) = std::env::var("BLEND65_NO_HW_ANALYSIS") {
            if flag == "1" {
                config.run_hardware_analysis = false;
            }
        }
        config
    }
}
