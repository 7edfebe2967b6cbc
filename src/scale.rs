use crate::MAX_CODE;

/// Scales an 8-bit DAC code to millivolts: `code * full_scale_mv / 255`,
/// rounded down.
pub fn code_to_millivolts(code: u8, full_scale_mv: u32) -> u32 {
    u32::from(code) * full_scale_mv / u32::from(MAX_CODE)
}
