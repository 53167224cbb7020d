//! # Extrusion Die Size
//!
//! Die opening for the A and B sides: bare conductor thickness plus the shrink
//! allowance plus a reserve for die drawing hardness.

use crate::calculations::{CalcInput, CalcOutput, InputField, InputsEcho, ParamType};
use crate::errors::CoreResult;
use crate::units::{round_to, Millimeters};
use crate::validation::require_non_negative;

/// A-side die size: `h_a + shrink_a + reserve_a`, rounded to 4 places.
pub fn calc_a_die(input: &CalcInput) -> CoreResult<CalcOutput> {
    die_size(
        ParamType::ADie,
        input,
        [InputField::AHBare, InputField::AShrink, InputField::AReserve],
    )
}

/// B-side die size: `h_b + shrink_b + reserve_b`, rounded to 4 places.
///
/// # Example
///
/// ```rust
/// use calc_core::calculations::{die::calc_b_die, CalcInput};
///
/// let input = CalcInput {
///     b_h_bare: Some(1.2),
///     b_shrink: Some(0.3),
///     b_reserve: Some(0.05),
///     ..Default::default()
/// };
/// assert_eq!(calc_b_die(&input).unwrap().value, 1.55);
/// ```
pub fn calc_b_die(input: &CalcInput) -> CoreResult<CalcOutput> {
    die_size(
        ParamType::BDie,
        input,
        [InputField::BHBare, InputField::BShrink, InputField::BReserve],
    )
}

/// Both sides share the same sum; only the field names differ.
fn die_size(param: ParamType, input: &CalcInput, [bare, shrink, reserve]: [InputField; 3]) -> CoreResult<CalcOutput> {
    let h_bare = require_non_negative(input.get(bare), bare.key())?;
    let h_shrink = require_non_negative(input.get(shrink), shrink.key())?;
    let h_reserve = require_non_negative(input.get(reserve), reserve.key())?;

    let size = Millimeters(h_bare) + Millimeters(h_shrink) + Millimeters(h_reserve);
    let echo = InputsEcho::from([(bare, h_bare), (shrink, h_shrink), (reserve, h_reserve)]);

    Ok(CalcOutput::new(param, round_to(size.0, param.decimals()), echo))
}
