//! # Film Thickness
//!
//! Insulation film thickness on the A and B sides of a transposed cable,
//! backed out of the measured cable thickness.
//!
//! ## Notation
//!
//! - `n` = conductor count
//! - `d` = (n + 1) / 2, the conductor stack factor on the A side
//! - `H` = transposed cable thickness, `h` = bare conductor thickness
//! - `p` = insulation paper thickness, `c` = center paper thickness
//!
//! Results may be negative when the measured cable is thinner than the bare
//! stack; that is reported as-is.

use crate::calculations::{CalcInput, CalcOutput, InputField, InputsEcho, ParamType};
use crate::errors::CoreResult;
use crate::units::{round_to, Millimeters};
use crate::validation::{require_non_negative, require_positive_integer_count};

/// A-side film thickness.
///
/// # Formula
/// ```text
/// d      = (n + 1) / 2
/// film_a = (H_a - (h_a * d + p)) / d        rounded to 2 places
/// ```
///
/// # Example
///
/// ```rust
/// use calc_core::calculations::{film::calc_a_film, CalcInput};
///
/// let input = CalcInput {
///     n: Some(2.0),
///     a_h_change: Some(5.0),
///     a_h_bare: Some(1.0),
///     paper_h: Some(0.2),
///     ..Default::default()
/// };
/// assert_eq!(calc_a_film(&input).unwrap().value, 2.2);
/// ```
pub fn calc_a_film(input: &CalcInput) -> CoreResult<CalcOutput> {
    let n = require_positive_integer_count(input.n, InputField::N.key())?;
    let a_h_change = require_non_negative(input.a_h_change, InputField::AHChange.key())?;
    let a_h_bare = require_non_negative(input.a_h_bare, InputField::AHBare.key())?;
    let paper_h = require_non_negative(input.paper_h, InputField::PaperH.key())?;

    let d = (f64::from(n) + 1.0) / 2.0;
    let stack = Millimeters(a_h_bare) * d + Millimeters(paper_h);
    let film = (Millimeters(a_h_change) - stack) / d;

    let echo = InputsEcho::from([
        (InputField::N, f64::from(n)),
        (InputField::AHChange, a_h_change),
        (InputField::AHBare, a_h_bare),
        (InputField::PaperH, paper_h),
    ]);

    Ok(CalcOutput::new(
        ParamType::AFilm,
        round_to(film.0, ParamType::AFilm.decimals()),
        echo,
    ))
}

/// B-side film thickness.
///
/// # Formula
/// ```text
/// film_b = (H_b - (h_b * 2 + p + c)) / 2     rounded to 4 places
/// ```
pub fn calc_b_film(input: &CalcInput) -> CoreResult<CalcOutput> {
    let b_h_change = require_non_negative(input.b_h_change, InputField::BHChange.key())?;
    let b_h_bare = require_non_negative(input.b_h_bare, InputField::BHBare.key())?;
    let paper_h = require_non_negative(input.paper_h, InputField::PaperH.key())?;
    let center_paper_h = require_non_negative(input.center_paper_h, InputField::CenterPaperH.key())?;

    let stack = Millimeters(b_h_bare) * 2.0 + Millimeters(paper_h) + Millimeters(center_paper_h);
    let film = (Millimeters(b_h_change) - stack) / 2.0;

    let echo = InputsEcho::from([
        (InputField::BHChange, b_h_change),
        (InputField::BHBare, b_h_bare),
        (InputField::PaperH, paper_h),
        (InputField::CenterPaperH, center_paper_h),
    ]);

    Ok(CalcOutput::new(
        ParamType::BFilm,
        round_to(film.0, ParamType::BFilm.decimals()),
        echo,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CalcError;

    fn a_side() -> CalcInput {
        CalcInput {
            n: Some(2.0),
            a_h_change: Some(5.0),
            a_h_bare: Some(1.0),
            paper_h: Some(0.2),
            ..Default::default()
        }
    }

    fn b_side() -> CalcInput {
        CalcInput {
            b_h_change: Some(1.0),
            b_h_bare: Some(0.2),
            paper_h: Some(0.1),
            center_paper_h: Some(0.05),
            ..Default::default()
        }
    }

    #[test]
    fn test_a_film_reference_case() {
        // d = 1.5, (5.0 - (1.5 + 0.2)) / 1.5 = 2.2
        let out = calc_a_film(&a_side()).unwrap();
        assert_eq!(out.value, 2.2);
        assert_eq!(out.unit, "mm");
        assert_eq!(out.decimals, 2);
        assert_eq!(out.formula_id, "a_film");
    }

    #[test]
    fn test_a_film_echoes_inputs() {
        let out = calc_a_film(&a_side()).unwrap();
        assert_eq!(out.inputs_echo.len(), 4);
        assert_eq!(out.inputs_echo[&InputField::N], 2.0);
        assert_eq!(out.inputs_echo[&InputField::AHChange], 5.0);
        assert_eq!(out.inputs_echo[&InputField::AHBare], 1.0);
        assert_eq!(out.inputs_echo[&InputField::PaperH], 0.2);
    }

    #[test]
    fn test_a_film_uses_fractional_stack_factor() {
        // n = 4 -> d = 2.5 (not 2): (9.0 - (1.0 * 2.5 + 0.5)) / 2.5 = 2.4
        let input = CalcInput {
            n: Some(4.0),
            a_h_change: Some(9.0),
            a_h_bare: Some(1.0),
            paper_h: Some(0.5),
            ..Default::default()
        };
        assert_eq!(calc_a_film(&input).unwrap().value, 2.4);
    }

    #[test]
    fn test_a_film_may_be_negative() {
        let input = CalcInput {
            a_h_change: Some(1.0),
            ..a_side()
        };
        // (1.0 - 1.7) / 1.5 = -0.4667 -> -0.47
        assert_eq!(calc_a_film(&input).unwrap().value, -0.47);
    }

    #[test]
    fn test_a_film_checks_n_first() {
        let input = CalcInput {
            n: Some(-1.0),
            a_h_change: None,
            a_h_bare: Some(-5.0),
            ..a_side()
        };
        let err = calc_a_film(&input).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_VALUE");
        assert_eq!(err.field(), Some("n"));

        let input = CalcInput {
            n: Some(1.5),
            ..a_side()
        };
        assert_eq!(calc_a_film(&input).unwrap_err().field(), Some("n"));
    }

    #[test]
    fn test_a_film_missing_fields() {
        for field in ParamType::AFilm.required_fields() {
            let mut input = a_side();
            match field {
                InputField::N => input.n = None,
                InputField::AHChange => input.a_h_change = None,
                InputField::AHBare => input.a_h_bare = None,
                InputField::PaperH => input.paper_h = None,
                _ => unreachable!(),
            }
            let err = calc_a_film(&input).unwrap_err();
            assert_eq!(err, CalcError::missing_field(field.key()));
        }
    }

    #[test]
    fn test_b_film_normal() {
        // (1.0 - (0.4 + 0.1 + 0.05)) / 2 = 0.225
        let out = calc_b_film(&b_side()).unwrap();
        assert_eq!(out.value, 0.225);
        assert_eq!(out.decimals, 4);
        assert_eq!(out.formula_id, "b_film");
        assert_eq!(out.inputs_echo.len(), 4);
        assert_eq!(out.inputs_echo[&InputField::CenterPaperH], 0.05);
    }

    #[test]
    fn test_b_film_ignores_unrelated_fields() {
        let input = CalcInput {
            n: Some(-7.0),
            a_h_bare: Some(-1.0),
            ..b_side()
        };
        let out = calc_b_film(&input).unwrap();
        assert!(!out.inputs_echo.contains_key(&InputField::N));
    }

    #[test]
    fn test_b_film_missing_fields() {
        for &field in ParamType::BFilm.required_fields() {
            let input = b_side()
                .entries()
                .into_iter()
                .filter(|(f, _)| *f != field)
                .fold(CalcInput::default(), |acc, (f, v)| acc.with(f, v));
            let err = calc_b_film(&input).unwrap_err();
            assert_eq!(err, CalcError::missing_field(field.key()), "{:?}", field);
        }
    }

    #[test]
    fn test_b_film_negative_input() {
        let input = CalcInput {
            center_paper_h: Some(-0.05),
            ..b_side()
        };
        let err = calc_b_film(&input).unwrap_err();
        assert_eq!(err.field(), Some("center_paper_h"));
    }
}
