//! Common input templates (standard paper thicknesses, conductor counts).
//!
//! A preset is a sparse [`CalcInput`]; applying it overwrites only the fields
//! it sets.

use once_cell::sync::Lazy;

use crate::calculations::{CalcInput, InputField};

#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub label: &'static str,
    pub values: CalcInput,
}

impl Preset {
    fn new(label: &'static str, field: InputField, value: f64) -> Self {
        Preset {
            label,
            values: CalcInput::default().with(field, value),
        }
    }

    /// `input` with this preset's fields laid over it
    pub fn apply(&self, input: &CalcInput) -> CalcInput {
        input.merged_with(&self.values)
    }
}

pub static PRESETS: Lazy<Vec<Preset>> = Lazy::new(|| {
    vec![
        Preset::new("0.45 paper", InputField::PaperH, 0.45),
        Preset::new("1.35 paper", InputField::PaperH, 1.35),
        Preset::new("2.45 center paper", InputField::CenterPaperH, 2.45),
        Preset::new("3.00 center paper", InputField::CenterPaperH, 3.00),
        Preset::new("1 conductor", InputField::N, 1.0),
        Preset::new("2 conductors", InputField::N, 2.0),
    ]
});

/// Case-insensitive lookup by label
pub fn find_preset(label: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.label.eq_ignore_ascii_case(label.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_set_one_field_each() {
        assert_eq!(PRESETS.len(), 6);
        for preset in PRESETS.iter() {
            assert_eq!(preset.values.entries().len(), 1, "{}", preset.label);
        }
    }

    #[test]
    fn test_apply_keeps_other_fields() {
        let input = CalcInput {
            n: Some(3.0),
            paper_h: Some(0.2),
            ..Default::default()
        };
        let applied = find_preset("1.35 PAPER").unwrap().apply(&input);
        assert_eq!(applied.paper_h, Some(1.35));
        assert_eq!(applied.n, Some(3.0));
    }

    #[test]
    fn test_unknown_preset() {
        assert!(find_preset("4 conductors").is_none());
    }
}
