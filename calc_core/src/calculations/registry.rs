//! # Formula Registry
//!
//! Metadata for every formula: what it computes, the plain-text formula, its
//! variables, output precision, and where the implementation lives. Used to
//! generate `FORMULAS.md` so the arithmetic can be audited without reading code.
//!
//! ## Usage
//!
//! ```rust
//! use calc_core::calculations::ParamType;
//!
//! let meta = ParamType::AFilm.metadata();
//! assert_eq!(meta.decimals, 2);
//! println!("Formula: {}", meta.formula_plain);
//! ```

use crate::calculations::{InputField, ParamType};

// ============================================================================
// Variable Definition
// ============================================================================

/// Definition of a variable used in a formula.
#[derive(Debug, Clone)]
pub struct Variable {
    /// Symbol (e.g., "H_a", "d")
    pub symbol: &'static str,
    /// Description
    pub description: &'static str,
    /// Input key the value comes from, if it is an input
    pub input: Option<InputField>,
}

impl Variable {
    pub const fn input(symbol: &'static str, field: InputField) -> Self {
        Self {
            symbol,
            description: "",
            input: Some(field),
        }
    }

    pub const fn derived(symbol: &'static str, description: &'static str) -> Self {
        Self {
            symbol,
            description,
            input: None,
        }
    }

    /// Description, falling back to the input label
    pub fn describe(&self) -> &'static str {
        match self.input {
            Some(field) if self.description.is_empty() => field.label(),
            _ => self.description,
        }
    }
}

// ============================================================================
// Formula Metadata
// ============================================================================

/// Complete metadata for one formula.
#[derive(Debug, Clone)]
pub struct FormulaMetadata {
    /// Human-readable name
    pub name: &'static str,
    /// Brief description of what this formula calculates
    pub description: &'static str,
    /// The formula in plain text
    pub formula_plain: &'static str,
    /// Variable definitions
    pub variables: Vec<Variable>,
    /// Output precision in decimal places
    pub decimals: u32,
    /// Assumptions or limitations
    pub assumptions: Vec<&'static str>,
    /// Source module where the implementation lives
    pub source_module: &'static str,
    /// Function name implementing the formula
    pub source_function: &'static str,
}

impl ParamType {
    /// Get the full metadata for this formula
    pub fn metadata(&self) -> FormulaMetadata {
        match self {
            ParamType::AFilm => FormulaMetadata {
                name: self.label(),
                description: "Insulation film thickness on the A side of a transposed cable",
                formula_plain: "film_a = (H_a - (h_a * d + p)) / d, d = (n + 1) / 2",
                variables: vec![
                    Variable::input("n", InputField::N),
                    Variable::input("H_a", InputField::AHChange),
                    Variable::input("h_a", InputField::AHBare),
                    Variable::input("p", InputField::PaperH),
                    Variable::derived("d", "Stack factor (n + 1) / 2, real division"),
                ],
                decimals: self.decimals(),
                assumptions: vec!["n is a whole number of at least 1", "Negative results are reported, not clamped"],
                source_module: "calculations/film.rs",
                source_function: "calc_a_film",
            },

            ParamType::BFilm => FormulaMetadata {
                name: self.label(),
                description: "Insulation film thickness on the B side of a transposed cable",
                formula_plain: "film_b = (H_b - (h_b * 2 + p + c)) / 2",
                variables: vec![
                    Variable::input("H_b", InputField::BHChange),
                    Variable::input("h_b", InputField::BHBare),
                    Variable::input("p", InputField::PaperH),
                    Variable::input("c", InputField::CenterPaperH),
                ],
                decimals: self.decimals(),
                assumptions: vec!["Two conductors across the B side", "Negative results are reported, not clamped"],
                source_module: "calculations/film.rs",
                source_function: "calc_b_film",
            },

            ParamType::ADie => FormulaMetadata {
                name: self.label(),
                description: "Extrusion die opening for the A side",
                formula_plain: "die_a = h_a + s_a + r_a",
                variables: vec![
                    Variable::input("h_a", InputField::AHBare),
                    Variable::input("s_a", InputField::AShrink),
                    Variable::input("r_a", InputField::AReserve),
                ],
                decimals: self.decimals(),
                assumptions: vec!["Shrink and reserve are given in mm, not as ratios"],
                source_module: "calculations/die.rs",
                source_function: "calc_a_die",
            },

            ParamType::BDie => FormulaMetadata {
                name: self.label(),
                description: "Extrusion die opening for the B side",
                formula_plain: "die_b = h_b + s_b + r_b",
                variables: vec![
                    Variable::input("h_b", InputField::BHBare),
                    Variable::input("s_b", InputField::BShrink),
                    Variable::input("r_b", InputField::BReserve),
                ],
                decimals: self.decimals(),
                assumptions: vec!["Shrink and reserve are given in mm, not as ratios"],
                source_module: "calculations/die.rs",
                source_function: "calc_b_die",
            },
        }
    }
}

/// Generate the formula reference as markdown.
///
/// ```rust
/// use calc_core::calculations::generate_formulas_markdown;
///
/// let markdown = generate_formulas_markdown();
/// assert!(markdown.contains("A-side film thickness"));
/// ```
pub fn generate_formulas_markdown() -> String {
    let mut output = String::with_capacity(4_096);

    output.push_str(
        r#"# Formula Reference

> **Auto-generated from source code. Do not edit manually.**
>
> Regenerate with: `cargo run --bin gen-formulas`

All lengths are millimeters. Rounding is half away from zero:
`round(x, k) = round(x * 10^k) / 10^k`.

---

"#,
    );

    for param in ParamType::ALL {
        let meta = param.metadata();

        output.push_str(&format!("## {}\n\n", meta.name));
        output.push_str(&format!("{}\n\n", meta.description));
        output.push_str(&format!("**Formula:** `{}`\n\n", meta.formula_plain));
        output.push_str(&format!(
            "**Precision:** {} decimal places, id `{}`\n\n",
            meta.decimals,
            param.formula_id()
        ));

        output.push_str("| Symbol | Description | Input key |\n");
        output.push_str("|--------|-------------|-----------|\n");
        for var in &meta.variables {
            output.push_str(&format!(
                "| {} | {} | {} |\n",
                var.symbol,
                var.describe(),
                var.input.map(|f| f.key()).unwrap_or("-")
            ));
        }
        output.push('\n');

        output.push_str(&format!(
            "**Source:** [`{}`]({})\n\n",
            meta.source_function, meta.source_module
        ));

        if !meta.assumptions.is_empty() {
            output.push_str("**Assumptions:**\n");
            for assumption in &meta.assumptions {
                output.push_str(&format!("- {}\n", assumption));
            }
            output.push('\n');
        }

        output.push_str("---\n\n");
    }

    output
}
