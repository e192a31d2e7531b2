//! Chemical equation parsing for `equation_balance` questions.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{Error, Result};

/// A single species with its stoichiometric coefficient.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EquationTerm {
    pub coefficient: u32,
    pub formula: String,
}

/// Parsed `reactants -> products` equation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChemicalEquation {
    pub reactants: Vec<EquationTerm>,
    pub products: Vec<EquationTerm>,
}

impl ChemicalEquation {
    /// Same species and coefficients on each side, ignoring term order.
    pub fn same_terms(&self, other: &ChemicalEquation) -> bool {
        sorted(&self.reactants) == sorted(&other.reactants)
            && sorted(&self.products) == sorted(&other.products)
    }
}

fn sorted(terms: &[EquationTerm]) -> Vec<EquationTerm> {
    let mut terms = terms.to_vec();
    terms.sort();
    terms
}

/// Parse an equation such as `2H₂ + O₂ → 2H₂O`.
///
/// Accepted arrows are `->`, `→` and `=`. Unicode subscript digits are read as
/// ASCII digits.
pub fn parse_equation(input: &str) -> Result<ChemicalEquation> {
    let normalized = normalize_subscripts(input);
    let normalized = normalized.replace("->", "→").replace('=', "→");

    let mut sides = normalized.split('→');
    let (Some(left), Some(right), None) = (sides.next(), sides.next(), sides.next()) else {
        return Err(Error::InvalidEquation(format!(
            "expected exactly one arrow in '{input}'"
        )));
    };

    Ok(ChemicalEquation {
        reactants: parse_side(left, input)?,
        products: parse_side(right, input)?,
    })
}

/// Whether every element has the same atom count on both sides.
pub fn is_balanced(equation: &ChemicalEquation) -> Result<bool> {
    Ok(side_atoms(&equation.reactants)? == side_atoms(&equation.products)?)
}

fn parse_side(side: &str, input: &str) -> Result<Vec<EquationTerm>> {
    let term_re = Regex::new(r"^(\d*)([A-Za-z(\[].*)$")
        .map_err(|err| Error::InvalidEquation(err.to_string()))?;
    let mut terms = Vec::new();
    for raw in side.split('+') {
        let raw: String = raw.split_whitespace().collect();
        if raw.is_empty() {
            return Err(Error::InvalidEquation(format!("empty term in '{input}'")));
        }
        let caps = term_re
            .captures(&raw)
            .ok_or_else(|| Error::InvalidEquation(format!("invalid term '{raw}'")))?;
        let coefficient = match &caps[1] {
            "" => 1,
            digits => digits
                .parse::<u32>()
                .map_err(|_| Error::InvalidEquation(format!("invalid coefficient in '{raw}'")))?,
        };
        if coefficient == 0 {
            return Err(Error::InvalidEquation(format!("zero coefficient in '{raw}'")));
        }
        terms.push(EquationTerm {
            coefficient,
            formula: caps[2].to_string(),
        });
    }
    Ok(terms)
}

fn side_atoms(terms: &[EquationTerm]) -> Result<BTreeMap<String, u64>> {
    let mut totals = BTreeMap::new();
    for term in terms {
        for (element, count) in formula_atoms(&term.formula)? {
            let atoms = count
                .checked_mul(u64::from(term.coefficient))
                .ok_or_else(|| too_many_atoms(&term.formula))?;
            add_atoms(&mut totals, element, atoms, &term.formula)?;
        }
    }
    Ok(totals)
}

/// Count atoms per element, expanding `(...)n` and `[...]n` groups.
fn formula_atoms(formula: &str) -> Result<BTreeMap<String, u64>> {
    let chars: Vec<char> = formula.chars().collect();
    let mut stack: Vec<BTreeMap<String, u64>> = vec![BTreeMap::new()];
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        match ch {
            '(' | '[' => {
                stack.push(BTreeMap::new());
                idx += 1;
            }
            ')' | ']' => {
                idx += 1;
                let (multiplier, next) = read_count(&chars, idx, formula)?;
                idx = next;
                let group = stack.pop().ok_or_else(|| unbalanced(formula))?;
                let parent = stack.last_mut().ok_or_else(|| unbalanced(formula))?;
                for (element, count) in group {
                    let atoms = count
                        .checked_mul(multiplier)
                        .ok_or_else(|| too_many_atoms(formula))?;
                    add_atoms(parent, element, atoms, formula)?;
                }
            }
            'A'..='Z' => {
                let mut element = ch.to_string();
                idx += 1;
                while idx < chars.len() && chars[idx].is_ascii_lowercase() {
                    element.push(chars[idx]);
                    idx += 1;
                }
                let (count, next) = read_count(&chars, idx, formula)?;
                idx = next;
                let current = stack.last_mut().ok_or_else(|| unbalanced(formula))?;
                add_atoms(current, element, count, formula)?;
            }
            _ => {
                return Err(Error::InvalidEquation(format!(
                    "unexpected '{ch}' in formula '{formula}'"
                )));
            }
        }
    }

    if stack.len() != 1 {
        return Err(unbalanced(formula));
    }
    stack.pop().ok_or_else(|| unbalanced(formula))
}

fn read_count(chars: &[char], mut idx: usize, formula: &str) -> Result<(u64, usize)> {
    let start = idx;
    let mut value = 0_u64;
    while idx < chars.len() {
        let Some(digit) = chars[idx].to_digit(10) else {
            break;
        };
        value = value
            .checked_mul(10)
            .and_then(|value| value.checked_add(u64::from(digit)))
            .ok_or_else(|| too_many_atoms(formula))?;
        idx += 1;
    }
    Ok(if idx == start { (1, idx) } else { (value, idx) })
}

fn add_atoms(
    totals: &mut BTreeMap<String, u64>,
    element: String,
    count: u64,
    formula: &str,
) -> Result<()> {
    let total = totals.entry(element).or_insert(0);
    *total = total
        .checked_add(count)
        .ok_or_else(|| too_many_atoms(formula))?;
    Ok(())
}

fn too_many_atoms(formula: &str) -> Error {
    Error::InvalidEquation(format!("atom count overflows in '{formula}'"))
}

fn unbalanced(formula: &str) -> Error {
    Error::InvalidEquation(format!("unbalanced brackets in '{formula}'"))
}

fn normalize_subscripts(input: &str) -> String {
    input
        .chars()
        .map(|ch| match ch {
            '₀'..='₉' => char::from_digit(ch as u32 - '₀' as u32, 10).unwrap_or(ch),
            '⟶' => '→',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unicode_subscripts_and_coefficients() {
        let equation = parse_equation("2H₂ + O₂ → 2H₂O").expect("parse");
        assert_eq!(equation.reactants.len(), 2);
        assert_eq!(equation.reactants[0].coefficient, 2);
        assert_eq!(equation.reactants[0].formula, "H2");
        assert_eq!(equation.products[0].formula, "H2O");
        assert!(is_balanced(&equation).expect("balance"));
    }

    #[test]
    fn detects_unbalanced_equation() {
        let equation = parse_equation("H2 + O2 -> H2O").expect("parse");
        assert!(!is_balanced(&equation).expect("balance"));
    }

    #[test]
    fn expands_parenthesised_groups() {
        let equation =
            parse_equation("2Al(OH)3 + 3H2SO4 = Al2(SO4)3 + 6H2O").expect("parse");
        assert!(is_balanced(&equation).expect("balance"));
    }

    #[test]
    fn rejects_missing_arrow() {
        assert!(parse_equation("H2 + O2").is_err());
        assert!(parse_equation("H2 -> O2 -> H2O").is_err());
    }

    #[test]
    fn oversized_counts_are_rejected() {
        let equation =
            parse_equation("H99999999999999999999 -> H99999999999999999999").expect("parse");
        assert!(matches!(is_balanced(&equation), Err(Error::InvalidEquation(_))));

        let nested = parse_equation("4294967295((((H9999999999)9999999999)9) -> H2").expect("parse");
        assert!(matches!(is_balanced(&nested), Err(Error::InvalidEquation(_))));
    }

    #[test]
    fn same_terms_ignores_order() {
        let left = parse_equation("O2 + 2H2 -> 2H2O").expect("parse");
        let right = parse_equation("2H2+O2=2H2O").expect("parse");
        assert!(left.same_terms(&right));
    }
}
