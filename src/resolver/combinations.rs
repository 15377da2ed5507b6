// Combination Generator
//
// Bounded Cartesian expansion of a template site. Depth-first over the
// distinct resolved variables in order of first appearance, so the leftmost
// variable varies slowest. Generation stops as soon as the output is full.

use std::collections::HashMap;

use super::base::{LiteralValueSet, TemplatePart};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combinations {
    pub values: Vec<String>,
    /// Values or combinations were dropped to stay within the limits
    pub truncated: bool,
}

/// Expand `parts` with the literal sets in `resolved`
///
/// Variables absent from `resolved` (or resolved to an empty set) are
/// rendered as `{expression}`. A variable that appears several times takes
/// the same value everywhere within one combination. At least one value per
/// resolved variable is always kept.
pub fn generate_combinations(
    parts: &[TemplatePart],
    resolved: &HashMap<String, LiteralValueSet>,
    max_values_per_variable: usize,
    max_combinations: usize,
) -> Combinations {
    let max_values_per_variable = max_values_per_variable.max(1);
    let mut variables: Vec<(&str, Vec<&str>)> = Vec::new();
    let mut truncated = false;
    for part in parts {
        let TemplatePart::Variable { expression, .. } = part else {
            continue;
        };
        if variables.iter().any(|(name, _)| *name == expression.as_str()) {
            continue;
        }
        let Some(values) = resolved.get(expression).filter(|values| !values.is_empty()) else {
            continue;
        };
        if values.len() > max_values_per_variable {
            truncated = true;
        }
        let kept = values.iter().take(max_values_per_variable).collect();
        variables.push((expression.as_str(), kept));
    }

    let mut output = Combinations {
        values: Vec::new(),
        truncated,
    };
    if max_combinations == 0 || variables.iter().any(|(_, values)| values.is_empty()) {
        output.truncated |= max_combinations == 0;
        return output;
    }

    let mut chosen: Vec<&str> = Vec::with_capacity(variables.len());
    expand(parts, &variables, &mut chosen, max_combinations, &mut output);
    output
}

/// Returns false once the output is full
fn expand<'a>(
    parts: &[TemplatePart],
    variables: &[(&'a str, Vec<&'a str>)],
    chosen: &mut Vec<&'a str>,
    max_combinations: usize,
    output: &mut Combinations,
) -> bool {
    if chosen.len() == variables.len() {
        if output.values.len() == max_combinations {
            output.truncated = true;
            return false;
        }
        output.values.push(render(parts, variables, chosen));
        return true;
    }

    let (_, values) = &variables[chosen.len()];
    for value in values {
        chosen.push(*value);
        let keep_going = expand(parts, variables, chosen, max_combinations, output);
        chosen.pop();
        if !keep_going {
            return false;
        }
    }
    true
}

fn render(parts: &[TemplatePart], variables: &[(&str, Vec<&str>)], chosen: &[&str]) -> String {
    let mut text = String::new();
    for part in parts {
        match part {
            TemplatePart::Static { text: literal } => text.push_str(literal),
            TemplatePart::Variable { expression, .. } => {
                match variables.iter().position(|(name, _)| *name == expression.as_str()) {
                    Some(index) => text.push_str(chosen[index]),
                    None => {
                        text.push('{');
                        text.push_str(expression);
                        text.push('}');
                    }
                }
            }
        }
    }
    text
}
