//! Default string operation catalogue.
//!
//! The engine starts with an empty registry; call [`register_builtins`]
//! once at startup to install the default set. Every operation checks its
//! argument shape and fails with [`OpError::BadArgs`] rather than
//! guessing.

use filament_graph_core::registry;
use filament_graph_core::{OpError, OpOutput};

/// Register every built-in operation. Later calls replace the earlier
/// bindings, so calling this more than once is harmless.
pub fn register_builtins() {
    registry::register_fn("identity", identity);
    registry::register_fn("concat", concat);
    registry::register_fn("reverse", reverse);
    registry::register_fn("to_upper", to_upper);
    registry::register_fn("to_lower", to_lower);
    registry::register_fn("trim", trim);
    registry::register_fn("replace", replace);
    registry::register_fn("substring", substring);
    registry::register_fn("repeat", repeat);
    registry::register_fn("pad_left", pad_left);
    registry::register_fn("pad_right", pad_right);
    registry::register_fn("capitalize", capitalize);
    registry::register_fn("title", title);
    registry::register_fn("split", split);
}

fn expect_unary(name: &str, inputs: &[&str], constants: &[&str]) -> Result<(), OpError> {
    if inputs.len() != 1 || !constants.is_empty() {
        return Err(OpError::BadArgs(format!(
            "{name} requires exactly one input and no constants, got {} inputs and {} constants",
            inputs.len(),
            constants.len()
        )));
    }
    Ok(())
}

fn expect_constants(
    name: &str,
    inputs: &[&str],
    constants: &[&str],
    want: usize,
) -> Result<(), OpError> {
    if inputs.len() != 1 || constants.len() != want {
        return Err(OpError::BadArgs(format!(
            "{name} requires exactly one input and {want} constants, got {} inputs and {} constants",
            inputs.len(),
            constants.len()
        )));
    }
    Ok(())
}

fn numeric_constant(name: &str, raw: &str) -> Result<usize, OpError> {
    raw.parse::<usize>().map_err(|_| {
        OpError::BadArgs(format!("{name} requires a numeric constant, got '{raw}'"))
    })
}

/// Exactly one input, echoed unchanged.
fn identity(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    expect_unary("identity", inputs, constants)?;
    Ok(OpOutput::Single(inputs[0].to_string()))
}

/// All inputs, then all constants, appended in order.
fn concat(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    let total: usize = inputs.iter().chain(constants).map(|s| s.len()).sum();
    let mut out = String::with_capacity(total);
    for s in inputs {
        out.push_str(s);
    }
    for s in constants {
        out.push_str(s);
    }
    Ok(OpOutput::Single(out))
}

fn reverse(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    expect_unary("reverse", inputs, constants)?;
    Ok(OpOutput::Single(inputs[0].chars().rev().collect()))
}

fn to_upper(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    expect_unary("to_upper", inputs, constants)?;
    Ok(OpOutput::Single(inputs[0].to_uppercase()))
}

fn to_lower(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    expect_unary("to_lower", inputs, constants)?;
    Ok(OpOutput::Single(inputs[0].to_lowercase()))
}

fn trim(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    expect_unary("trim", inputs, constants)?;
    Ok(OpOutput::Single(inputs[0].trim().to_string()))
}

/// One input and two constants: every occurrence of the first constant is
/// replaced with the second.
fn replace(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    expect_constants("replace", inputs, constants, 2)?;
    Ok(OpOutput::Single(inputs[0].replace(constants[0], constants[1])))
}

/// One input and two numeric constants selecting a half-open character
/// range `[start, end)`, clamped to the input length.
fn substring(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    expect_constants("substring", inputs, constants, 2)?;
    let start = numeric_constant("substring", constants[0])?;
    let end = numeric_constant("substring", constants[1])?;
    let chars: Vec<char> = inputs[0].chars().collect();
    let end = end.min(chars.len());
    let start = start.min(end);
    Ok(OpOutput::Single(chars[start..end].iter().collect()))
}

fn repeat(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    expect_constants("repeat", inputs, constants, 1)?;
    let count = numeric_constant("repeat", constants[0])?;
    Ok(OpOutput::Single(inputs[0].repeat(count)))
}

fn pad_left(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    let (width, fill) = pad_args("pad_left", inputs, constants)?;
    let length = inputs[0].chars().count();
    if length >= width {
        return Ok(OpOutput::Single(inputs[0].to_string()));
    }
    let mut out = String::with_capacity(inputs[0].len() + (width - length));
    out.extend(std::iter::repeat(fill).take(width - length));
    out.push_str(inputs[0]);
    Ok(OpOutput::Single(out))
}

fn pad_right(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    let (width, fill) = pad_args("pad_right", inputs, constants)?;
    let length = inputs[0].chars().count();
    if length >= width {
        return Ok(OpOutput::Single(inputs[0].to_string()));
    }
    let mut out = String::with_capacity(inputs[0].len() + (width - length));
    out.push_str(inputs[0]);
    out.extend(std::iter::repeat(fill).take(width - length));
    Ok(OpOutput::Single(out))
}

/// Shared validation for the pad operations: a numeric target width and a
/// single-character fill.
fn pad_args(name: &str, inputs: &[&str], constants: &[&str]) -> Result<(usize, char), OpError> {
    expect_constants(name, inputs, constants, 2)?;
    let width = numeric_constant(name, constants[0])?;
    let mut fill_chars = constants[1].chars();
    match (fill_chars.next(), fill_chars.next()) {
        (Some(fill), None) => Ok((width, fill)),
        _ => Err(OpError::BadArgs(format!(
            "{name} requires a single-character fill constant, got '{}'",
            constants[1]
        ))),
    }
}

/// Uppercase the first character, lowercase the rest.
fn capitalize(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    expect_unary("capitalize", inputs, constants)?;
    let mut chars = inputs[0].chars();
    let out = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    };
    Ok(OpOutput::Single(out))
}

/// Uppercase the first character of every whitespace-separated word and
/// lowercase the rest.
fn title(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    expect_unary("title", inputs, constants)?;
    let mut out = String::with_capacity(inputs[0].len());
    let mut at_word_start = true;
    for c in inputs[0].chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    Ok(OpOutput::Single(out))
}

/// One input split on one delimiter constant, multi-output. An empty
/// delimiter splits into characters; a delimiter that never matches
/// yields the whole input as the only element.
fn split(inputs: &[&str], constants: &[&str]) -> Result<OpOutput, OpError> {
    if inputs.len() != 1 || constants.len() != 1 {
        return Err(OpError::BadArgs(format!(
            "split requires exactly one input and one delimiter constant, got {} inputs and {} constants",
            inputs.len(),
            constants.len()
        )));
    }
    let (input, delimiter) = (inputs[0], constants[0]);
    let parts: Vec<String> = if delimiter.is_empty() {
        input.chars().map(String::from).collect()
    } else {
        input.split(delimiter).map(str::to_string).collect()
    };
    Ok(OpOutput::Many(parts))
}
