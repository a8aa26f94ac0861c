//! Constant-expression evaluation embedded in source text.
//!
//! Two embedding forms are recognised: the explicit
//! `` \[expr] `` / `` \`expr` `` form with optional rounding or
//! decimal-scale modifier, and a bare arithmetic expression validated
//! against an allowed character set. Sized integer literals in the
//! calculator's notation (`#FF:8h`) are converted to plain decimal
//! before evaluation, using two's-complement semantics when a signed
//! marker is present.

use regex::Regex;

use crate::config::constants::{EULER, EVAL_AUTO_PRECISION, PI};
use crate::diagnostics::DiagnosticCollector;

/// Rounding requested by an embedded-expression modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rounding {
    None,
    Floor,
    Ceil,
    Round,
}

/// Resolve every embedded `` \[…] `` / `` \`…` `` expression in `line`.
/// Returns true when at least one expression was replaced.
pub fn parse(line: &mut String, diagnostics: &mut DiagnosticCollector) -> bool {
    let re = Regex::new(r"\\ *(\d{1,2}|F|C|R)?[\[`]([^\[\]`]*)[\]`]").expect("embedded form");
    let mut replaced = false;

    while let Some(captures) = re.captures(line) {
        let Some(whole) = captures.get(0) else {
            break;
        };
        let (start, end) = (whole.start(), whole.end());

        let mut rounding = Rounding::None;
        let mut scale: Option<usize> = None;
        if let Some(modifier) = captures.get(1) {
            match modifier.as_str() {
                "F" => rounding = Rounding::Floor,
                "C" => rounding = Rounding::Ceil,
                "R" => rounding = Rounding::Round,
                digits => scale = digits.parse().ok(),
            }
        }

        let mut expression = captures[2].to_string();
        convert_sized_literals(&mut expression, diagnostics);
        expression = expression.replace('π', PI).replace('e', EULER);
        expression.retain(|ch| ch != ' ');

        let mut value = evaluate(&expression, diagnostics);
        value = match rounding {
            Rounding::None => value,
            Rounding::Floor => value.floor(),
            Rounding::Ceil => value.ceil(),
            Rounding::Round => value.round(),
        };

        line.replace_range(start..end, &format_value(value, scale));
        replaced = true;
    }

    replaced
}

/// Evaluate `text` in place when it is a bare arithmetic expression.
/// Anything outside the allowed character set leaves the text untouched
/// and returns false.
pub fn evaluate_math_expression(text: &mut String, diagnostics: &mut DiagnosticCollector) -> bool {
    // Sized literals widen the allowed set with their own syntax; after
    // the pre-pass the remainder must be a plain expression.
    let candidate = Regex::new(r"^[0-9A-F#:hod+\-*/ πe%&|()]+$").expect("candidate character set");
    if !candidate.is_match(text) {
        return false;
    }

    let mut expression = text.clone();
    convert_sized_literals(&mut expression, diagnostics);

    let plain = Regex::new(r"^[\d+\-*/ πe%&|()]+$").expect("allowed character set");
    if !plain.is_match(&expression) {
        return false;
    }

    expression = expression.replace('π', PI).replace('e', EULER);
    expression.retain(|ch| ch != ' ');

    let value = evaluate(&expression, diagnostics);
    *text = format_value(value, None);
    true
}

// MARK: - Sized integer literals

fn mask_to_width(value: u64, bits: u32) -> u64 {
    match bits {
        0 => 0,
        1..=63 => value & ((1u64 << bits) - 1),
        _ => value,
    }
}

fn unsigned_decimal(value: u64, bits: u32) -> String {
    let bits = if (1..=64).contains(&bits) { bits } else { 64 };
    mask_to_width(value, bits).to_string()
}

fn signed_decimal(value: u64, bits: u32) -> String {
    let bits = if (1..=64).contains(&bits) { bits } else { 64 };
    let masked = mask_to_width(value, bits);
    let signed = if bits == 64 {
        masked as i64
    } else if (masked >> (bits - 1)) & 1 == 1 {
        masked as i64 - (1i64 << bits)
    } else {
        masked as i64
    };
    signed.to_string()
}

/// Rewrite every sized integer literal in `text` to plain decimal.
///
/// The literal form is `#<digits>[:[-]<bits>][h|o|d]`; the base suffix
/// defaults to decimal, the bit width to 64, and the `-` marker selects
/// two's-complement interpretation.
pub fn convert_sized_literals(text: &mut String, diagnostics: &mut DiagnosticCollector) {
    let re = Regex::new(r"#([0-9A-F]+)(?::(-)?(6[0-4]|[1-5][0-9]|[1-9]))?([hod])?")
        .expect("sized literal");

    while let Some(captures) = re.captures(text) {
        let Some(whole) = captures.get(0) else {
            break;
        };
        let (start, end) = (whole.start(), whole.end());

        let radix = match captures.get(4).map(|m| m.as_str()) {
            Some("h") => 16,
            Some("o") => 8,
            _ => 10,
        };
        let bits: u32 = captures
            .get(3)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(64);
        let signed = captures.get(2).is_some();

        let decimal = match u64::from_str_radix(&captures[1], radix) {
            Ok(value) if signed => signed_decimal(value, bits),
            Ok(value) => unsigned_decimal(value, bits),
            Err(_) => {
                diagnostics.error(
                    format!("invalid integer literal '{}'", &captures[0]),
                    None,
                    0,
                );
                "0".to_string()
            }
        };
        text.replace_range(start..end, &decimal);
    }
}

// MARK: - Infix evaluation

fn is_operator(ch: char) -> bool {
    matches!(ch, '+' | '-' | '*' | '/' | '%' | '^')
}

fn precedence(op: char) -> u8 {
    match op {
        '+' | '-' => 1,
        '*' | '/' | '%' => 2,
        '^' => 3,
        _ => 0,
    }
}

fn apply_operator(a: f64, b: f64, op: char, diagnostics: &mut DiagnosticCollector) -> f64 {
    match op {
        '+' => a + b,
        '-' => a - b,
        '*' => a * b,
        '/' => {
            if b == 0.0 {
                diagnostics.error("#[]: division by zero", None, 0);
                0.0
            } else {
                a / b
            }
        }
        // Floored modulo; the result sign follows the divisor.
        '%' => {
            let remainder = a % b;
            if remainder < 0.0 {
                b + remainder
            } else {
                remainder
            }
        }
        '^' => a.powf(b),
        _ => {
            diagnostics.error(format!("#[]: unknown '{op}' operator"), None, 0);
            0.0
        }
    }
}

/// Insert separators around operators so the expression splits into
/// tokens. A `-` not preceded by a digit is unary and stays attached to
/// its operand.
fn separate_expression(expression: &str) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let mut separated = String::with_capacity(expression.len() * 2);
    for (index, &ch) in chars.iter().enumerate() {
        if ch == '(' || ch == ')' || is_operator(ch) {
            let unary = ch == '-'
                && (index == 0 || !chars[index - 1].is_ascii_digit());
            if unary {
                separated.push(' ');
                separated.push(ch);
            } else {
                separated.push(' ');
                separated.push(ch);
                separated.push(' ');
            }
        } else {
            separated.push(ch);
        }
    }
    separated
}

fn infix_to_postfix(expression: &str, diagnostics: &mut DiagnosticCollector) -> Vec<String> {
    let mut output: Vec<String> = Vec::new();
    let mut operators: Vec<char> = Vec::new();

    for token in expression.split_whitespace() {
        let first = token.chars().next().unwrap_or(' ');

        if first.is_ascii_digit() || (token.len() > 1 && first == '-') {
            output.push(token.to_string());
            continue;
        }

        if is_operator(first) {
            while let Some(&top) = operators.last() {
                if precedence(top) >= precedence(first) {
                    output.push(top.to_string());
                    operators.pop();
                } else {
                    break;
                }
            }
            operators.push(first);
            continue;
        }

        if first == '(' {
            operators.push('(');
            continue;
        }

        if first == ')' {
            loop {
                match operators.pop() {
                    Some('(') => break,
                    Some(top) => output.push(top.to_string()),
                    None => {
                        diagnostics.error(
                            format!("#[]: missing '(' in expression '{expression}'"),
                            None,
                            0,
                        );
                        break;
                    }
                }
            }
            continue;
        }

        diagnostics.error(
            format!("#[]: unknown '{token}' in expression '{expression}'"),
            None,
            0,
        );
    }

    while let Some(top) = operators.pop() {
        output.push(top.to_string());
    }

    log::trace!(target: "ppl_compiler::calc", "RPN: {}", output.join(","));
    output
}

fn evaluate_postfix(postfix: &[String], diagnostics: &mut DiagnosticCollector) -> f64 {
    let mut values: Vec<f64> = Vec::new();

    for token in postfix {
        let first = token.chars().next().unwrap_or(' ');
        if first.is_ascii_digit() || (token.len() > 1 && first == '-') {
            match token.parse::<f64>() {
                Ok(value) => values.push(value),
                Err(_) => {
                    diagnostics.error(format!("#[]: unknown '{token}' number"), None, 0);
                    values.push(0.0);
                }
            }
            continue;
        }
        if is_operator(first) {
            let b = values.pop().unwrap_or(0.0);
            let a = values.pop().unwrap_or(0.0);
            values.push(apply_operator(a, b, first, diagnostics));
        }
    }

    values.pop().unwrap_or(0.0)
}

fn evaluate(expression: &str, diagnostics: &mut DiagnosticCollector) -> f64 {
    let separated = separate_expression(expression);
    let postfix = infix_to_postfix(&separated, diagnostics);
    evaluate_postfix(&postfix, diagnostics)
}

/// Format a result: fixed scale when requested, otherwise the working
/// precision with trailing zeros and a bare trailing point trimmed.
fn format_value(value: f64, scale: Option<usize>) -> String {
    match scale {
        Some(scale) => format!("{value:.scale$}"),
        None => {
            let precision = EVAL_AUTO_PRECISION;
            let mut text = format!("{value:.precision$}");
            while text.ends_with('0') {
                text.pop();
            }
            if text.ends_with('.') {
                text.pop();
            }
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(text: &str) -> (String, DiagnosticCollector) {
        let mut diagnostics = DiagnosticCollector::new();
        let mut line = text.to_string();
        evaluate_math_expression(&mut line, &mut diagnostics);
        (line, diagnostics)
    }

    #[test]
    fn respects_operator_precedence() {
        assert_eq!(eval("1+2*3").0, "7");
        assert_eq!(eval("(1+2)*3").0, "9");
    }

    #[test]
    fn division_by_zero_reports_and_yields_zero() {
        let (result, diagnostics) = eval("5/0");
        assert_eq!(result, "0");
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn sized_hex_literal_converts_before_arithmetic() {
        assert_eq!(eval("#FF:8h").0, "255");
        assert_eq!(eval("#FF:8h+1").0, "256");
    }

    #[test]
    fn signed_sized_literal_uses_twos_complement() {
        assert_eq!(eval("#FF:-8h").0, "-1");
        assert_eq!(eval("#7F:-8h").0, "127");
    }

    #[test]
    fn octal_and_decimal_bases() {
        assert_eq!(eval("#10o").0, "8");
        assert_eq!(eval("#10d").0, "10");
    }

    #[test]
    fn unary_minus_binds_to_operand() {
        assert_eq!(eval("-3+5").0, "2");
        assert_eq!(eval("2*-3").0, "-6");
    }

    #[test]
    fn modulo_is_floored() {
        assert_eq!(eval("-7%3").0, "2");
        assert_eq!(eval("7%3").0, "1");
    }

    #[test]
    fn non_expressions_are_untouched() {
        let (result, _) = eval("A:=B+1;");
        assert_eq!(result, "A:=B+1;");
    }

    #[test]
    fn embedded_form_with_scale_and_rounding() {
        let mut diagnostics = DiagnosticCollector::new();

        let mut line = r"X:=\[10/4];".to_string();
        assert!(parse(&mut line, &mut diagnostics));
        assert_eq!(line, "X:=2.5;");

        let mut line = r"X:=\2[10/4];".to_string();
        assert!(parse(&mut line, &mut diagnostics));
        assert_eq!(line, "X:=2.50;");

        let mut line = r"X:=\F[10/4];".to_string();
        assert!(parse(&mut line, &mut diagnostics));
        assert_eq!(line, "X:=2;");

        let mut line = r"X:=\C[10/4];".to_string();
        assert!(parse(&mut line, &mut diagnostics));
        assert_eq!(line, "X:=3;");
    }

    #[test]
    fn backtick_form_evaluates_too() {
        let mut diagnostics = DiagnosticCollector::new();
        let mut line = "X:=\\`2^10`;".to_string();
        assert!(parse(&mut line, &mut diagnostics));
        assert_eq!(line, "X:=1024;");
    }

    #[test]
    fn nested_embedded_forms_resolve_inner_first() {
        let mut diagnostics = DiagnosticCollector::new();
        let mut line = r"X:=\[1+\[2*3]];".to_string();
        assert!(parse(&mut line, &mut diagnostics));
        assert_eq!(line, "X:=7;");
    }
}
