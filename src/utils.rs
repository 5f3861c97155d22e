/// Formats a floating point number in scientific notation, with `precision`
/// digits after the decimal point, right-justified over `width` characters.
///
/// RINEX expects the exponent to be signed and to span at least two digits
/// (`E+01`, `E-09`), while Rust formats it on as few digits as possible and
/// only signs negative exponents (`E1`, `E-9`): the exponent is reworked here.
/// Non finite values are rendered as `NAN`, `INF` or `-INF`.
pub fn fmt_scientific(value: f64, precision: usize, width: usize) -> String {
    let formatted = if value.is_nan() {
        "NAN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_negative() {
            "-INF".to_string()
        } else {
            "INF".to_string()
        }
    } else {
        let raw = format!("{:.*E}", precision, value);

        match raw.split_once('E') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{}E{}{:0>2}", mantissa, sign, digits)
            },
            None => raw,
        }
    };

    format!("{:>width$}", formatted, width = width)
}
