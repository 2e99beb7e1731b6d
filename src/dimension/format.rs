use super::DimensionStyle;

/// Display settings of dimension values.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    /// Decimal places of engineering values, metres and decimal inches.
    /// Default: 2.
    pub precision: usize,
    /// Architectural inches are rounded to `1 / fraction_denominator`.
    /// Default: 16.
    pub fraction_denominator: u32,
    /// Metric values at or above this many millimetres are shown in metres.
    /// Default: 1000.
    pub metric_threshold: f64,
    /// Inches per drawing unit for the feet/inches styles. Default: 1.
    pub inches_per_unit: f64,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            precision: 2,
            fraction_denominator: 16,
            metric_threshold: 1000.0,
            inches_per_unit: 1.0,
        }
    }
}

impl FormatOptions {
    #[must_use]
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    #[must_use]
    pub fn with_fraction_denominator(mut self, denominator: u32) -> Self {
        self.fraction_denominator = denominator.max(1);
        self
    }

    #[must_use]
    pub fn with_metric_threshold(mut self, threshold: f64) -> Self {
        self.metric_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_inches_per_unit(mut self, inches: f64) -> Self {
        self.inches_per_unit = inches;
        self
    }
}

/// Formats a dimension value in the given style.
#[must_use]
pub fn format_value(value: f64, style: DimensionStyle, options: &FormatOptions) -> String {
    match style {
        DimensionStyle::Architectural => architectural(
            value * options.inches_per_unit,
            options.fraction_denominator,
        ),
        DimensionStyle::Metric => {
            if value.abs() < options.metric_threshold {
                format!("{value:.0} mm")
            } else {
                format!("{:.*} m", options.precision, value / 1000.0)
            }
        }
        DimensionStyle::Engineering => format!("{:.*}", options.precision, value),
        DimensionStyle::Imperial => imperial(value * options.inches_per_unit, options.precision),
    }
}

fn sign(inches: f64) -> &'static str {
    if inches < 0.0 {
        "-"
    } else {
        ""
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn architectural(inches: f64, denominator: u32) -> String {
    let denominator = u64::from(denominator.max(1));
    // Whole number of 1/denominator steps.
    let steps = (inches.abs() * denominator as f64).round() as u64;
    let per_foot = 12 * denominator;
    let feet = steps / per_foot;
    let rest = steps % per_foot;
    let whole = rest / denominator;
    let mut numerator = rest % denominator;

    let sign = if steps == 0 { "" } else { sign(inches) };
    if numerator == 0 {
        return format!("{sign}{feet}' {whole}\"");
    }
    let divisor = gcd(numerator, denominator);
    numerator /= divisor;
    format!("{sign}{feet}' {whole} {numerator}/{}\"", denominator / divisor)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn imperial(inches: f64, precision: usize) -> String {
    let scale = 10f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
    let rounded = (inches.abs() * scale).round() / scale;
    let mut feet = (rounded / 12.0).floor();
    let mut rest = rounded - feet * 12.0;
    if 12.0 - rest < 0.5 / scale {
        feet += 1.0;
        rest = 0.0;
    }
    let sign = if rounded == 0.0 { "" } else { sign(inches) };
    format!("{sign}{}' {:.*}\"", feet as u64, precision, rest)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(value: f64, style: DimensionStyle) -> String {
        format_value(value, style, &FormatOptions::default())
    }

    #[test]
    fn architectural_feet_and_fractional_inches() {
        assert_eq!(fmt(63.5, DimensionStyle::Architectural), "5' 3 1/2\"");
        assert_eq!(fmt(60.0, DimensionStyle::Architectural), "5' 0\"");
        assert_eq!(fmt(12.0 + 0.0625, DimensionStyle::Architectural), "1' 0 1/16\"");
    }

    #[test]
    fn architectural_rounding_carries_into_feet() {
        // 11.99 rounds up to a full foot.
        assert_eq!(fmt(11.99, DimensionStyle::Architectural), "1' 0\"");
    }

    #[test]
    fn architectural_respects_denominator_and_unit() {
        let options = FormatOptions::default()
            .with_fraction_denominator(4)
            .with_inches_per_unit(1.0 / 2.54);
        // 160.02 cm is 63 inches.
        assert_eq!(format_value(160.02, DimensionStyle::Architectural, &options), "5' 3\"");
    }

    #[test]
    fn metric_switches_unit_at_threshold() {
        assert_eq!(fmt(500.0, DimensionStyle::Metric), "500 mm");
        assert_eq!(fmt(999.0, DimensionStyle::Metric), "999 mm");
        assert_eq!(fmt(1000.0, DimensionStyle::Metric), "1.00 m");
        assert_eq!(fmt(2450.0, DimensionStyle::Metric), "2.45 m");
    }

    #[test]
    fn engineering_uses_precision() {
        assert_eq!(fmt(5.0, DimensionStyle::Engineering), "5.00");
        let options = FormatOptions::default().with_precision(3);
        assert_eq!(format_value(1.23456, DimensionStyle::Engineering, &options), "1.235");
    }

    #[test]
    fn imperial_decimal_inches() {
        assert_eq!(fmt(63.5, DimensionStyle::Imperial), "5' 3.50\"");
        assert_eq!(fmt(23.999, DimensionStyle::Imperial), "2' 0.00\"");
        assert_eq!(fmt(-18.0, DimensionStyle::Imperial), "-1' 6.00\"");
    }
}
