/// hPa to millimetres of mercury.
pub const HPA_TO_MMHG: f64 = 0.75006;

/// Round to the nearest integer, ties to even.
pub fn round_to_int(value: f64) -> i64 {
    value.round_ties_even() as i64
}

pub fn hpa_to_mmhg(hpa: f64) -> f64 {
    hpa * HPA_TO_MMHG
}

/// Capitalize the first character and lowercase the rest.
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Uppercase every letter that follows a non-letter, lowercase the others.
pub fn title_case(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut prev_is_letter = false;

    for c in input.chars() {
        if prev_is_letter {
            result.extend(c.to_lowercase());
        } else {
            result.extend(c.to_uppercase());
        }
        prev_is_letter = c.is_alphabetic();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_int() {
        assert_eq!(round_to_int(21.4), 21);
        assert_eq!(round_to_int(19.6), 20);
        assert_eq!(round_to_int(-3.7), -4);
        assert_eq!(round_to_int(2.5), 2);
        assert_eq!(round_to_int(3.5), 4);
    }

    #[test]
    fn test_pressure_conversion() {
        assert_eq!(round_to_int(hpa_to_mmhg(1013.0)), 760);
        assert_eq!(round_to_int(hpa_to_mmhg(1000.0)), 750);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("облачно с прояснениями"), "Облачно с прояснениями");
        assert_eq!(capitalize("LIGHT RAIN"), "Light rain");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("new york"), "New York");
        assert_eq!(title_case("санкт-петербург"), "Санкт-Петербург");
        assert_eq!(title_case("MOSCOW"), "Moscow");
        assert_eq!(title_case("rostov-on-don"), "Rostov-On-Don");
    }
}
