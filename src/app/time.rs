/// Format seconds as zero-padded `MM:SS`.
///
/// NaN and negative inputs render as `00:00`. Minutes are not capped, so an
/// hour and a half is `90:00`.
pub fn seconds_to_minutes_seconds(seconds: f64) -> String {
    if seconds.is_nan() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let whole = seconds.floor().min(u64::MAX as f64) as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::seconds_to_minutes_seconds;

    #[test]
    fn pads_and_splits() {
        assert_eq!(seconds_to_minutes_seconds(0.0), "00:00");
        assert_eq!(seconds_to_minutes_seconds(7.9), "00:07");
        assert_eq!(seconds_to_minutes_seconds(65.0), "01:05");
        assert_eq!(seconds_to_minutes_seconds(5400.0), "90:00");
    }

    #[test]
    fn nan_and_negative_are_zero() {
        assert_eq!(seconds_to_minutes_seconds(f64::NAN), "00:00");
        assert_eq!(seconds_to_minutes_seconds(-3.0), "00:00");
        assert_eq!(seconds_to_minutes_seconds(f64::NEG_INFINITY), "00:00");
    }

    fn parse(text: &str) -> (u64, u64) {
        let (m, s) = text.split_once(':').unwrap();
        (m.parse().unwrap(), s.parse().unwrap())
    }

    #[test]
    fn ordering_follows_input() {
        let samples = [0.0, 1.0, 59.0, 60.0, 61.0, 600.0, 3599.0, 5999.0, 6000.0, 7261.0];
        let parsed: Vec<(u64, u64)> = samples
            .iter()
            .map(|s| parse(&seconds_to_minutes_seconds(*s)))
            .collect();
        assert!(parsed.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(parsed[8], (100, 0));
        assert_eq!(parsed[9], (121, 1));
    }
}
