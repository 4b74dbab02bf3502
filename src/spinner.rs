use std::time::{SystemTime, UNIX_EPOCH};

const SPINNER_GLYPHS: [&str; 4] = ["[▓░░]", "[░▓░]", "[░░▓]", "[░▓░]"];

/// Seconds since the unix epoch, as fed to [spinner] and [ellipsis].
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// The project spinner frame for time `now`. Four one-second phases bouncing
/// the filled cell left to right and back.
pub fn spinner(now: f64) -> &'static str {
    SPINNER_GLYPHS[phase(now, 4)]
}

/// Zero to two dots padded to two cells, shown after the input prompt.
pub fn ellipsis(now: f64) -> String {
    let dots = phase(now, 3);
    format!("{}{}", ".".repeat(dots), " ".repeat(2 - dots))
}

fn phase(now: f64, cycle: i64) -> usize {
    (now.floor() as i64).rem_euclid(cycle) as usize
}

#[cfg(test)]
mod test {
    use super::{ellipsis, spinner};

    #[test]
    fn spinner_bounces() {
        let frames: Vec<_> = (0..8).map(|s| spinner(s as f64 + 0.5)).collect();
        assert_eq!(
            frames,
            vec![
                "[▓░░]", "[░▓░]", "[░░▓]", "[░▓░]", "[▓░░]", "[░▓░]", "[░░▓]", "[░▓░]"
            ]
        );
    }

    #[test]
    fn spinner_uses_whole_seconds() {
        assert_eq!(spinner(1_700_000_002.0), spinner(1_700_000_002.999));
        assert_eq!(spinner(1_700_000_002.0), "[░░▓]");
    }

    #[test]
    fn ellipsis_cycles_in_three() {
        assert_eq!(ellipsis(0.2), "  ");
        assert_eq!(ellipsis(1.2), ". ");
        assert_eq!(ellipsis(2.2), "..");
        assert_eq!(ellipsis(3.2), "  ");
    }
}
