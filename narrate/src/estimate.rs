//! Cost and narration length estimates shown before converting.

/// Assumed speaking time per word, in seconds.
const SECONDS_PER_WORD: f64 = 0.4;

/// Estimated price and duration of narrating a text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Price in dollars
    pub cost: f64,
    /// Narration length in seconds
    pub duration_secs: f64,
}

impl Estimate {
    /// Estimate cost from the character count and duration from the word count.
    pub fn for_text(text: &str, rate_per_million: f64) -> Self {
        let char_count = text.chars().count();
        let word_count = text.split_whitespace().count();

        Self {
            cost: (char_count as f64 / 1_000_000.0) * rate_per_million,
            duration_secs: word_count as f64 * SECONDS_PER_WORD,
        }
    }
}

/// Format a price as dollars with two decimals, e.g. `$15.00`.
pub fn format_cost(cost: f64) -> String {
    format!("${:.2}", cost)
}

/// Format seconds as whole minutes and seconds, dropping minutes when zero.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let minutes = total / 60;
    let secs = total % 60;

    if minutes > 0 {
        format!("{} {}", plural(minutes, "minute"), plural(secs, "second"))
    } else {
        plural(secs, "second")
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}
