/// Pick the best candidate URL out of a `srcset` attribute.
///
/// Each comma-separated candidate is `<url> [descriptor]`. The score is the
/// numeric characters of the descriptor parsed as a float, so `800w` scores
/// 800 and `2x` scores 2; density and width units are deliberately not
/// normalized against each other. Unparseable or missing descriptors score
/// zero. The strictly largest score wins and ties keep the earliest
/// candidate.
#[must_use]
pub fn pick_best_from_srcset(srcset: &str) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for candidate in srcset.split(',') {
        let mut parts = candidate.split_whitespace();
        let Some(url) = parts.next() else { continue };
        if url.is_empty() {
            continue;
        }
        let descriptor = parts.next().unwrap_or("");
        let numeric: String = descriptor
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let score: f64 = numeric.parse().unwrap_or(0.0);

        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((url, score)),
        }
    }
    best.map(|(url, _)| url.to_string())
}
