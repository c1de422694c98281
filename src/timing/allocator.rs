/// Split a scene's spoken duration across its segments in proportion to their text length.
///
/// Each segment weighs `max(1, chars)`, so empty texts still get a share and an all-empty list
/// divides `total_secs` equally. The last segment absorbs floating-point residue, which keeps
/// the sum exactly equal to `total_secs`. A non-positive (or NaN) total yields all zeros.
pub fn allocate_durations<S: AsRef<str>>(total_secs: f64, texts: &[S]) -> Vec<f64> {
    if texts.is_empty() {
        return Vec::new();
    }
    if !total_secs.is_finite() || total_secs <= 0.0 {
        return vec![0.0; texts.len()];
    }
    if texts.len() == 1 {
        return vec![total_secs];
    }

    let weights: Vec<f64> = texts
        .iter()
        .map(|t| t.as_ref().chars().count().max(1) as f64)
        .collect();
    let sum: f64 = weights.iter().sum();

    let mut out = Vec::with_capacity(texts.len());
    let mut assigned = 0.0;
    for w in &weights[..weights.len() - 1] {
        let d = total_secs * (w / sum);
        assigned += d;
        out.push(d);
    }
    out.push((total_secs - assigned).max(0.0));
    out
}

#[cfg(test)]
#[path = "../../tests/unit/timing/allocator.rs"]
mod tests;
