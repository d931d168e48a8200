use crate::model::*;

/// Sweep line: the largest number of `spans` covering any single instant of
/// `within`. Spans are clipped to `within` first; abutting spans never stack.
pub fn peak_occupancy<'a>(spans: impl IntoIterator<Item = &'a Span>, within: &Span) -> u32 {
    // +1 at start, -1 at end; ends sort before starts at the same instant.
    let mut events: Vec<(Tick, i32)> = Vec::new();
    for s in spans {
        let start = s.start.max(within.start);
        let end = s.end.min(within.end);
        if start < end {
            events.push((start, 1));
            events.push((end, -1));
        }
    }
    events.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut count: i32 = 0;
    let mut peak: i32 = 0;
    for (_, delta) in events {
        count += delta;
        peak = peak.max(count);
    }
    peak as u32
}
