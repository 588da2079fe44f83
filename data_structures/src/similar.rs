use edit_distance::edit_distance;

/// Find the candidate closest to `target`, if any is close enough to be
/// worth suggesting.
pub fn find_similar<'a>(target: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut result = None;
    let mut lowest_distance = usize::MAX;
    for candidate in candidates {
        let distance = edit_distance(target, candidate);
        if distance < lowest_distance {
            lowest_distance = distance;
            result = Some(candidate);
        }
    }
    // Only make a recommendation if the edit distance is low
    if lowest_distance < 3 {
        result
    } else {
        None
    }
}
