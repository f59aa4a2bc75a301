use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Channel selection: which columns are EEG
// ---------------------------------------------------------------------------

/// Name fragments that mark a column as an EEG channel (matched lowercased).
pub const EEG_KEYWORDS: &[&str] = &["exg", "eeg", "chan", "channel", "ch", "raw", "electrode"];

/// Name fragments of auxiliary sensors that are never EEG.
pub const EXCLUDED_KEYWORDS: &[&str] = &["accel", "gyro"];

/// Cap on how many numeric columns the fallback picks (the Cyton has 8 channels).
pub const MAX_FALLBACK_CHANNELS: usize = 8;

/// Return indices of the columns believed to carry EEG, in column order.
///
/// Columns whose lowercased name contains one of [`EXCLUDED_KEYWORDS`] are
/// never picked by the first three rules:
/// 1. columns whose lowercased name contains one of [`EEG_KEYWORDS`];
/// 2. otherwise numeric columns after the first one, at most
///    [`MAX_FALLBACK_CHANNELS`] (a lone numeric column is kept);
/// 3. otherwise every numeric column.
///
/// Only when all of that is empty are excluded numeric columns returned.
pub fn classify_columns(names: &[String], is_numeric: &[bool]) -> Vec<usize> {
    let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    let excluded = |i: &usize| EXCLUDED_KEYWORDS.iter().any(|k| lowered[*i].contains(k));
    let numeric: Vec<usize> = (0..names.len())
        .filter(|&i| is_numeric.get(i).copied().unwrap_or(false))
        .collect();

    let mut candidates: Vec<usize> = (0..names.len())
        .filter(|&i| EEG_KEYWORDS.iter().any(|k| lowered[i].contains(k)))
        .filter(|i| !excluded(i))
        .collect();

    if candidates.is_empty() {
        let fallback: Vec<usize> = if numeric.len() > 1 {
            numeric.iter().skip(1).take(MAX_FALLBACK_CHANNELS).copied().collect()
        } else {
            numeric.clone()
        };
        candidates = fallback.into_iter().filter(|i| !excluded(i)).collect();
    }

    if candidates.is_empty() {
        candidates = numeric.iter().copied().filter(|i| !excluded(i)).collect();
    }

    if candidates.is_empty() {
        candidates = numeric;
    }

    let mut seen = BTreeSet::new();
    candidates.retain(|i| seen.insert(*i));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keyword_column_is_selected() {
        let cols = names(&["Sample Index", "EEG Channel 3", "Timestamp"]);
        let picked = classify_columns(&cols, &[true, true, true]);
        assert_eq!(picked, vec![1]);
    }

    #[test]
    fn keyword_match_is_case_insensitive_and_ignores_numericness() {
        let cols = names(&["Sample Index", "ExG Channel 0", "electrode_fp1"]);
        let picked = classify_columns(&cols, &[true, false, false]);
        assert_eq!(picked, vec![1, 2]);
    }

    #[test]
    fn accel_and_gyro_are_excluded() {
        let cols = names(&[
            "Sample Index",
            "EXG Channel 0",
            "Accel Channel 0",
            "Gyro X Channel",
        ]);
        let picked = classify_columns(&cols, &[true; 4]);
        assert_eq!(picked, vec![1]);
    }

    #[test]
    fn fallback_skips_first_numeric_and_caps() {
        let mut cols = vec!["index".to_string()];
        cols.extend((0..12).map(|i| format!("v{i}")));
        cols.push("label".to_string());
        let mut numeric = vec![true; 13];
        numeric.push(false);

        let picked = classify_columns(&cols, &numeric);
        assert_eq!(picked, (1..=MAX_FALLBACK_CHANNELS).collect::<Vec<_>>());
    }

    #[test]
    fn fallback_excludes_accel_columns() {
        let cols = names(&["Sample Index", "Accel X", "Fp1", "Fp2", "Accel Y"]);
        let picked = classify_columns(&cols, &[true; 5]);
        assert_eq!(picked, vec![2, 3]);
    }

    #[test]
    fn accel_channel_never_selected_when_other_numeric_columns_exist() {
        let cols = names(&["Sample Index", "Accel Channel 0", "Fz"]);
        let picked = classify_columns(&cols, &[true, true, true]);
        assert!(!picked.contains(&1));
        assert_eq!(picked, vec![2]);
    }

    #[test]
    fn lone_accel_fallback_prefers_other_numeric_columns() {
        let cols = names(&["Sample Index", "Accel Channel 0"]);
        assert_eq!(classify_columns(&cols, &[true, true]), vec![0]);
    }

    #[test]
    fn single_numeric_column_is_kept() {
        let cols = names(&["label", "value"]);
        assert_eq!(classify_columns(&cols, &[false, true]), vec![1]);
    }

    #[test]
    fn everything_excluded_falls_back_to_all_numeric() {
        let cols = names(&["Accel Channel 0", "Accel Channel 1", "note"]);
        let picked = classify_columns(&cols, &[true, true, false]);
        assert_eq!(picked, vec![0, 1]);
    }

    #[test]
    fn nothing_numeric_and_no_keywords_selects_nothing() {
        let cols = names(&["subject", "notes"]);
        assert!(classify_columns(&cols, &[false, false]).is_empty());
        assert!(classify_columns(&[], &[]).is_empty());
    }
}
