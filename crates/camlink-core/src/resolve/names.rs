// ── Camera name normalization ──
//
// Frigate names cameras `front_door`; vendor integrations name the same
// device "Front Door Camera" or "front-door". Each spelling produces a
// handful of lookup keys so minor differences still meet.

use indexmap::IndexSet;

const CAMERA_SUFFIXES: [&str; 2] = ["camera", "cam"];

/// Lower-case, collapse runs of spaces/hyphens/underscores into one `_`,
/// and trim leading and trailing `_`.
pub fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.trim().chars() {
        if ch == ' ' || ch == '-' || ch == '_' {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.extend(ch.to_lowercase());
    }
    out
}

/// Remove a trailing `camera` / `cam` word joined by `sep`.
fn strip_suffix(name: &str, sep: char) -> Option<&str> {
    CAMERA_SUFFIXES.iter().find_map(|suffix| {
        let stem = name.strip_suffix(suffix)?.strip_suffix(sep)?;
        (!stem.is_empty()).then_some(stem)
    })
}

/// Every lookup key for `name`, most specific first, deduplicated.
pub fn name_variants(name: &str, strip_camera_suffix: bool) -> Vec<String> {
    let mut variants = spelling_variants(name);
    if strip_camera_suffix {
        variants.extend(stripped_variants(name));
    }
    variants.into_iter().filter(|v| !v.is_empty()).collect()
}

/// Keys that keep the name's own words.
fn spelling_variants(name: &str) -> IndexSet<String> {
    let lower = name.trim().to_lowercase();
    let mut variants = IndexSet::new();
    variants.insert(normalize(name));
    variants.insert(lower.replace(' ', "_"));
    variants.insert(lower.replace('-', "_"));
    variants.insert(lower);
    variants
}

/// Keys with a trailing `camera` / `cam` word removed. Empty when the name
/// has no such suffix.
pub fn stripped_variants(name: &str) -> Vec<String> {
    let lower = name.trim().to_lowercase();
    let full = normalize(name);
    let mut variants: IndexSet<String> = IndexSet::new();
    if let Some(stem) = strip_suffix(&full, '_') {
        variants.insert(stem.to_owned());
    }
    if let Some(stem) = strip_suffix(&lower, ' ') {
        variants.insert(stem.to_owned());
    }
    variants.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_collapses_separators() {
        assert_eq!(normalize("Front Door Camera"), "front_door_camera");
        assert_eq!(normalize("  back -- yard  "), "back_yard");
        assert_eq!(normalize("_garage_"), "garage");
        assert_eq!(normalize("Driveway"), "driveway");
    }

    #[test]
    fn variants_meet_on_stripped_suffix() {
        let variants = name_variants("Front Door Camera", true);
        assert!(variants.contains(&"front_door".to_owned()));
        assert!(variants.contains(&"front door".to_owned()));
        assert!(name_variants("front_door", true).contains(&"front_door".to_owned()));
    }

    #[test]
    fn variants_without_stripping() {
        assert_eq!(
            name_variants("Front-Door Cam", false),
            vec![
                "front_door_cam".to_owned(),
                "front-door_cam".to_owned(),
                "front_door cam".to_owned(),
                "front-door cam".to_owned(),
            ]
        );
    }

    #[test]
    fn stripped_variants_only_cover_suffixed_names() {
        assert_eq!(
            stripped_variants("Front Door Camera"),
            vec!["front_door".to_owned(), "front door".to_owned()]
        );
        assert!(stripped_variants("Front Door").is_empty());
    }

    #[test]
    fn suffix_alone_is_kept() {
        assert_eq!(name_variants("Camera", true), vec!["camera".to_owned()]);
        assert!(name_variants("", true).is_empty());
    }
}
