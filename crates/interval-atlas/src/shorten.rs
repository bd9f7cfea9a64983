//! Display-code shortening for clinical interval labels.

/// Canonical label → short display code. Matched exactly first, then
/// case-insensitively; unmapped labels pass through unchanged.
const NAME_MAP: &[(&str, &str)] = &[
    ("Heart Rate", "HR"),
    ("Temperature", "Temp"),
    ("Respiratory Rate", "RR"),
    ("O2 saturation pulseoxymetry", "O2"),
    ("O2 saturation", "O2"),
    ("Non Invasive Blood Pressure systolic", "NIBP-Sys"),
    ("Non Invasive Blood Pressure diastolic", "NIBP-Dia"),
    ("Blood Pressure systolic", "BP-Sys"),
    ("Blood Pressure diastolic", "BP-Dia"),
    ("Urine output (Foley)", "UO"),
    ("Chest Tubes Mediastinal", "CT"),
    ("Chest Tubes", "CT"),
    ("Potassium", "K+"),
    ("Sodium", "Na+"),
    ("Creatinine", "Cr"),
    ("Bicarbonate", "HCO3-"),
    ("Total CO2", "CO2"),
    ("Urea Nitrogen", "BUN"),
];

/// Shorten a full interval label to its display code, preserving any
/// trailing bin suffix: `"Heart Rate.3"` → `"HR.3"`. Labels with no mapping
/// are returned as-is.
pub fn shorten_name(full: &str) -> String {
    if full.is_empty() {
        return String::new();
    }

    let (base, suffix) = split_bin_suffix(full);
    let base = base.trim();

    let mapped = NAME_MAP
        .iter()
        .find(|(name, _)| *name == base)
        .or_else(|| {
            NAME_MAP
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(base))
        })
        .map(|(_, short)| *short);

    match mapped {
        Some(short) => format!("{short}{suffix}"),
        None => full.to_string(),
    }
}

/// Split a trailing `.digits` bin suffix off a label. The suffix keeps its
/// leading dot; labels without one split as `(label, "")`.
fn split_bin_suffix(full: &str) -> (&str, &str) {
    if let Some((base, digits)) = full.rsplit_once('.') {
        if !base.is_empty() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return (base, &full[base.len()..]);
        }
    }
    (full, "")
}
