pub const MASK: &str = "****";

/// Masks a national identity number (NIK) for display: `3201234567890123` -> `3201****0123`.
///
/// Anything shorter than 8 characters is returned unchanged.
pub fn mask_nik(nik: &str) -> String {
    let chars: Vec<char> = nik.chars().collect();
    if chars.len() < 8 {
        return nik.to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, MASK, tail)
}

/// Human-readable wait estimate, e.g. `45 min` or `1 h 05 min`.
pub fn format_wait(minutes: i64) -> String {
    if minutes <= 0 {
        return "now".to_string();
    }
    if minutes < 60 {
        return format!("{} min", minutes);
    }
    format!("{} h {:02} min", minutes / 60, minutes % 60)
}
