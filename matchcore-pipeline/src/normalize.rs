use regex::Regex;
use std::sync::LazyLock;

static PARENTHETICAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^()]*\)\s*$").unwrap());
static INTERNAL_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static FULL_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"20[0-1][0-9]").unwrap());
static SHORT_YEAR_NEAR_GENDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(0[5-9]|1[0-9])\s*[bg]\b|\b[bg]\s*(0[5-9]|1[0-9])\b").unwrap());
static AGE_GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)u-?(\d{1,2})\b").unwrap());
static PRE_NAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)pre-?nal\s*(\d{2})").unwrap());

static GENDER_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(boys?|girls?)\b").unwrap());
static GENDER_LETTER_NEAR_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([bg])\s*\d{1,2}\b|\b\d{1,2}\s*([bg])\b").unwrap());
static GENDER_MF_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b([mf])\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn as_db_str(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Unknown => "unknown",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "M" => Gender::Male,
            "F" => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

/// lowercase, collapse internal whitespace, strip a trailing parenthesized
/// qualifier, strip an immediate duplicated prefix (spec.md §4.3
/// "Normalization"). Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(name: &str) -> String {
    let lower = name.to_lowercase();
    let no_suffix = PARENTHETICAL_SUFFIX.replace(&lower, "");
    let collapsed = INTERNAL_WHITESPACE.replace_all(no_suffix.trim(), " ");
    fix_double_prefix(&collapsed)
}

/// Strip the suffix-qualifier part of normalization only, leaving case and
/// whitespace untouched -- used by resolver strategy 3 (spec.md §4.3
/// "Suffix-stripped canonical").
pub fn strip_parenthetical_suffix(name: &str) -> String {
    PARENTHETICAL_SUFFIX.replace(name, "").trim().to_string()
}

/// Recursively collapse an immediate repeated prefix of up to six words
/// (spec.md §4.3, §8 round-trip law, §8 scenario 4): `"derby united derby
/// united 15b"` -> `"derby united 15b"`.
pub fn fix_double_prefix(name: &str) -> String {
    let words: Vec<&str> = name.split(' ').collect();
    for prefix_len in (1..=6.min(words.len() / 2)).rev() {
        let (first, rest) = words.split_at(prefix_len);
        if rest.len() >= prefix_len && rest[..prefix_len] == *first {
            let collapsed = rest.join(" ");
            return fix_double_prefix(&collapsed);
        }
    }
    name.to_string()
}

/// First full year `20[0-1][0-9]`; else a short year adjacent to a B/G
/// token; else via an age-group token `U-?(\d{1,2})` resolved against
/// `current_season_year` (spec.md §4.3 "Birth-year extraction").
pub fn extract_birth_year(name: &str, current_season_year: i32) -> Option<i32> {
    if let Some(m) = PRE_NAL.captures(name) {
        let age: i32 = m[1].parse().ok()?;
        return Some(current_season_year - age);
    }
    if let Some(m) = FULL_YEAR.find(name) {
        return m.as_str().parse().ok();
    }
    if let Some(m) = SHORT_YEAR_NEAR_GENDER.captures(name) {
        let digits = m.get(1).or_else(|| m.get(2))?.as_str();
        let short: i32 = digits.parse().ok()?;
        return Some(2000 + short);
    }
    if let Some(m) = AGE_GROUP.captures(name) {
        let age: i32 = m[1].parse().ok()?;
        return Some(current_season_year - age);
    }
    None
}

/// `boys|girls`, `(B|G)` adjacent to digits, or a bare `M|F` token (spec.md
/// §4.3 "Gender extraction").
pub fn extract_gender(name: &str) -> Gender {
    if let Some(m) = GENDER_WORD.captures(name) {
        return match m[1].to_lowercase().starts_with('b') {
            true => Gender::Male,
            false => Gender::Female,
        };
    }
    if let Some(m) = GENDER_LETTER_NEAR_DIGIT.captures(name) {
        let letter = m.get(1).or_else(|| m.get(2)).map(|g| g.as_str().to_lowercase());
        return match letter.as_deref() {
            Some("b") => Gender::Male,
            Some("g") => Gender::Female,
            _ => Gender::Unknown,
        };
    }
    if let Some(m) = GENDER_MF_TOKEN.captures(name) {
        return match m[1].to_lowercase().as_str() {
            "m" => Gender::Male,
            "f" => Gender::Female,
            _ => Gender::Unknown,
        };
    }
    Gender::Unknown
}

/// Adapter-facing `parse_division → (gender?, age_group?)` (spec.md §4.1):
/// division strings ("U14 Boys", "14B Gold") carry the same gender/age
/// tokens as team names, so this reuses [`extract_gender`] and
/// [`extract_birth_year`] against the division text rather than a separate
/// grammar. Callers needing an age group in years rather than a birth year
/// should invert it via `current_season_year - birth_year`.
pub fn parse_division(division: &str, current_season_year: i32) -> (Gender, Option<i32>) {
    (extract_gender(division), extract_birth_year(division, current_season_year))
}

/// `format_score(h, a)` (spec.md §8 round-trip law): the wire-level score
/// notation every adapter's raw page text collapses to before staging.
pub fn format_score(home: i32, away: i32) -> String {
    format!("{home}-{away}")
}

/// `parse_score` (spec.md §4.1 adapter parsing callback / §8 round-trip
/// law): splits on `-` or `:`, tolerating surrounding whitespace.
pub fn parse_score(raw: &str) -> Option<(i32, i32)> {
    let trimmed = raw.trim();
    let (home, away) = trimmed.split_once(['-', ':'])?;
    Some((home.trim().parse().ok()?, away.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────────────────
    // normalize / fix_double_prefix
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn normalize_lowercases_and_collapses_whitespace() {
        assert_eq!(normalize("  FC   Blue   2015  "), "fc blue 2015");
    }

    #[test]
    fn normalize_strips_trailing_parenthetical_qualifier() {
        assert_eq!(normalize("Dallas Rush (U11 Boys)"), "dallas rush");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("  Derby United   Derby United 15B  ");
        let twice = normalize(&once);
        assert_eq!(once, twice, "normalize(normalize(x)) must equal normalize(x)");
    }

    #[test]
    fn fix_double_prefix_removes_one_repeat() {
        assert_eq!(
            fix_double_prefix("derby united derby united 15b"),
            "derby united 15b"
        );
    }

    #[test]
    fn fix_double_prefix_is_recursive() {
        assert_eq!(
            fix_double_prefix("kansas rush kansas rush kansas rush pre-ecnl 14b"),
            "kansas rush pre-ecnl 14b"
        );
    }

    #[test]
    fn fix_double_prefix_leaves_non_duplicated_names_alone() {
        assert_eq!(fix_double_prefix("fc blue 2015"), "fc blue 2015");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // extract_birth_year
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn birth_year_full_year_token() {
        assert_eq!(extract_birth_year("fc blue 2015", 2026), Some(2015));
    }

    #[test]
    fn birth_year_age_group_token() {
        assert_eq!(extract_birth_year("dallas rush u14", 2026), Some(2012));
    }

    #[test]
    fn birth_year_pre_nal_token() {
        // spec scenario: "pre-nal 14" resolves like a U14 age-group token,
        // not a literal 2014 short year -- 2026 - 14 = 2012.
        assert_eq!(extract_birth_year("pre-nal 14", 2026), Some(2012));
    }

    #[test]
    fn birth_year_pre_nal_gate_prevents_cross_age_linking() {
        assert_eq!(extract_birth_year("pre-nal 15 gold", 2026), Some(2011));
    }

    #[test]
    fn birth_year_absent_returns_none() {
        assert_eq!(extract_birth_year("fc blue", 2026), None);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // extract_gender
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn gender_from_word_token() {
        assert_eq!(extract_gender("dallas rush boys u14"), Gender::Male);
        assert_eq!(extract_gender("dallas rush girls u14"), Gender::Female);
    }

    #[test]
    fn gender_from_letter_near_digit() {
        assert_eq!(extract_gender("dallas rush 14b"), Gender::Male);
        assert_eq!(extract_gender("dallas rush 14g"), Gender::Female);
    }

    #[test]
    fn gender_db_str_round_trips() {
        assert_eq!(Gender::from_db_str(Gender::Male.as_db_str()), Gender::Male);
        assert_eq!(Gender::from_db_str(Gender::Female.as_db_str()), Gender::Female);
        assert_eq!(Gender::from_db_str("unknown"), Gender::Unknown);
    }

    #[test]
    fn gender_unknown_when_no_token_present() {
        assert_eq!(extract_gender("dallas rush"), Gender::Unknown);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // parse_division / parse_score
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn parse_division_extracts_gender_and_birth_year() {
        assert_eq!(parse_division("U14 Boys", 2026), (Gender::Male, Some(2012)));
        assert_eq!(parse_division("Girls 2013", 2026), (Gender::Female, Some(2013)));
    }

    #[test]
    fn parse_division_unknown_when_no_tokens() {
        assert_eq!(parse_division("Gold Bracket", 2026), (Gender::Unknown, None));
    }

    #[test]
    fn score_round_trips_for_realistic_range() {
        for home in 0..=30 {
            for away in 0..=30 {
                assert_eq!(parse_score(&format_score(home, away)), Some((home, away)));
            }
        }
    }

    #[test]
    fn parse_score_tolerates_colon_and_whitespace() {
        assert_eq!(parse_score(" 2 : 1 "), Some((2, 1)));
    }

    #[test]
    fn parse_score_rejects_garbage() {
        assert_eq!(parse_score("final"), None);
    }
}
