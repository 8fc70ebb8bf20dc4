//! Line-oriented normalization and redaction of extracted document text.
//!
//! Cleaning runs in two passes. Every line is first normalized (whitespace collapsed, OCR edge
//! artifacts stripped) and scrubbed of contact details: e-mail addresses, phone numbers and URLs
//! are removed outright rather than replaced with placeholders. Lines that end up too short,
//! match a known header/footer signature, or carry almost no alphanumeric content are then
//! dropped. Dates and numeric lab values are left untouched.
//!
//! The per-line transform is iterated until it reaches a fixed point, which makes
//! [`clean`] idempotent: `clean(&clean(x)) == clean(x)`.

use regex::Regex;
use std::sync::LazyLock;

/// Lines shorter than this many characters are discarded.
pub const MIN_LINE_CHARS: usize = 3;
/// Lines with fewer alphanumeric characters than this are discarded.
pub const MIN_ALPHANUMERIC_CHARS: usize = 2;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| compile(r"\b[\w.-]+@[\w.-]+\.\w{2,4}\b"));
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?:\+?\d{1,3}[ -]?)?\(?\d{3}\)?[ -]?\d{3}[ -]?\d{4}")
});
static URL: LazyLock<Regex> = LazyLock::new(|| compile(r"https?://\S+"));
static BOILERPLATE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)page\s+\d+\s+of\s+\d+",
        r"(?i)printed\s+on",
        r"(?i)electronically\s+signed",
        r"(?i)verified\s+by",
        r"(?i)end\s+of\s+report",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

fn compile(pattern: &str) -> Regex {
    // Patterns are literals in this module; a failure here is a programming error.
    Regex::new(pattern).unwrap_or_else(|error| panic!("invalid cleaning pattern {pattern}: {error}"))
}

/// Normalize, redact and filter raw extracted text.
///
/// Surviving lines keep their original relative order and are joined with `\n`. Empty input
/// (or input with no viable lines) yields an empty string.
pub fn clean(raw: &str) -> String {
    raw.split('\n')
        .map(clean_line)
        .filter(|line| keep_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Apply the per-line transform until the line stops changing.
fn clean_line(line: &str) -> String {
    let mut current = line.to_string();
    loop {
        let next = clean_line_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn clean_line_once(line: &str) -> String {
    let collapsed = collapse_whitespace(line);
    let stripped = strip_edge_artifacts(&collapsed);
    let redacted = redact(stripped);
    collapse_whitespace(&redacted)
}

fn collapse_whitespace(line: &str) -> String {
    WHITESPACE.replace_all(line.trim(), " ").into_owned()
}

/// Remove contact details. Redaction deletes the match; it never inserts a placeholder.
fn redact(line: &str) -> String {
    let without_email = EMAIL.replace_all(line, "");
    let without_phone = PHONE.replace_all(&without_email, "");
    URL.replace_all(&without_phone, "").into_owned()
}

/// Characters that OCR engines emit for table rules, borders and scan noise.
fn is_artifact(c: char) -> bool {
    matches!(c, '|' | '_' | '~' | '`' | '-' | '>' | '<')
}

/// Characters that only count as noise as part of a longer run: on their own they are
/// usually a sign (`-2.1`) or a comparator (`<5`).
fn is_meaningful_alone(c: char) -> bool {
    matches!(c, '-' | '>' | '<')
}

fn strip_edge_artifacts(line: &str) -> &str {
    let leading = line.chars().take_while(|&c| is_artifact(c)).collect::<Vec<_>>();
    let line = if run_is_noise(&leading) {
        let byte_len: usize = leading.iter().map(|c| c.len_utf8()).sum();
        line[byte_len..].trim_start()
    } else {
        line
    };

    let mut trailing = line
        .chars()
        .rev()
        .take_while(|&c| is_artifact(c))
        .collect::<Vec<_>>();
    trailing.reverse();
    if run_is_noise(&trailing) {
        let byte_len: usize = trailing.iter().map(|c| c.len_utf8()).sum();
        line[..line.len() - byte_len].trim_end()
    } else {
        line
    }
}

fn run_is_noise(run: &[char]) -> bool {
    match run {
        [] => false,
        [single] => !is_meaningful_alone(*single),
        _ => true,
    }
}

fn keep_line(line: &str) -> bool {
    if line.chars().count() < MIN_LINE_CHARS {
        return false;
    }
    if is_boilerplate(line) {
        return false;
    }
    line.chars().filter(|c| c.is_alphanumeric()).count() >= MIN_ALPHANUMERIC_CHARS
}

/// Whether the line is a recognised header/footer signature (page counters, print stamps,
/// signature blocks, end-of-report markers).
pub fn is_boilerplate(line: &str) -> bool {
    BOILERPLATE.iter().any(|pattern| pattern.is_match(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn page_counter_is_dropped() {
        assert_eq!(clean("Page 3 of 10"), "");
    }

    #[test]
    fn email_is_redacted_and_value_kept() {
        assert_eq!(
            clean("Hb: 13.2 g/dL (Low) - john@x.com"),
            "Hb: 13.2 g/dL (Low) -"
        );
    }

    #[test]
    fn phone_numbers_and_urls_are_removed() {
        let cleaned = clean("Call +1 555-123-4567 or visit https://lab.example.org/results now");
        assert!(!cleaned.contains("555"));
        assert!(!cleaned.contains("https"));
        assert_eq!(cleaned, "Call or visit now");
    }

    #[test]
    fn boilerplate_lines_are_dropped_case_insensitively() {
        let raw = "Glucose 95 mg/dL\nPRINTED ON 2024-01-03\nElectronically Signed by Dr. A\nVerified By: lab\n*** End of Report ***";
        assert_eq!(clean(raw), "Glucose 95 mg/dL");
    }

    #[test]
    fn ocr_edge_artifacts_are_stripped() {
        assert_eq!(clean("|| Hemoglobin 13.2 g/dL |"), "Hemoglobin 13.2 g/dL");
        assert_eq!(clean("~~~ WBC 6.1 ___"), "WBC 6.1");
        assert_eq!(clean("-----------"), "");
    }

    #[test]
    fn lone_sign_and_comparator_survive() {
        assert_eq!(clean("<5 mg/L CRP"), "<5 mg/L CRP");
        assert_eq!(clean("-2.1 base excess"), "-2.1 base excess");
    }

    #[test]
    fn dates_and_numeric_results_are_preserved() {
        let raw = "Date of birth: 12/04/1980\nCollected 2024-03-15 08:30\nTSH 4.5 mIU/L (0.4-4.0)";
        assert_eq!(clean(raw), raw);
    }

    #[test]
    fn short_and_symbol_only_lines_are_dropped() {
        let raw = "ok\n* * * *\n#1\nSodium 140 mmol/L";
        assert_eq!(clean(raw), "Sodium 140 mmol/L");
    }

    #[test]
    fn whitespace_is_collapsed_and_order_preserved() {
        let raw = "  Patient   Name:\tJane Doe \r\n\n   Potassium  3.1   (Low)  ";
        assert_eq!(clean(raw), "Patient Name: Jane Doe\nPotassium 3.1 (Low)");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("\n\n   \n"), "");
    }

    #[test]
    fn redaction_exposing_new_artifacts_is_stable() {
        let once = clean("Ferritin 12 ng/mL | info@lab.com");
        assert_eq!(once, "Ferritin 12 ng/mL");
        assert_eq!(clean(&once), once);
    }

    proptest! {
        #[test]
        fn clean_is_idempotent(raw in "[ a-zA-Z0-9|_~`<>@.:/()+\\-\\n\\t]{0,200}") {
            let once = clean(&raw);
            prop_assert_eq!(clean(&once), once);
        }

        #[test]
        fn cleaned_lines_meet_minimums(raw in "[ a-zA-Z0-9|_~`<>@.\\-\\n]{0,200}") {
            for line in clean(&raw).split('\n').filter(|line| !line.is_empty()) {
                prop_assert!(line.chars().count() >= MIN_LINE_CHARS);
                prop_assert!(line.chars().filter(|c| c.is_alphanumeric()).count() >= MIN_ALPHANUMERIC_CHARS);
            }
        }

        #[test]
        fn well_formed_emails_never_survive(user in "[a-z]{3,8}", host in "[a-z]{3,8}") {
            let raw = format!("Contact {user}@{host}.com for results");
            let cleaned = clean(&raw);
            let address = format!("{user}@{host}.com");
            prop_assert!(!cleaned.contains(&address));
        }

        #[test]
        fn well_formed_phone_numbers_never_survive(
            country in prop::bool::ANY,
            area in "[2-9][0-9]{2}",
            exchange in "[0-9]{3}",
            subscriber in "[0-9]{4}",
            separator in "[ -]",
        ) {
            let prefix = if country { "+1 " } else { "" };
            let number = format!("{prefix}{area}{separator}{exchange}{separator}{subscriber}");
            let cleaned = clean(&format!("Call {number} for results"));
            prop_assert_eq!(cleaned.as_str(), "Call for results");
        }

        #[test]
        fn urls_never_survive(host in "[a-z]{3,10}", path in "[a-z0-9/_-]{0,20}") {
            let url = format!("https://{host}.org/{path}");
            let cleaned = clean(&format!("Results at {url} today"));
            prop_assert!(!cleaned.contains("https://"));
            prop_assert_eq!(cleaned.as_str(), "Results at today");
        }
    }
}
