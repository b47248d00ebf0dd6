use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;
use thiserror::Error;

static SINGLE_PAGE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[0-9]+$").expect("valid regex"));
static PAGE_SPAN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^([0-9]+)-([0-9]+)$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Enter the pages you want to delete")]
    EmptyInput,

    #[error("No valid pages to delete were found")]
    NoValidPages,

    #[error("You cannot delete all pages of the document")]
    CannotDeleteAllPages,

    #[error("A page order must be provided")]
    MissingOrder,

    #[error("The page order contains a non-numeric page")]
    NonNumericPage,

    #[error("Page {page} is out of range (1-{total})")]
    PageOutOfRange { page: i64, total: u32 },

    #[error("The page order must list exactly {expected} pages, got {actual}")]
    WrongPageCount { expected: u32, actual: usize },

    #[error("The page order contains duplicate pages")]
    DuplicatePage,

    #[error("No rotations were provided")]
    NoRotationsProvided,

    #[error("Each rotation needs a numeric page and rotation")]
    InvalidRotationEntry,

    #[error("Rotation for page {page} must be a multiple of 90 degrees")]
    RotationNotMultipleOf90 { page: u32 },

    #[error("All rotations cancel out; nothing to rotate")]
    NoEffectiveRotations,
}

/// An inclusive, 1-based page interval with `1 <= start <= end <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// Absolute target rotation for a page, in `{90, 180, 270}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RotationInstruction {
    pub page: u32,
    pub rotation: u32,
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

// Digits-only input can only fail to parse by overflowing.
fn parse_page_number(digits: &str) -> u32 {
    digits.parse::<u32>().unwrap_or(u32::MAX)
}

// `clamp` panics when total is 0, so bound by hand.
fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.max(1).min(total_pages)
}

enum Token {
    Single(u32),
    Span(u32, u32),
}

fn parse_token(token: &str) -> Option<Token> {
    if SINGLE_PAGE.is_match(token) {
        return Some(Token::Single(parse_page_number(token)));
    }
    let caps = PAGE_SPAN.captures(token)?;
    let a = parse_page_number(&caps[1]);
    let b = parse_page_number(&caps[2]);
    Some(if a > b { Token::Span(b, a) } else { Token::Span(a, b) })
}

fn tokens(cleaned: &str) -> impl Iterator<Item = Token> + '_ {
    cleaned
        .split(',')
        .filter(|t| !t.is_empty())
        .filter_map(parse_token)
}

fn one_range_per_page(total_pages: u32) -> Vec<PageRange> {
    (1..=total_pages)
        .map(|p| PageRange { start: p, end: p })
        .collect()
}

/// Parse a split request like "1-3,5,7" into clamped ranges.
///
/// Malformed tokens are dropped rather than rejected. When nothing usable
/// remains, every page becomes its own range.
pub fn parse_ranges(input: &str, total_pages: u32) -> Vec<PageRange> {
    if total_pages == 0 {
        return Vec::new();
    }

    let cleaned = strip_whitespace(input);
    let ranges: Vec<PageRange> = tokens(&cleaned)
        .map(|token| match token {
            Token::Single(n) => {
                let n = clamp_page(n, total_pages);
                PageRange { start: n, end: n }
            }
            Token::Span(a, b) => PageRange {
                start: clamp_page(a, total_pages),
                end: clamp_page(b, total_pages),
            },
        })
        .collect();

    if ranges.is_empty() {
        one_range_per_page(total_pages)
    } else {
        ranges
    }
}

/// Parse the pages selected for deletion into an ascending, deduplicated list.
pub fn parse_pages_to_delete(input: &str, total_pages: u32) -> Result<Vec<u32>, SelectionError> {
    let cleaned = strip_whitespace(input);
    if cleaned.is_empty() {
        return Err(SelectionError::EmptyInput);
    }

    let mut pages = BTreeSet::new();
    if total_pages > 0 {
        for token in tokens(&cleaned) {
            match token {
                Token::Single(n) => {
                    pages.insert(clamp_page(n, total_pages));
                }
                Token::Span(a, b) => {
                    pages.extend(clamp_page(a, total_pages)..=clamp_page(b, total_pages));
                }
            }
        }
    }

    if pages.is_empty() {
        return Err(SelectionError::NoValidPages);
    }
    Ok(pages.into_iter().collect())
}

/// Pages left after removing `deleted`, refusing to empty the document.
pub fn retained_pages(deleted: &[u32], total_pages: u32) -> Result<Vec<u32>, SelectionError> {
    let deleted: HashSet<u32> = deleted.iter().copied().collect();
    if deleted.len() >= total_pages as usize {
        return Err(SelectionError::CannotDeleteAllPages);
    }
    Ok((1..=total_pages).filter(|p| !deleted.contains(p)).collect())
}

/// Numeric coercion for loosely typed JSON input.
///
/// Strings are trimmed (including a byte-order mark); an empty string is 0,
/// and `0x`/`0o`/`0b` prefixes select hex, octal and binary. Arrays, objects
/// and absent values are NaN.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::String(s)) => parse_numeric_string(s),
        Some(Value::Array(_)) | Some(Value::Object(_)) | None => f64::NAN,
    }
}

fn parse_numeric_string(s: &str) -> f64 {
    let s = s.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}');
    if s.is_empty() {
        return 0.0;
    }

    let prefixed = s.get(..2).and_then(|prefix| match prefix {
        "0x" | "0X" => Some(16),
        "0o" | "0O" => Some(8),
        "0b" | "0B" => Some(2),
        _ => None,
    });
    if let Some(radix) = prefixed {
        return parse_radix_digits(&s[2..], radix);
    }

    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        // Rust accepts "inf"/"nan" spellings that are not numbers here.
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

// Accumulate in f64 so long digit strings grow instead of overflowing.
fn parse_radix_digits(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    digits
        .chars()
        .try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix)
                .map(|d| acc * f64::from(radix) + f64::from(d))
        })
        .unwrap_or(f64::NAN)
}

fn page_in_bounds(page: f64, total_pages: u32) -> Result<u32, SelectionError> {
    if page < 1.0 || page > f64::from(total_pages) {
        return Err(SelectionError::PageOutOfRange {
            page: page as i64,
            total: total_pages,
        });
    }
    Ok(page as u32)
}

fn non_empty_array(value: Option<&Value>) -> Option<&Vec<Value>> {
    value
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
}

/// Check that `order` is a permutation of `1..=total_pages`.
///
/// The coerced sequence is returned in the caller's order; nothing is sorted.
pub fn normalize_page_order(
    order: Option<&Value>,
    total_pages: u32,
) -> Result<Vec<u32>, SelectionError> {
    let items = non_empty_array(order).ok_or(SelectionError::MissingOrder)?;

    let coerced: Vec<f64> = items
        .iter()
        .map(|v| coerce_number(Some(v)).floor())
        .collect();
    if coerced.iter().any(|p| !p.is_finite()) {
        return Err(SelectionError::NonNumericPage);
    }

    let pages = coerced
        .into_iter()
        .map(|p| page_in_bounds(p, total_pages))
        .collect::<Result<Vec<u32>, _>>()?;

    if pages.len() != total_pages as usize {
        return Err(SelectionError::WrongPageCount {
            expected: total_pages,
            actual: pages.len(),
        });
    }

    let distinct: HashSet<u32> = pages.iter().copied().collect();
    if distinct.len() < total_pages as usize {
        return Err(SelectionError::DuplicatePage);
    }

    Ok(pages)
}

/// Validate and collapse `{page, rotation}` entries into one absolute
/// rotation per page.
///
/// Later entries for a page overwrite earlier ones. Pages that end at 0
/// degrees are dropped. Output keeps the order in which pages first appear.
pub fn normalize_rotation_instructions(
    rotations: Option<&Value>,
    total_pages: u32,
) -> Result<Vec<RotationInstruction>, SelectionError> {
    let items = non_empty_array(rotations).ok_or(SelectionError::NoRotationsProvided)?;

    let mut folded: Vec<RotationInstruction> = Vec::new();
    let mut slots: HashMap<u32, usize> = HashMap::new();

    for item in items {
        let page = coerce_number(item.get("page")).floor();
        let rotation = coerce_number(item.get("rotation"));
        if !page.is_finite() || !rotation.is_finite() {
            return Err(SelectionError::InvalidRotationEntry);
        }

        let page = page_in_bounds(page, total_pages)?;

        let normalized = ((rotation % 360.0) + 360.0) % 360.0;
        if normalized % 90.0 != 0.0 {
            return Err(SelectionError::RotationNotMultipleOf90 { page });
        }
        let rotation = normalized as u32;

        match slots.get(&page) {
            Some(&slot) => folded[slot].rotation = rotation,
            None => {
                slots.insert(page, folded.len());
                folded.push(RotationInstruction { page, rotation });
            }
        }
    }

    folded.retain(|r| r.rotation != 0);
    if folded.is_empty() {
        return Err(SelectionError::NoEffectiveRotations);
    }
    Ok(folded)
}
