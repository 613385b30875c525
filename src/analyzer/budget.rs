//! Rule-based budget extraction.
//!
//! Recognizes ranges, upper and lower bounds, approximate amounts and bare
//! amounts in English and Chinese. Anything ambiguous yields `None`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::profile::{Budget, Strictness};

/// Amounts below this are never read as prices ("2 phones", "top 3").
const MIN_PLAUSIBLE_PRICE: f64 = 100.0;

const AMOUNT: &str = r"(?:[$¥￥]\s*)?(\d+(?:\.\d+)?)\s*(k|千|万)?(?:\s*(?:元|块|yuan|rmb|dollars?|bucks))?";

struct Patterns {
    unconstrained: Regex,
    flexible: Regex,
    range: Vec<Regex>,
    under: Vec<Regex>,
    above: Vec<Regex>,
    around: Vec<Regex>,
    amount: Regex,
    spec_unit: Regex,
    range_tail: Regex,
    model_tail: Regex,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern.replace("{A}", AMOUNT)))
        .unwrap_or_else(|e| panic!("invalid budget pattern {}: {}", pattern, e))
}

static PATTERNS: Lazy<Patterns> = Lazy::new(|| Patterns {
    unconstrained: compile(
        r"no budget|no price limit|no limit on (?:the )?price|money is no object|any price|(?:price|budget|cost) (?:doesn'?t|does not) matter|don'?t care about (?:the )?(?:price|cost)|预算不限|不限预算|价格不限|预算无所谓|价格无所谓",
    ),
    flexible: compile(r"flexible|roughly|can stretch|negotiable|give or take|弹性|可以超|浮动"),
    range: vec![
        compile(r"between\s+{A}\s*(?:and|to|-)\s*{A}"),
        compile(r"{A}\s*(?:-|–|~|～|到|至|\bto\b)\s*{A}"),
    ],
    under: vec![
        compile(r"(?:under|below|less than|cheaper than|at most|no more than|not more than|up to|within|max(?:imum)?:?|低于|不超过|不到|少于)\s*{A}"),
        compile(r"{A}\s*(?:以下|以内|之内)"),
    ],
    above: vec![
        compile(r"(?:above|over|more than|at least|min(?:imum)?:?|higher than|高于|至少|不低于|超过)\s*{A}"),
        compile(r"{A}\s*(?:以上|起)"),
    ],
    around: vec![
        compile(r"(?:around|about|roughly|approximately|approx\.?|circa|~|大约|大概|差不多)\s*{A}"),
        compile(r"{A}\s*(?:左右|上下)"),
    ],
    amount: compile(AMOUNT),
    spec_unit: compile(
        r"^\s*(?:gb|tb|g\b|mah|mp\b|megapixels?|inch(?:es)?|hz|w\b|mm|%|fps|寸|英寸|毫安|像素|克)",
    ),
    range_tail: compile(r"^\s*(?:-|–|~|～|到|至|to\b)\s*\d"),
    // "iPhone 15 Pro 256", "Galaxy S23 Ultra 512": a number after a model word names a variant.
    model_tail: compile(
        r"(?:\b(?:pro(?:\s+max)?|ultra|plus|mini|lite|note|iphone|galaxy|pixel|mate|nova|reno)|[a-z]+\d+)\s*$",
    ),
});

/// Letters allowed directly before an amount ("rmb3000", "budget4000").
const MONEY_PREFIXES: &[&str] = &["rmb", "cny", "usd", "budget"];

fn magnitude(suffix: Option<&str>) -> f64 {
    match suffix.map(|s| s.to_ascii_lowercase()) {
        Some(s) if s == "k" || s == "千" => 1_000.0,
        Some(s) if s == "万" => 10_000.0,
        _ => 1.0,
    }
}

/// Reads the amount in capture groups `number` and `number + 1`.
fn amount_at(caps: &Captures<'_>, number: usize) -> Option<(f64, bool)> {
    let raw: f64 = caps.get(number)?.as_str().parse().ok()?;
    let suffix = caps.get(number + 1).map(|m| m.as_str());
    Some((raw * magnitude(suffix), suffix.is_some()))
}

fn followed_by_unit(text: &str, end: usize) -> bool {
    PATTERNS.spec_unit.is_match(&text[end..])
}

/// The number starting at `start` belongs to a model name ("X100", "Mate 60 Pro 512").
fn part_of_model_name(text: &str, start: usize) -> bool {
    let before = &text[..start];
    if let Some(prev) = before.chars().next_back() {
        if prev.is_ascii_digit() || prev == '.' {
            return true;
        }
        if prev.is_ascii_alphabetic() {
            let stem = before.trim_end_matches(|c: char| c.is_ascii_alphabetic());
            let word = before[stem.len()..].to_ascii_lowercase();
            return !MONEY_PREFIXES.contains(&word.as_str());
        }
    }
    PATTERNS.model_tail.is_match(before)
}

fn amount_start_ok(text: &str, caps: &Captures<'_>, number: usize) -> bool {
    caps.get(number).map_or(false, |m| !part_of_model_name(text, m.start()))
}

fn plausible(value: f64) -> bool {
    value.is_finite() && value >= MIN_PLAUSIBLE_PRICE
}

fn find_range(text: &str) -> Option<(f64, f64)> {
    for re in &PATTERNS.range {
        for caps in re.captures_iter(text) {
            let whole = caps.get(0)?;
            if followed_by_unit(text, whole.end())
                || !amount_start_ok(text, &caps, 1)
                || !amount_start_ok(text, &caps, 3)
            {
                continue;
            }
            let (Some((mut a, a_scaled)), Some((b, b_scaled))) = (amount_at(&caps, 1), amount_at(&caps, 3)) else {
                continue;
            };
            // "3-4k" scales both ends.
            if b_scaled && !a_scaled {
                a *= magnitude(caps.get(4).map(|m| m.as_str()));
            }
            if plausible(a) && plausible(b) {
                return Some((a.min(b), a.max(b)));
            }
        }
    }
    None
}

fn find_single(res: &[Regex], text: &str) -> Option<f64> {
    for re in res {
        for caps in re.captures_iter(text) {
            let whole = caps.get(0)?;
            if followed_by_unit(text, whole.end()) || !amount_start_ok(text, &caps, 1) {
                continue;
            }
            if let Some((value, _)) = amount_at(&caps, 1) {
                if plausible(value) {
                    return Some(value);
                }
            }
        }
    }
    None
}

fn find_bare(text: &str) -> Option<f64> {
    let mut found = Vec::new();
    for caps in PATTERNS.amount.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        // Half of a rejected range ("128-256GB") is not a bare amount either.
        if followed_by_unit(text, whole.end())
            || PATTERNS.range_tail.is_match(&text[whole.end()..])
            || !amount_start_ok(text, &caps, 1)
        {
            continue;
        }
        if let Some((value, _)) = amount_at(&caps, 1) {
            if plausible(value) {
                found.push(value);
            }
        }
    }
    // Two competing amounts are ambiguous.
    match found.as_slice() {
        [single] => Some(*single),
        _ => None,
    }
}

/// Extracts a budget from free text. `band` is the half-width used for approximate amounts.
pub fn parse_budget(text: &str, band: f64) -> Option<Budget> {
    let p = &*PATTERNS;

    if p.unconstrained.is_match(text) {
        return Some(Budget::unconstrained());
    }

    let mut budget = if let Some((min, max)) = find_range(text) {
        Budget::between(min, max, Strictness::Strict)
    } else if let Some(max) = find_single(&p.under, text) {
        Budget::at_most(max)
    } else if let Some(min) = find_single(&p.above, text) {
        Budget::at_least(min)
    } else if let Some(target) = find_single(&p.around, text) {
        Budget::around(target, band)
    } else {
        Budget::around(find_bare(text)?, band)
    };

    if budget.strictness == Strictness::Strict && p.flexible.is_match(text) {
        budget.strictness = Strictness::Flexible;
    }
    Some(budget)
}
