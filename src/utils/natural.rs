//! Natural, numeric-aware string ordering
//!
//! Digit runs compare by numeric value, everything else compares
//! byte-wise, so `50_50_R_0` sorts before `100_100_R_0`.

use std::cmp::Ordering;

/// A maximal run of either digits or non-digits
#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> impl Iterator<Item = Chunk<'_>> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let is_digit = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != is_digit)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(if is_digit {
            Chunk::Digits(head)
        } else {
            Chunk::Text(head)
        })
    })
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        // equal value: fewer leading zeros first
        .then_with(|| a.len().cmp(&b.len()))
}

/// Compare two strings in natural order
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);

    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(Chunk::Digits(x)), Some(Chunk::Digits(y))) => cmp_digits(x, y),
            (Some(Chunk::Text(x)), Some(Chunk::Text(y))) => x.cmp(y),
            (Some(Chunk::Digits(_)), Some(Chunk::Text(_))) => Ordering::Less,
            (Some(Chunk::Text(_)), Some(Chunk::Digits(_))) => Ordering::Greater,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

/// Sort in place in natural order
pub fn natural_sort<T: AsRef<str>>(items: &mut [T]) {
    natural_sort_by_key(items, |item| item.as_ref().to_string());
}

/// Sort in place by the natural order of a derived name
pub fn natural_sort_by_key<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> String,
{
    items.sort_by_cached_key(|item| NaturalKey(key(item)));
}

#[derive(PartialEq, Eq)]
struct NaturalKey(String);

impl Ord for NaturalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0)
    }
}

impl PartialOrd for NaturalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
