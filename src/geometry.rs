//! Foundation geometry and range values
//!
//! Points, sizes, rects and ranges in the textual form Foundation uses
//! (`NSStringFromPoint`, `NSRectFromString`, ...): `{x, y}`, `{w, h}`,
//! `{{x, y}, {w, h}}` and `{location, length}`.
//!
//! Parsing is as forgiving as Foundation's: numbers are picked up in order,
//! anything between them is ignored, and missing values read as zero.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Significant digits Foundation prints for a coordinate (`DBL_DIG`)
const SIGNIFICANT_DIGITS: usize = 15;

/// Format like `%.15g`
fn format_coordinate(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }

    let scientific = format!("{:.*e}", SIGNIFICANT_DIGITS - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= SIGNIFICANT_DIGITS as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (SIGNIFICANT_DIGITS as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// Pull out every number of `text`, in order
///
/// Each run of number-like characters contributes its longest valid numeric
/// prefix; the rest of the run is skipped.
fn scan_floats(text: &str) -> Vec<f64> {
    let mut values = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let starts_number = c.is_ascii_digit()
            || ((c == b'-' || c == b'+' || c == b'.')
                && bytes.get(i + 1).is_some_and(|n| n.is_ascii_digit() || *n == b'.'));
        if !starts_number {
            i += 1;
            continue;
        }

        let start = i;
        i += 1;
        while i < bytes.len() {
            let c = bytes[i];
            let exponent_sign = (c == b'-' || c == b'+') && matches!(bytes[i - 1], b'e' | b'E');
            if c.is_ascii_digit() || c == b'.' || c == b'e' || c == b'E' || exponent_sign {
                i += 1;
            } else {
                break;
            }
        }

        let run = &text[start..i];
        if let Some(value) = (1..=run.len()).rev().find_map(|end| run[..end].parse::<f64>().ok()) {
            values.push(value);
        }
    }

    values
}

/// Pull out every unsigned integer of `text`, in order
fn scan_integers(text: &str) -> Vec<usize> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<usize>().unwrap_or(usize::MAX))
        .collect()
}

fn nth_or_zero<T: Copy + Default>(values: &[T], n: usize) -> T {
    values.get(n).copied().unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Parse `{x, y}`
    pub fn from_string(text: &str) -> Self {
        let values = scan_floats(text);
        Self::new(nth_or_zero(&values, 0), nth_or_zero(&values, 1))
    }

    pub fn string_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", format_coordinate(self.x), format_coordinate(self.y))
    }
}

impl FromStr for Point {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Infallible> {
        Ok(Self::from_string(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Parse `{w, h}`
    pub fn from_string(text: &str) -> Self {
        let values = scan_floats(text);
        Self::new(nth_or_zero(&values, 0), nth_or_zero(&values, 1))
    }

    pub fn string_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}, {}}}",
            format_coordinate(self.width),
            format_coordinate(self.height)
        )
    }
}

impl FromStr for Size {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Infallible> {
        Ok(Self::from_string(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Self = Self {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Parse `{{x, y}, {w, h}}`
    pub fn from_string(text: &str) -> Self {
        let values = scan_floats(text);
        Self::new(
            nth_or_zero(&values, 0),
            nth_or_zero(&values, 1),
            nth_or_zero(&values, 2),
            nth_or_zero(&values, 3),
        )
    }

    pub fn string_value(&self) -> String {
        self.to_string()
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x.min(self.origin.x + self.size.width)
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x.max(self.origin.x + self.size.width)
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y.min(self.origin.y + self.size.height)
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y.max(self.origin.y + self.size.height)
    }

    pub fn is_empty(&self) -> bool {
        self.size.width == 0.0 || self.size.height == 0.0
    }

    /// A null rect has an infinite origin
    pub fn is_null(&self) -> bool {
        self.origin.x.is_infinite() || self.origin.y.is_infinite()
    }

    /// Same rect with non-negative width and height
    pub fn standardized(&self) -> Self {
        Self::new(
            self.min_x(),
            self.min_y(),
            self.size.width.abs(),
            self.size.height.abs(),
        )
    }

    /// Smallest rect with integer origin and size that contains this one
    /// (`CGRectIntegral`)
    ///
    /// Null rects come back unchanged; empty rects keep a zero size.
    pub fn integral(&self) -> Self {
        if self.is_null() {
            return *self;
        }
        let rect = self.standardized();
        let x = rect.origin.x.floor();
        let y = rect.origin.y.floor();
        if rect.is_empty() {
            return Self::new(x, y, 0.0, 0.0);
        }
        Self::new(x, y, rect.max_x().ceil() - x, rect.max_y().ceil() - y)
    }

    pub fn make_integral(&mut self) {
        *self = self.integral();
    }

    /// Whether a mouse location falls in the rect (`NSMouseInRect`)
    ///
    /// In a flipped view the top edge is inside and the bottom edge is not;
    /// otherwise the other way round.
    pub fn contains_mouse(&self, point: Point, flipped: bool) -> bool {
        let in_x = point.x >= self.min_x() && point.x < self.max_x();
        let in_y = if flipped {
            point.y >= self.min_y() && point.y < self.max_y()
        } else {
            point.y > self.min_y() && point.y <= self.max_y()
        };
        in_x && in_y
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.origin, self.size)
    }
}

impl FromStr for Rect {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Infallible> {
        Ok(Self::from_string(s))
    }
}

/// A span of indices (`NSRange`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub location: usize,
    pub length: usize,
}

impl Range {
    /// `NSNotFound`
    pub const NOT_FOUND: usize = isize::MAX as usize;

    pub const fn new(location: usize, length: usize) -> Self {
        Self { location, length }
    }

    /// The range returned by searches that found nothing
    pub const fn not_found() -> Self {
        Self::new(Self::NOT_FOUND, 0)
    }

    pub fn is_not_found(&self) -> bool {
        self.location == Self::NOT_FOUND
    }

    /// Parse `{location, length}`
    pub fn from_string(text: &str) -> Self {
        let values = scan_integers(text);
        Self::new(nth_or_zero(&values, 0), nth_or_zero(&values, 1))
    }

    pub fn string_value(&self) -> String {
        self.to_string()
    }

    /// One past the last index
    pub fn max(&self) -> usize {
        self.location.saturating_add(self.length)
    }

    pub fn contains_location(&self, location: usize) -> bool {
        location >= self.location && location - self.location < self.length
    }

    /// Overlap of two ranges; `{0, 0}` when they are disjoint
    ///
    /// Ranges that only touch yield an empty range at the touching index.
    pub fn intersection(&self, other: &Range) -> Range {
        let start = self.location.max(other.location);
        let end = self.max().min(other.max());
        if start > end {
            return Range::new(0, 0);
        }
        Range::new(start, end - start)
    }

    /// Smallest range covering both
    pub fn union(&self, other: &Range) -> Range {
        let start = self.location.min(other.location);
        let end = self.max().max(other.max());
        Range::new(start, end - start)
    }

    pub fn intersect(&mut self, other: &Range) {
        *self = self.intersection(other);
    }

    pub fn form_union(&mut self, other: &Range) {
        *self = self.union(other);
    }

    /// As a std range of indices
    pub fn as_std(&self) -> std::ops::Range<usize> {
        self.location..self.max()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.location, self.length)
    }
}

impl FromStr for Range {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Infallible> {
        Ok(Self::from_string(s))
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end.saturating_sub(range.start))
    }
}
