//! Coordinate text parsing, formatting and range validation.
//!
//! The accepted text form is `DD.DDDD[N|S] DDD.DDDD[E|W]`: a latitude with one
//! or two integer digits, a longitude with one to three, each with an
//! optional fraction of up to six digits. Southern and western hemispheres
//! negate the value.

use std::iter::Peekable;
use std::ops::RangeInclusive;
use std::str::Chars;

use herbarium_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Accepted latitude range in decimal degrees.
pub const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;

/// Accepted longitude range in decimal degrees.
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// Plausible elevation range in metres.
pub const ELEVATION_RANGE: RangeInclusive<f64> = -500.0..=9000.0;

const MAX_FRACTION_DIGITS: usize = 6;

/// Parses coordinate text into `(latitude, longitude)`.
///
/// Returns `None` for anything that does not match the accepted form. Range
/// checks are left to [`Coordinate::new`].
#[must_use]
pub fn parse_coordinates(text: &str) -> Option<(f64, f64)> {
    let mut scanner = Scanner::new(text);

    scanner.skip_whitespace();
    let latitude = scanner.degrees(2)?;
    scanner.skip_whitespace();
    let latitude = latitude * scanner.hemisphere('N', 'S')?;

    if scanner.skip_whitespace() == 0 {
        return None;
    }

    let longitude = scanner.degrees(3)?;
    scanner.skip_whitespace();
    let longitude = longitude * scanner.hemisphere('E', 'W')?;
    scanner.skip_whitespace();

    scanner.is_exhausted().then_some((latitude, longitude))
}

/// Formats decimal degrees as `"{|lat|:.4}{N|S} {|lon|:.4}{E|W}"`.
#[must_use]
pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
    let north_south = if latitude.is_sign_negative() { 'S' } else { 'N' };
    let east_west = if longitude.is_sign_negative() { 'W' } else { 'E' };

    format!(
        "{:.4}{north_south} {:.4}{east_west}",
        latitude.abs(),
        longitude.abs()
    )
}

struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn skip_whitespace(&mut self) -> usize {
        let mut skipped = 0;
        while self.chars.next_if(|value| value.is_whitespace()).is_some() {
            skipped += 1;
        }
        skipped
    }

    fn digits(&mut self) -> String {
        let mut digits = String::new();
        while let Some(digit) = self.chars.next_if(char::is_ascii_digit) {
            digits.push(digit);
        }
        digits
    }

    fn degrees(&mut self, max_integer_digits: usize) -> Option<f64> {
        let mut number = self.digits();
        if number.is_empty() || number.len() > max_integer_digits {
            return None;
        }

        if self.chars.next_if_eq(&'.').is_some() {
            let fraction = self.digits();
            if fraction.is_empty() || fraction.len() > MAX_FRACTION_DIGITS {
                return None;
            }
            number.push('.');
            number.push_str(&fraction);
        }

        number.parse().ok()
    }

    fn hemisphere(&mut self, positive: char, negative: char) -> Option<f64> {
        let letter = self.chars.next()?.to_ascii_uppercase();
        if letter == positive {
            Some(1.0)
        } else if letter == negative {
            Some(-1.0)
        } else {
            None
        }
    }

    fn is_exhausted(&mut self) -> bool {
        self.chars.peek().is_none()
    }
}

/// Validated geographic position of a collection site or reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
    elevation: Option<f64>,
    utm: Option<String>,
    description: Option<String>,
}

impl Coordinate {
    /// Creates a coordinate, rejecting out-of-range values.
    pub fn new(latitude: f64, longitude: f64, elevation: Option<f64>) -> AppResult<Self> {
        if !LATITUDE_RANGE.contains(&latitude) {
            return Err(AppError::Validation(format!(
                "latitude {latitude} must be between -90 and 90"
            )));
        }

        if !LONGITUDE_RANGE.contains(&longitude) {
            return Err(AppError::Validation(format!(
                "longitude {longitude} must be between -180 and 180"
            )));
        }

        if let Some(elevation) = elevation
            && !ELEVATION_RANGE.contains(&elevation)
        {
            return Err(AppError::Validation(format!(
                "elevation {elevation} m must be between -500 and 9000"
            )));
        }

        Ok(Self {
            latitude,
            longitude,
            elevation,
            utm: None,
            description: None,
        })
    }

    /// Attaches the optional UTM text and free description.
    #[must_use]
    pub fn with_details(mut self, utm: Option<String>, description: Option<String>) -> Self {
        self.utm = utm.filter(|value| !value.trim().is_empty());
        self.description = description.filter(|value| !value.trim().is_empty());
        self
    }

    /// Returns the latitude in decimal degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Returns the longitude in decimal degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Returns the elevation in metres.
    #[must_use]
    pub fn elevation(&self) -> Option<f64> {
        self.elevation
    }

    /// Returns the UTM text, if recorded.
    #[must_use]
    pub fn utm(&self) -> Option<&str> {
        self.utm.as_deref()
    }

    /// Returns the free description, if recorded.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Text form derived from the decimal values.
    #[must_use]
    pub fn text(&self) -> String {
        format_coordinates(self.latitude, self.longitude)
    }

    /// Whether both values are exactly zero, the parse-failure fallback.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// Map link, available once both values are non-zero.
    #[must_use]
    pub fn maps_url(&self) -> Option<String> {
        (self.latitude != 0.0 && self.longitude != 0.0).then(|| {
            format!(
                "https://www.google.com/maps?q={},{}",
                self.latitude, self.longitude
            )
        })
    }
}

/// Raw coordinate fields submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateInput {
    /// Text form, takes precedence over the decimal fields.
    pub text: Option<String>,
    /// Decimal latitude.
    pub latitude: Option<f64>,
    /// Decimal longitude.
    pub longitude: Option<f64>,
    /// Elevation in metres.
    pub elevation: Option<f64>,
    /// UTM text.
    pub utm: Option<String>,
    /// Free description.
    pub description: Option<String>,
}

impl CoordinateInput {
    /// Whether no coordinate field was supplied at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.elevation.is_none()
            && self.utm.is_none()
            && self.description.is_none()
    }

    /// Resolves the submitted fields into a validated coordinate.
    ///
    /// Non-blank text is parsed and wins over the decimal fields. Text that
    /// does not parse zeroes both values instead of keeping stale ones.
    pub fn resolve(self) -> AppResult<Option<Coordinate>> {
        if self.is_empty() {
            return Ok(None);
        }

        let (latitude, longitude) = match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => parse_coordinates(text).unwrap_or((0.0, 0.0)),
            _ => (
                self.latitude.unwrap_or_default(),
                self.longitude.unwrap_or_default(),
            ),
        };

        Coordinate::new(latitude, longitude, self.elevation)
            .map(|coordinate| Some(coordinate.with_details(self.utm, self.description)))
    }
}
