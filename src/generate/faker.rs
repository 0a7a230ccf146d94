//! Per-column value generation.
//!
//! Dispatches on the classified column type. Text columns draw from the
//! `fake` crate, using the column name as a hint where one applies
//! (`email`, `city`, `first_name`, ...) and lorem words otherwise.

use super::value::Value;
use crate::error::{Error, Result};
use crate::schema::{Column, ColumnType};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use fake::faker::address::en::{CityName, CountryName, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::Rng;

const SMALLINT_MAX: i64 = 32_000;
const INT_MAX: i64 = 1_000_000;
const BIGINT_MAX: i64 = 9_000_000_000;

const DEFAULT_VARCHAR_LENGTH: u32 = 32;
const MAX_TEXT_LENGTH: u32 = 255;
const DEFAULT_DECIMAL_PRECISION: u32 = 10;
/// Digits beyond this do not fit the u64 arithmetic used for decimals
const MAX_DECIMAL_DIGITS: u32 = 18;

const FLOAT_MAX: f64 = 1_000_000.0;
const DATE_SPAN_DAYS: u64 = 80 * 365;

/// Random value source for individual columns
pub struct ValueGenerator<R: Rng> {
    rng: R,
    reference_date: NaiveDate,
    null_rate: f64,
}

impl<R: Rng> ValueGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            reference_date: Utc::now().date_naive(),
            null_rate: 0.0,
        }
    }

    /// Dates are generated in the 80 years up to this day
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    /// Probability of NULL for nullable plain columns; clamped to `0.0..=1.0`
    pub fn with_null_rate(mut self, rate: f64) -> Self {
        self.null_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Generate one value for `column` of `table`.
    pub fn generate(&mut self, table: &str, column: &Column) -> Result<Value> {
        if column.nullable
            && !column.is_key()
            && !matches!(column.col_type, ColumnType::Other(_))
            && self.null_rate > 0.0
            && self.rng.random_bool(self.null_rate)
        {
            return Ok(Value::Null);
        }

        let value = match &column.col_type {
            ColumnType::SmallInt => Value::Int(self.integer(SMALLINT_MAX, column.length)),
            ColumnType::Int => Value::Int(self.integer(INT_MAX, column.length)),
            ColumnType::BigInt => Value::Int(self.integer(BIGINT_MAX, column.length)),
            ColumnType::Decimal => Value::Decimal(self.decimal(column.length, column.scale)),
            ColumnType::Float => {
                let n = self.rng.random_range(0.0..FLOAT_MAX);
                Value::Float((n * 100.0).round() / 100.0)
            }
            ColumnType::Bool => Value::Bool(self.rng.random_bool(0.5)),
            ColumnType::Uuid => Value::Text(self.uuid()),
            ColumnType::VarChar => {
                let max = column
                    .length
                    .unwrap_or(DEFAULT_VARCHAR_LENGTH)
                    .clamp(1, MAX_TEXT_LENGTH) as usize;
                Value::Text(self.varchar(&column.name, max))
            }
            ColumnType::Char => {
                let len = column.length.unwrap_or(1).clamp(1, MAX_TEXT_LENGTH) as usize;
                Value::Text(self.lorem_exact(len))
            }
            ColumnType::Text => Value::Text(self.paragraph()),
            ColumnType::Json => Value::Text(self.json_object()),
            ColumnType::Date => Value::Date(self.date()),
            ColumnType::DateTime => Value::DateTime(NaiveDateTime::new(self.date(), self.time())),
            ColumnType::Time => Value::Time(self.time()),
            ColumnType::Other(declared) => {
                return Err(Error::UnsupportedType {
                    table: table.to_string(),
                    column: column.name.clone(),
                    declared: declared.clone(),
                })
            }
        };
        Ok(value)
    }

    /// Integer in `0..=default_max`, narrowed to `length` digits when declared
    fn integer(&mut self, default_max: i64, length: Option<u32>) -> i64 {
        let max = match length {
            Some(digits) if digits < 18 => default_max.min(10i64.pow(digits) - 1),
            _ => default_max,
        };
        self.rng.random_range(0..=max)
    }

    fn decimal(&mut self, precision: Option<u32>, scale: Option<u32>) -> String {
        let precision = precision
            .unwrap_or(DEFAULT_DECIMAL_PRECISION)
            .clamp(1, MAX_DECIMAL_DIGITS);
        let scale = scale.unwrap_or(0).min(precision);
        let whole_digits = precision - scale;

        let whole = if whole_digits > 0 {
            self.rng.random_range(0..10u64.pow(whole_digits))
        } else {
            0
        };
        if scale == 0 {
            return whole.to_string();
        }
        let frac = self.rng.random_range(0..10u64.pow(scale));
        format!("{}.{:0width$}", whole, frac, width = scale as usize)
    }

    fn uuid(&mut self) -> String {
        let a: u32 = self.rng.random();
        let b: u16 = self.rng.random();
        let c: u16 = (self.rng.random::<u16>() & 0x0fff) | 0x4000;
        let d: u16 = (self.rng.random::<u16>() & 0x3fff) | 0x8000;
        let e: u64 = self.rng.random::<u64>() & 0xffff_ffff_ffff;
        format!("{:08x}-{:04x}-{:04x}-{:04x}-{:012x}", a, b, c, d, e)
    }

    /// Text of `1..=max` characters, preferring a name-hinted value that fits
    fn varchar(&mut self, column_name: &str, max: usize) -> String {
        if let Some(hinted) = self.hinted(column_name) {
            if hinted.chars().count() <= max {
                return hinted;
            }
        }
        let len = self.rng.random_range(1..=max);
        self.lorem_exact(len)
    }

    fn hinted(&mut self, column_name: &str) -> Option<String> {
        let name = column_name.to_lowercase();
        let rng = &mut self.rng;

        let value: String = if name.contains("email") {
            SafeEmail().fake_with_rng(rng)
        } else if name.contains("first_name") || name == "firstname" {
            FirstName().fake_with_rng(rng)
        } else if name.contains("last_name") || name == "lastname" || name == "surname" {
            LastName().fake_with_rng(rng)
        } else if name.contains("username") || name == "login" {
            Username().fake_with_rng(rng)
        } else if name.contains("company") {
            CompanyName().fake_with_rng(rng)
        } else if name.contains("city") {
            CityName().fake_with_rng(rng)
        } else if name.contains("country") {
            CountryName().fake_with_rng(rng)
        } else if name == "name" || name.ends_with("_name") {
            Name().fake_with_rng(rng)
        } else if name.contains("street") || name.contains("address") {
            StreetName().fake_with_rng(rng)
        } else if name.contains("zip") || name.contains("postal") {
            ZipCode().fake_with_rng(rng)
        } else if name.contains("phone") {
            PhoneNumber().fake_with_rng(rng)
        } else {
            return None;
        };
        Some(value)
    }

    /// Lorem words cut or padded to exactly `len` characters
    fn lorem_exact(&mut self, len: usize) -> String {
        let mut text = String::with_capacity(len + 16);
        let mut count = 0;
        while count < len {
            if count > 0 {
                text.push(' ');
                count += 1;
            }
            let word: String = Word().fake_with_rng(&mut self.rng);
            count += word.chars().count();
            text.push_str(&word);
        }

        let mut out: String = text.chars().take(len).collect();
        if out.ends_with(' ') {
            out.pop();
            out.push(self.rng.random_range(b'a'..=b'z') as char);
        }
        capitalize(&out)
    }

    fn paragraph(&mut self) -> String {
        let first: String = Sentence(4..10).fake_with_rng(&mut self.rng);
        let second: String = Sentence(4..10).fake_with_rng(&mut self.rng);
        format!("{} {}", first, second)
    }

    fn json_object(&mut self) -> String {
        let word: String = Word().fake_with_rng(&mut self.rng);
        let score: u32 = self.rng.random_range(0..1000);
        serde_json::json!({
            "label": word,
            "score": score,
            "active": self.rng.random_bool(0.5),
        })
        .to_string()
    }

    fn date(&mut self) -> NaiveDate {
        let days_back = self.rng.random_range(0..=DATE_SPAN_DAYS);
        self.reference_date
            .checked_sub_days(Days::new(days_back))
            .unwrap_or(self.reference_date)
    }

    fn time(&mut self) -> NaiveTime {
        NaiveTime::from_hms_opt(
            self.rng.random_range(0..24),
            self.rng.random_range(0..60),
            self.rng.random_range(0..60),
        )
        .unwrap_or_default()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn generator() -> ValueGenerator<ChaCha8Rng> {
        ValueGenerator::new(ChaCha8Rng::seed_from_u64(7))
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    #[test]
    fn test_varchar_respects_length() {
        let mut gen = generator();
        let col = Column::new("code", ColumnType::VarChar).length(5);
        for _ in 0..200 {
            let v = gen.generate("t", &col).unwrap();
            let len = v.as_str().unwrap().chars().count();
            assert!((1..=5).contains(&len), "length {}", len);
        }
    }

    #[test]
    fn test_char_has_exact_length() {
        let mut gen = generator();
        let col = Column::new("code", ColumnType::Char).length(3);
        for _ in 0..100 {
            let v = gen.generate("t", &col).unwrap();
            assert_eq!(v.as_str().unwrap().chars().count(), 3);
        }
    }

    #[test]
    fn test_integer_length_bounds_digits() {
        let mut gen = generator();
        let col = Column::new("n", ColumnType::Int).length(2);
        for _ in 0..200 {
            let n = gen.generate("t", &col).unwrap().as_i64().unwrap();
            assert!((0..=99).contains(&n));
        }
    }

    #[test]
    fn test_decimal_shape() {
        let mut gen = generator();
        let mut col = Column::new("price", ColumnType::Decimal).length(5);
        col.scale = Some(2);
        for _ in 0..100 {
            let v = gen.generate("t", &col).unwrap();
            let s = v.as_str().unwrap();
            let (whole, frac) = s.split_once('.').unwrap();
            assert!(whole.len() <= 3);
            assert_eq!(frac.len(), 2);
        }
    }

    #[test]
    fn test_dates_within_window() {
        let mut gen = generator();
        let col = Column::new("born", ColumnType::Date);
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        for _ in 0..200 {
            match gen.generate("t", &col).unwrap() {
                Value::Date(d) => {
                    assert!(d <= today);
                    assert!((today - d).num_days() <= DATE_SPAN_DAYS as i64);
                }
                other => panic!("expected date, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_null_rate_skips_non_nullable_and_keys() {
        let mut gen = generator().with_null_rate(1.0);
        let nullable = Column::new("note", ColumnType::Text);
        let required = Column::new("title", ColumnType::Text).not_null();
        let key = Column::new("id", ColumnType::Int).primary_key();

        assert!(gen.generate("t", &nullable).unwrap().is_null());
        assert!(!gen.generate("t", &required).unwrap().is_null());
        assert!(!gen.generate("t", &key).unwrap().is_null());
    }

    #[test]
    fn test_unsupported_type() {
        let mut gen = generator();
        let col = Column::new("shape", ColumnType::Other("geometry".to_string()));
        match gen.generate("places", &col) {
            Err(Error::UnsupportedType {
                table,
                column,
                declared,
            }) => {
                assert_eq!(table, "places");
                assert_eq!(column, "shape");
                assert_eq!(declared, "geometry");
            }
            other => panic!("expected UnsupportedType, got {:?}", other),
        }
    }

    #[test]
    fn test_uuid_format() {
        let mut gen = generator();
        let col = Column::new("ref", ColumnType::Uuid);
        let v = gen.generate("t", &col).unwrap();
        let s = v.as_str().unwrap();
        assert_eq!(s.len(), 36);
        assert_eq!(&s[14..15], "4");
    }
}
