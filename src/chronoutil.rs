use {
    crate::{
        constants::{LONG_DATE_FORMAT, SHORT_DATE_FORMAT},
        EscherError,
    },
    chrono::{DateTime, NaiveDateTime, Utc},
    lazy_static::lazy_static,
    regex::Regex,
};

lazy_static! {
    /// Compact ISO 8601 timestamp, always in UTC: `YYYYMMDD'T'HHMMSS'Z'`.
    static ref LONG_DATE_REGEX: Regex = Regex::new(
        r"(?x)^
        [0-9]{4}
        (?:0[1-9]|1[0-2])
        (?:0[1-9]|[12][0-9]|3[01])
        T
        (?:[01][0-9]|2[0-3])
        [0-5][0-9]
        [0-5][0-9]
        Z$").unwrap();
}

/// Parse a timestamp in the Escher long date format.
pub trait ParseLongDate: Sized {
    /// Parse `s` as `YYYYMMDD'T'HHMMSS'Z'`.
    fn parse_from_long_date(s: &str) -> Result<Self, EscherError>;
}

impl ParseLongDate for DateTime<Utc> {
    fn parse_from_long_date(s: &str) -> Result<Self, EscherError> {
        if !LONG_DATE_REGEX.is_match(s) {
            return Err(EscherError::InvalidDateFormat(s.to_string()));
        }

        // The regex admits impossible dates like 20110231; chrono rejects those.
        NaiveDateTime::parse_from_str(s, LONG_DATE_FORMAT)
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
            .map_err(|_| EscherError::InvalidDateFormat(s.to_string()))
    }
}

/// Format a timestamp as `YYYYMMDD'T'HHMMSS'Z'`.
#[inline(always)]
pub(crate) fn long_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(LONG_DATE_FORMAT).to_string()
}

/// Format a timestamp as `YYYYMMDD`.
#[inline(always)]
pub(crate) fn short_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(SHORT_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use {
        super::{long_date, short_date, ParseLongDate},
        crate::EscherError,
        chrono::{DateTime, NaiveDate, Utc},
    };

    #[test_log::test]
    fn test_format() {
        let ts = DateTime::<Utc>::from_naive_utc_and_offset(
            NaiveDate::from_ymd_opt(2011, 9, 9).unwrap().and_hms_opt(23, 36, 0).unwrap(),
            Utc,
        );
        assert_eq!(long_date(&ts), "20110909T233600Z");
        assert_eq!(short_date(&ts), "20110909");
    }

    #[test_log::test]
    fn test_parse_valid() {
        let ts = DateTime::<Utc>::parse_from_long_date("20110909T233600Z").unwrap();
        assert_eq!(long_date(&ts), "20110909T233600Z");
    }

    #[test_log::test]
    fn test_parse_invalid() {
        for value in [
            "",
            "2011-09-09T23:36:00Z",
            "20110909T233600",
            "20110909T233600+0000",
            " 20110909T233600Z",
            "20110909T243600Z",
            "20110231T000000Z",
            "Fri, 09 Sep 2011 23:36:00 GMT",
        ] {
            match DateTime::<Utc>::parse_from_long_date(value) {
                Err(EscherError::InvalidDateFormat(v)) => assert_eq!(v, value),
                other => panic!("Expected InvalidDateFormat for {:?}; got {:?}", value, other),
            }
        }
    }
}
