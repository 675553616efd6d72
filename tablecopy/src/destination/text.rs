//! Text rendering of Arrow values shared by the CSV and Avro destinations.

use arrow::array::{Array, StringArray, StringBuilder};
use arrow::error::ArrowError;
use arrow::util::display::{ArrayFormatter, FormatOptions};

/// Format of `DATETIME` and `TIMESTAMP` values in text output.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) const TIME_FORMAT: &str = "%H:%M:%S%.f";

pub(crate) fn format_options() -> FormatOptions<'static> {
    FormatOptions::new()
        .with_date_format(Some(DATE_FORMAT))
        .with_datetime_format(Some(TIMESTAMP_FORMAT))
        .with_timestamp_format(Some(TIMESTAMP_FORMAT))
        .with_timestamp_tz_format(Some(TIMESTAMP_FORMAT))
        .with_time_format(Some(TIME_FORMAT))
}

/// Renders every value of `array` as text, keeping nulls as nulls.
///
/// Binary values are rendered as lowercase hex.
pub(crate) fn to_string_array(array: &dyn Array) -> Result<StringArray, ArrowError> {
    let options = format_options();
    let formatter = ArrayFormatter::try_new(array, &options)?;
    let mut builder = StringBuilder::with_capacity(array.len(), array.len() * 8);

    for index in 0..array.len() {
        if array.is_null(index) {
            builder.append_null();
        } else {
            builder.append_value(formatter.value(index).try_to_string()?);
        }
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use arrow::array::{BinaryArray, Int64Array, TimestampMicrosecondArray};
    use tablecopy_mysql::schema::TIMESTAMP_TIMEZONE;

    use super::*;

    #[test]
    fn nulls_stay_null() {
        let array = Int64Array::from(vec![Some(1), None, Some(-3)]);
        let strings = to_string_array(&array).unwrap();

        assert_eq!(strings.value(0), "1");
        assert!(strings.is_null(1));
        assert_eq!(strings.value(2), "-3");
    }

    #[test]
    fn timestamps_use_sql_layout() {
        // 2006-02-15 04:34:33 UTC
        let array =
            TimestampMicrosecondArray::from(vec![1_139_978_073_000_000, 1_139_978_073_250_000])
                .with_timezone(TIMESTAMP_TIMEZONE);
        let strings = to_string_array(&array).unwrap();

        assert_eq!(strings.value(0), "2006-02-15 04:34:33");
        assert_eq!(strings.value(1), "2006-02-15 04:34:33.250");
    }

    #[test]
    fn binary_is_hex() {
        let array = BinaryArray::from(vec![&[0x0a_u8, 0xff][..]]);
        let strings = to_string_array(&array).unwrap();

        assert_eq!(strings.value(0), "0aff");
    }
}
