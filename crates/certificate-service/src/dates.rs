//! Issue date formatting

use certificate_common::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{Local, Locale, NaiveDate};

/// Formats the date printed on new certificates
#[derive(Debug, Clone)]
pub struct IssueDates {
    format: String,
    locale: Locale,
}

impl IssueDates {
    pub fn new(format: &str, locale: &str) -> Result<Self> {
        let locale = Locale::try_from(locale)
            .map_err(|_| Error::InvalidInput(format!("unknown date locale: {}", locale)))?;

        if StrftimeItems::new_with_locale(format, locale).any(|item| matches!(item, Item::Error)) {
            return Err(Error::InvalidInput(format!("invalid date format: {}", format)));
        }

        Ok(Self {
            format: format.to_string(),
            locale,
        })
    }

    pub fn format(&self, date: NaiveDate) -> String {
        date.format_localized(&self.format, self.locale).to_string()
    }

    /// Today's date in the server's local time zone
    pub fn today(&self) -> String {
        self.format(Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portuguese_long_date() {
        let dates = IssueDates::new("%d de %B de %Y", "pt_BR").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        assert_eq!(dates.format(date), "10 de março de 2025");
    }

    #[test]
    fn test_english_date() {
        let dates = IssueDates::new("%B %d, %Y", "en_US").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        assert_eq!(dates.format(date), "March 10, 2025");
    }

    #[test]
    fn test_unknown_locale_is_rejected() {
        assert!(IssueDates::new("%d/%m/%Y", "xx_YY").is_err());
    }

    #[test]
    fn test_invalid_format_is_rejected() {
        assert!(IssueDates::new("%d de %Q", "pt_BR").is_err());
    }
}
