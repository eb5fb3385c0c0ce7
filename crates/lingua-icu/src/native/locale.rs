//! Locale identifiers and their number symbols

use std::fmt;

use lingua_core::{native_any, NativeObject, NativeTypeInfo};

use super::alloc::Tracked;

/// RTTI of `Locale`
pub static LOCALE: NativeTypeInfo = NativeTypeInfo::root("Locale");

/// Symbols used when formatting numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbols {
    /// Grouping separator
    pub grouping: char,
    /// Decimal separator
    pub decimal: char,
    /// Currency symbol
    pub currency: &'static str,
}

/// A language/country/variant triple
#[derive(Clone)]
pub struct Locale {
    language: String,
    country: String,
    variant: String,
    _tracked: Tracked,
}

impl Locale {
    /// Locale from its parts; language is lowercased, country uppercased
    pub fn new(language: &str, country: &str, variant: &str) -> Self {
        Self {
            language: language.to_ascii_lowercase(),
            country: country.to_ascii_uppercase(),
            variant: variant.to_ascii_uppercase(),
            _tracked: Tracked::new(),
        }
    }

    /// Parse `en_US`, `fr-FR`, `de_DE_PREEURO`
    pub fn from_name(name: &str) -> Self {
        let mut parts = name.split(|c| c == '_' || c == '-');
        let language = parts.next().unwrap_or_default();
        let country = parts.next().unwrap_or_default();
        let variant = parts.collect::<Vec<_>>().join("_");
        Self::new(language, country, &variant)
    }

    /// The process default locale
    pub fn default_locale() -> Self {
        Self::new("en", "US", "")
    }

    /// Language code
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Country code
    pub fn country(&self) -> &str {
        &self.country
    }

    /// Variant code
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Canonical name, `en_US`
    pub fn name(&self) -> String {
        let mut name = self.language.clone();
        if !self.country.is_empty() || !self.variant.is_empty() {
            name.push('_');
            name.push_str(&self.country);
        }
        if !self.variant.is_empty() {
            name.push('_');
            name.push_str(&self.variant);
        }
        name
    }

    /// Number symbols of the locale
    pub fn symbols(&self) -> Symbols {
        let (grouping, decimal) = match self.language.as_str() {
            "de" | "it" | "es" | "nl" => ('.', ','),
            "fr" => (' ', ','),
            _ => (',', '.'),
        };
        let currency = match self.country.as_str() {
            "US" => "$",
            "GB" => "£",
            "JP" => "¥",
            "DE" | "FR" | "IT" | "ES" | "NL" => "€",
            _ => "¤",
        };
        Symbols {
            grouping,
            decimal,
            currency,
        }
    }
}

impl PartialEq for Locale {
    fn eq(&self, other: &Self) -> bool {
        self.language == other.language && self.country == other.country && self.variant == other.variant
    }
}

impl fmt::Debug for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Locale({})", self.name())
    }
}

impl NativeObject for Locale {
    fn type_info(&self) -> &'static NativeTypeInfo {
        &LOCALE
    }

    fn clone_native(&self) -> Option<Box<dyn NativeObject>> {
        Some(Box::new(self.clone()))
    }

    fn native_eq(&self, other: &dyn NativeObject) -> Option<bool> {
        Some(other.downcast_ref::<Locale>().map_or(false, |other| self == other))
    }

    native_any!();
}
