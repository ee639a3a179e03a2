//! Destinations and string converters for bound values.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::str::FromStr;

/// A shared destination for values read from a document.
///
/// The host keeps one handle and gives clones to the schema tree; both see
/// the same value.
pub struct Slot<T>(Rc<RefCell<T>>);

impl<T> Slot<T> {
    pub fn new(value: T) -> Self {
        Slot(Rc::new(RefCell::new(value)))
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }
}

impl<T: Clone> Slot<T> {
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T: Clone> Slot<Vec<T>> {
    /// The most recent element of a list destination.
    pub fn current(&self) -> Option<T> {
        self.0.borrow().last().cloned()
    }
}

impl<T: Default> Slot<T> {
    pub fn take(&self) -> T {
        self.0.take()
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Slot(Rc::clone(&self.0))
    }
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Slot::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&*self.0.borrow()).finish()
    }
}

/// Conversion between document text and a typed value.
pub trait Convert {
    type Output;

    /// Convert text to a value. The error is a human-readable reason.
    fn parse(&self, text: &str) -> Result<Self::Output, String>;

    /// Convert a value back to text that [`Convert::parse`] accepts.
    fn format(&self, value: &Self::Output) -> String;

    /// Value of an occurrence that carried no content.
    fn default_value(&self) -> Self::Output;
}

/// Converter for any type with `FromStr` and `Display`. Input is trimmed.
pub struct Parsed<T>(PhantomData<fn() -> T>);

impl<T> Parsed<T> {
    pub fn new() -> Self {
        Parsed(PhantomData)
    }
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Parsed<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Parsed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parsed<{}>", std::any::type_name::<T>())
    }
}

impl<T> Convert for Parsed<T>
where
    T: FromStr + fmt::Display + Default,
    T::Err: fmt::Display,
{
    type Output = T;

    fn parse(&self, text: &str) -> Result<T, String> {
        let text = text.trim();
        text.parse()
            .map_err(|e| format!("'{text}' is not a valid {}: {e}", short_type_name::<T>()))
    }

    fn format(&self, value: &T) -> String {
        value.to_string()
    }

    fn default_value(&self) -> T {
        T::default()
    }
}

fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

/// Keeps text exactly as read.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl Convert for Verbatim {
    type Output = String;

    fn parse(&self, text: &str) -> Result<String, String> {
        Ok(text.to_string())
    }

    fn format(&self, value: &String) -> String {
        value.clone()
    }

    fn default_value(&self) -> String {
        String::new()
    }
}

/// A fixed table of tokens and the values they stand for.
///
/// Lookup trims the input. An empty token selects the default entry when
/// there is one; any other unknown token is an error naming the accepted
/// tokens. Formatting picks the first token mapped to a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Map<T> {
    entries: Vec<(String, T)>,
    default: Option<T>,
}

impl<T> Map<T> {
    pub fn new() -> Self {
        Map {
            entries: Vec::new(),
            default: None,
        }
    }

    pub fn entry(mut self, token: impl Into<String>, value: T) -> Self {
        self.entries.push((token.into(), value));
        self
    }

    /// Value used for empty content.
    pub fn default_entry(mut self, value: T) -> Self {
        self.default = Some(value);
        self
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(token, _)| token.as_str())
    }

    pub fn get(&self, token: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(key, _)| key == token)
            .map(|(_, value)| value)
    }
}

impl<T> Default for Map<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl Map<bool> {
    /// `on`/`off`, `yes`/`no`, `true`/`false`; empty means `false`.
    pub fn bool() -> Self {
        Map::new()
            .entry("on", true)
            .entry("off", false)
            .entry("yes", true)
            .entry("no", false)
            .entry("true", true)
            .entry("false", false)
            .default_entry(false)
    }
}

impl<T: Clone + PartialEq + Default> Convert for Map<T> {
    type Output = T;

    fn parse(&self, text: &str) -> Result<T, String> {
        let token = text.trim();
        if let Some(value) = self.get(token) {
            return Ok(value.clone());
        }
        match &self.default {
            Some(value) if token.is_empty() => Ok(value.clone()),
            _ => Err(format!(
                "unknown token '{token}', expected one of: {}",
                self.tokens().collect::<Vec<_>>().join(", ")
            )),
        }
    }

    fn format(&self, value: &T) -> String {
        self.entries
            .iter()
            .find(|(_, v)| v == value)
            .map(|(token, _)| token.clone())
            .unwrap_or_default()
    }

    fn default_value(&self) -> T {
        self.default.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_share_their_value() {
        let slot = Slot::new(1);
        let other = slot.clone();
        other.set(5);
        assert_eq!(slot.get(), 5);
        assert_eq!(slot.replace(7), 5);
        assert_eq!(other.get(), 7);
    }

    #[test]
    fn list_slots_expose_the_last_element() {
        let slot = Slot::new(Vec::<i64>::new());
        assert_eq!(slot.current(), None);
        slot.borrow_mut().extend([1, 2]);
        assert_eq!(slot.current(), Some(2));
    }

    #[test]
    fn parsed_trims_and_reports_the_type() {
        let ints = Parsed::<i64>::new();
        assert_eq!(ints.parse(" 42 "), Ok(42));
        let error = ints.parse("4x").unwrap_err();
        assert!(error.starts_with("'4x' is not a valid i64"), "{error}");
        assert_eq!(Parsed::<f64>::new().format(&4.2), "4.2");
    }

    #[test]
    fn verbatim_keeps_whitespace() {
        assert_eq!(Verbatim.parse(" a b "), Ok(" a b ".to_string()));
    }

    #[test]
    fn bool_map() {
        let map = Map::bool();
        assert_eq!(map.parse("on"), Ok(true));
        assert_eq!(map.parse(" no"), Ok(false));
        assert_eq!(map.parse(""), Ok(false));
        assert_eq!(map.format(&true), "on");
        assert_eq!(map.format(&false), "off");
        assert_eq!(
            map.parse("maybe").unwrap_err(),
            "unknown token 'maybe', expected one of: on, off, yes, no, true, false"
        );
    }

    #[test]
    fn map_without_default_rejects_empty_tokens() {
        let map = Map::new().entry("low", 1).entry("high", 9);
        assert!(map.parse("").is_err());
        assert_eq!(map.parse("high"), Ok(9));
        assert_eq!(map.default_value(), 0);
        assert_eq!(map.format(&5), "");
    }
}
