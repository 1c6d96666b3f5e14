//! Utility functionality and definitions.

use difference::{Changeset, Difference};
use std::fmt;

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub mod paint;

pub const FILE_EXTENSION: &str = "d";
pub const INTERFACE_FILE_EXTENSION: &str = "di";

pub type Str = std::borrow::Cow<'static, str>;

pub type SmallVec<T, const N: usize> = smallvec::SmallVec<[T; N]>;

#[macro_export]
macro_rules! obtain {
    ($expr:expr, $pat:pat $( if $guard:expr )? => $mapping:expr $(,)?) => {
        match $expr {
            $pat $( if $guard )? => Some($mapping),
            _ => None,
        }
    };
}

pub fn default<T: Default>() -> T {
    T::default()
}

/// Render a line-wise diff between two texts, used by test assertions.
pub fn difference(original: &str, edit: &str, split: &str) -> String {
    use paint::{AnsiColor, ColorExt, Style};

    let same = AnsiColor::BrightWhite.to_bg();
    let added = AnsiColor::Green.on_default();
    let removed = AnsiColor::Red.on_default();
    let added_marker = Style::new().fg_color(Some(AnsiColor::Black.into())).bg_color(Some(AnsiColor::Green.into()));
    let removed_marker = Style::new().fg_color(Some(AnsiColor::Black.into())).bg_color(Some(AnsiColor::Red.into()));

    let mut buffer = String::new();

    // the provided Display implementation for Changesets is unreadable when whitespace differs
    for difference in Changeset::new(original, edit, split).diffs {
        match difference {
            Difference::Same(lines) => {
                for line in lines.lines() {
                    buffer += &format!("{} {line}\n", paint::painted(" ", same));
                }
            }
            Difference::Add(lines) => {
                for line in lines.lines().chain(lines.is_empty().then_some("")) {
                    buffer += &format!(
                        "{} {}\n",
                        paint::painted("+", added_marker),
                        paint::painted(line, added)
                    );
                }
            }
            Difference::Rem(lines) => {
                for line in lines.lines().chain(lines.is_empty().then_some("")) {
                    buffer += &format!(
                        "{} {}\n",
                        paint::painted("-", removed_marker),
                        paint::painted(line, removed)
                    );
                }
            }
        }
    }

    buffer
}

/// Assert that two debug-printable values are equal, printing a colored diff of their
/// pretty-printed forms otherwise.
#[track_caller]
pub fn assert_eq<T: PartialEq + fmt::Debug>(actual: T, expected: T) {
    if actual != expected {
        panic!(
            "the actual output (left) does not match the expected one (right):\n{}",
            difference(&format!("{expected:#?}"), &format!("{actual:#?}"), "\n"),
        );
    }
}

pub trait ListingExt {
    fn list(self, conjunction: Conjunction) -> String;
}

impl<I> ListingExt for I
where
    I: Iterator,
    I::Item: fmt::Display,
{
    fn list(self, conjunction: Conjunction) -> String {
        let mut this = self.peekable();
        let mut first = true;
        let mut result = String::new();

        while let Some(item) = this.next() {
            if !first {
                if this.peek().is_some() {
                    result += ", ";
                } else {
                    result += &format!(" {conjunction} ");
                }
            }

            result += &item.to_string();
            first = false;
        }

        result
    }
}

#[derive(Clone, Copy)]
pub enum Conjunction {
    And,
    Or,
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::And => "and",
            Self::Or => "or",
        })
    }
}

/// Use the singular or the plural form of the given word depending on the given amount.
///
/// # Examples
///
/// ```
/// # use utility::pluralize;
/// assert_eq!(pluralize!(1, "error"), "error");
/// assert_eq!(pluralize!(15, "error"), "errors");
/// assert_eq!(pluralize!(0, "match", "matches"), "matches");
/// ```
#[macro_export]
macro_rules! pluralize {
    ($amount:expr, $singular:expr, $plural:expr $(,)?) => {
        match $amount {
            1 => ::std::borrow::Cow::<'_, str>::from($singular),
            _ => $plural.into(),
        }
    };
    ($amount:expr, $singular:literal $(,)?) => {
        match $amount {
            1 => $singular,
            _ => concat!($singular, "s"),
        }
    };
}

pub trait QuoteExt {
    fn quote(self) -> String;
}

impl<D: fmt::Display> QuoteExt for D {
    fn quote(self) -> String {
        format!("‘{self}’")
    }
}

#[macro_export]
macro_rules! quoted {
    ($code:expr) => {
        concat!("‘", $code, "’")
    };
}

/// Create a value implementing [`Display`](fmt::Display) from a formatting closure.
pub fn displayed<F>(formatter: F) -> impl fmt::Display
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    struct Formatted<F>(F);

    impl<F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result> fmt::Display for Formatted<F> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            (self.0)(f)
        }
    }

    Formatted(formatter)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn listing_no_elements() {
        assert_eq!(std::iter::empty::<u8>().list(Conjunction::And), "");
    }

    #[test]
    fn listing_one_element() {
        assert_eq!(std::iter::once(1).list(Conjunction::Or), "1");
    }

    #[test]
    fn listing_two_elements() {
        assert_eq!(
            ["int", "uint"].into_iter().list(Conjunction::And),
            "int and uint"
        );
    }

    #[test]
    fn listing_many_elements() {
        assert_eq!(
            ["class", "struct", "union", "interface"].into_iter().list(Conjunction::Or),
            "class, struct, union or interface"
        );
    }

    #[test]
    fn quoting() {
        assert_eq!("foo".quote(), "‘foo’");
        assert_eq!(quoted!("bar"), "‘bar’");
    }

    #[test]
    fn pluralization() {
        assert_eq!(pluralize!(2, "import"), "imports");
        assert_eq!(pluralize!(1, "child", "children"), "child");
    }

    #[test]
    fn identical_texts_have_no_changes() {
        let diff = difference("a\nb", "a\nb", "\n");
        assert!(!diff.contains('+') && !diff.contains('-'));
    }
}
