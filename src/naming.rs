//! Identifier casing for generated artifacts.
//!
//! Source identifiers come in whatever style the spreadsheet author used (`user_id`,
//! `item-name`, `userId`). Generated property names need `UpperInitial` form and
//! parameter-like names need `lowerInitial` form.

fn is_separator(c: char) -> bool {
    c == '_' || c == '-'
}

/// Convert `name` to an upper-initial identifier.
///
/// - Without `_`/`-`, the name is assumed to be camel/Pascal-cased already and only its
///   first character is upper-cased.
/// - Otherwise it is split on runs of separators, empty segments are dropped, and each
///   segment is capitalized (first character upper, the rest lower).
///
/// ```
/// use table_exporter::naming::to_upper_initial;
///
/// assert_eq!(to_upper_initial("user_id"), "UserId");
/// assert_eq!(to_upper_initial("userId"), "UserId");
/// ```
pub fn to_upper_initial(name: &str) -> String {
    if !name.contains(is_separator) {
        return map_first_char(name, char::to_uppercase);
    }

    name.split(is_separator)
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect()
}

/// Convert `name` to a lower-initial identifier: [`to_upper_initial`], then the first
/// character is lower-cased.
///
/// ```
/// use table_exporter::naming::to_lower_initial;
///
/// assert_eq!(to_lower_initial("UserName"), "userName");
/// assert_eq!(to_lower_initial("item_price"), "itemPrice");
/// ```
pub fn to_lower_initial(name: &str) -> String {
    map_first_char(&to_upper_initial(name), char::to_lowercase)
}

fn map_first_char<I>(s: &str, f: impl Fn(char) -> I) -> String
where
    I: Iterator<Item = char>,
{
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => f(first).chain(chars).collect(),
        None => String::new(),
    }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
