//! Configuration files, and the serde helpers needed to read physical
//! quantities (`"0.5 mm"`, `"30 °"`) from them.
//!
//! TOML has no notion of units, so quantities are written as strings and
//! parsed with `uom`'s `FromStr`. A bare number would be accepted by `uom`'s
//! own `Deserialize` and silently interpreted in the base unit, which is
//! exactly the kind of mistake units are supposed to prevent.

pub mod tracking;

use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

pub fn deserialize_uom<'d, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let text = String::deserialize(deserializer)?;
    text.parse::<T>().map_err(|e| de::Error::custom(format!("`{text}`: {e}")))
}

pub fn deserialize_uom_opt<'d, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Option::<String>::deserialize(deserializer)?
        .map(|text| text.parse::<T>().map_err(|e| de::Error::custom(format!("`{text}`: {e}"))))
        .transpose()
}

pub fn deserialize_uom_3d_opt<'d, D, T>(deserializer: D) -> Result<Option<(T, T, T)>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Option::<(String, String, String)>::deserialize(deserializer)?
        .map(|(x,y,z)| tr_tup_res((x.parse(), y.parse(), z.parse())))
        .transpose()
        .map_err(de::Error::custom)
}

/// Transpose 3-tuple of `Result`
///
/// `Ok` if all elements `Ok`; if any element is an `Err` return the first one.
///
/// # Examples
/// `(Ok(a),  Ok(b),  Ok(c)) -> Ok((a, b, c))`
/// `(Ok(a), Err(b),  Ok(c)) -> Err(b)`
/// `(Ok(a), Err(b), Err(c)) -> Err(b)`
fn tr_tup_res<O, E>((x,y,z): (Result<O, E>, Result<O, E>, Result<O, E>)) -> Result<(O, O, O), E> {
    Ok((x?, y?, z?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Angle, Length};
    use units::{degree, mm, cm};

    fn parse<'d, D: Deserialize<'d>>(input: &'d str) -> D {
        toml::from_str(input).unwrap()
    }

    // uom types are, by default, deserialized from TOML numbers, with the
    // Quantity's base unit being inferred!
    #[test]
    fn toml_uom_without_units() {
        #[derive(Deserialize, Debug)]
        struct X { a: Option<Length> }
        let x: X = parse("a = 2");
        assert_eq!(x.a, Some(mm(2.0))); // NOTE: no `mm` in input
    }
    // ... which is why we go through strings instead

    #[test]
    fn toml_with_units_generic_deserialize() {
        #[derive(Deserialize, Debug)]
        struct X {
            #[serde(deserialize_with = "deserialize_uom")]
            l: Length,
            #[serde(default)]
            #[serde(deserialize_with = "deserialize_uom_opt")]
            a: Option<Angle>,
        }
        let x: X = parse(r#"l = "3 cm""#);
        assert_eq!(x.l, cm(3.0));
        assert_eq!(x.a, None);
        let x: X = parse(r#"
            l = "3 mm"
            a = "45 °"
        "#);
        assert_eq!(x.l, mm(3.0));
        assert_eq!(x.a, Some(degree(45.0)));
    }

    #[test]
    fn unknown_unit_is_an_error() {
        #[derive(Deserialize, Debug)]
        struct X {
            #[serde(deserialize_with = "deserialize_uom")]
            #[allow(unused)]
            l: Length,
        }
        assert!(toml::from_str::<X>(r#"l = "3 parsecs""#).is_err());
        assert!(toml::from_str::<X>(r#"l = 3"#).is_err());
    }

    #[test]
    fn triplets_of_quantities() {
        #[derive(Deserialize, Debug)]
        struct X {
            #[serde(default)]
            #[serde(deserialize_with = "deserialize_uom_3d_opt")]
            size: Option<(Length, Length, Length)>,
        }
        let x: X = parse(r#"size = ["1 mm", "2 mm", "0.3 cm"]"#);
        assert_eq!(x.size, Some((mm(1.0), mm(2.0), cm(0.3))));
        let x: X = parse("");
        assert_eq!(x.size, None);
    }
}
