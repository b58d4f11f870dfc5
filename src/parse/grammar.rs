use winnow::ascii::{dec_uint, multispace0};
use winnow::combinator::{alt, cut_err, delimited, separated, terminated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{rest, take_while};

use crate::Keystring;

// -- Level specifications ----------------------------------------------------

fn level_separator(input: &mut &str) -> ModalResult<()> {
    take_while(1.., |c: char| c == ',' || c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

fn level_entry(input: &mut &str) -> ModalResult<(u8, u8)> {
    let level = dec_uint::<_, u8, _>
        .context(StrContext::Expected(StrContextValue::Description(
            "level number",
        )))
        .parse_next(input)?;
    cut_err(':').parse_next(input)?;
    let bits = cut_err(dec_uint::<_, u8, _>)
        .context(StrContext::Expected(StrContextValue::Description(
            "resolution bits",
        )))
        .parse_next(input)?;
    Ok((level, bits))
}

/// `0:24, 1:22, 2:20` with commas and/or whitespace between entries.
pub fn level_pairs(input: &mut &str) -> ModalResult<Vec<(u8, u8)>> {
    delimited(
        multispace0,
        separated(1.., level_entry, level_separator),
        (multispace0, take_while(0.., ',').void(), multispace0),
    )
    .parse_next(input)
}

// -- Keystrings --------------------------------------------------------------

fn tag_key<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| c != '=')
        .context(StrContext::Expected(StrContextValue::Description("tag key")))
        .parse_next(input)
}

/// `key=value` or `key=*`.
pub fn keystring(input: &mut &str) -> ModalResult<Keystring> {
    let key = terminated(tag_key, '=').parse_next(input)?;
    let value = cut_err(alt((
        ("*", winnow::combinator::eof).map(|_| Keystring::exists(key)),
        rest.verify(|v: &str| !v.is_empty())
            .map(|v: &str| Keystring::exact(key, v)),
    )))
    .context(StrContext::Expected(StrContextValue::Description(
        "tag value or '*'",
    )))
    .parse_next(input);
    value
}

#[cfg(test)]
mod tests {
    use crate::parse::{parse_keystring, parse_levels};
    use crate::Keystring;

    #[test]
    fn parse_levels_with_commas() {
        let spec = parse_levels("0:24, 1:22, 2:20").unwrap();
        assert_eq!(spec.max_level(), 2);
        assert_eq!(spec.bits_for_level(1), Some(22));
    }

    #[test]
    fn parse_levels_with_spaces_and_trailing_comma() {
        let spec = parse_levels("  0:24 1:20 2:18 3:16 4:14, ").unwrap();
        assert_eq!(spec.max_level(), 4);
        assert_eq!(spec.bits_for_level(4), Some(14));
    }

    #[test]
    fn parse_levels_out_of_order() {
        let spec = parse_levels("2:18 0:24 1:20").unwrap();
        let order: Vec<u8> = spec.levels().iter().map(|l| l.level).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn parse_levels_errors() {
        assert!(parse_levels("").is_err());
        assert!(parse_levels("0").is_err());
        assert!(parse_levels("0:x").is_err());
        assert!(parse_levels("0:24 zoom").is_err());
        assert!(parse_levels("0:300").is_err());
    }

    #[test]
    fn parse_exact_keystring() {
        assert_eq!(
            parse_keystring("highway=primary").unwrap(),
            Keystring::exact("highway", "primary")
        );
        assert_eq!(
            parse_keystring("mkgmap:road-class=2").unwrap(),
            Keystring::exact("mkgmap:road-class", "2")
        );
    }

    #[test]
    fn parse_value_containing_equals_and_star() {
        assert_eq!(
            parse_keystring("note=a=b").unwrap(),
            Keystring::exact("note", "a=b")
        );
        assert_eq!(
            parse_keystring("name=**").unwrap(),
            Keystring::exact("name", "**")
        );
    }

    #[test]
    fn parse_exists_keystring() {
        assert_eq!(parse_keystring("name=*").unwrap(), Keystring::exists("name"));
    }

    #[test]
    fn parse_keystring_errors() {
        assert!(parse_keystring("highway").is_err());
        assert!(parse_keystring("=primary").is_err());
        assert!(parse_keystring("highway=").is_err());
    }
}
