//! Column type and default-expression payloads carried by operations.

use std::fmt;

use serde::Serialize;

/// A column type as written by the adapter, lowercased.
///
/// `varchar(100)` has `name = "varchar"` and `modifiers = [100]`;
/// `decimal(10,2)` has `modifiers = [10, 2]`. `numeric(10,2)[]` is the same
/// with `array` set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    pub name: String,
    pub modifiers: Vec<i64>,
    pub array: bool,
}

/// Long time-zone spellings folded to their short aliases, with runs of
/// whitespace collapsed.
fn fold_time_zone(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    match words.as_slice() {
        ["timestamp", "with", "time", "zone"] => "timestamptz".to_string(),
        ["timestamp", "without", "time", "zone"] => "timestamp".to_string(),
        ["time", "with", "time", "zone"] => "timetz".to_string(),
        ["time", "without", "time", "zone"] => "time".to_string(),
        _ => words.join(" "),
    }
}

/// Strip any number of `[]` / `[N]` array suffixes.
fn strip_array_suffix(input: &str) -> Option<(&str, bool)> {
    let mut rest = input;
    let mut array = false;
    while let Some(stripped) = rest.strip_suffix(']') {
        let open = stripped.rfind('[')?;
        let dimension = stripped[open + 1..].trim();
        if !dimension.is_empty() && dimension.parse::<u32>().is_err() {
            return None;
        }
        rest = stripped[..open].trim_end();
        array = true;
    }
    Some((rest, array))
}

impl TypeName {
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_lowercase(),
            modifiers: vec![],
            array: false,
        }
    }

    pub fn with_modifiers(name: impl Into<String>, modifiers: Vec<i64>) -> Self {
        Self {
            name: name.into().trim().to_lowercase(),
            modifiers,
            array: false,
        }
    }

    pub fn array_of(self) -> Self {
        Self {
            array: true,
            ..self
        }
    }

    /// Parse `name`, `name(m1, m2, ...)` or `name(m) trailing words`, with
    /// optional `[]` suffixes. Returns `None` for an empty name, unbalanced
    /// parentheses or brackets, or non-integer modifiers.
    ///
    /// `timestamp(3) with time zone` becomes `timestamptz` with `[3]`, and
    /// `timestamp with time zone` becomes plain `timestamptz`.
    pub fn parse(input: &str) -> Option<Self> {
        let (input, array) = strip_array_suffix(input.trim())?;
        if input.contains('[') || input.contains(']') {
            return None;
        }

        let parsed = match input.find('(') {
            None => {
                if input.is_empty() || input.contains(')') {
                    return None;
                }
                Self::simple(fold_time_zone(&input.to_lowercase()))
            }
            Some(open) => {
                let name = input[..open].trim();
                let close = open + input[open..].find(')')?;
                let inner = &input[open + 1..close];
                let trailing = input[close + 1..].trim();
                let trailing_is_words = trailing
                    .chars()
                    .all(|c| c.is_ascii_alphabetic() || c == '_' || c.is_whitespace());
                if name.is_empty() || inner.contains('(') || !trailing_is_words {
                    return None;
                }

                let modifiers = inner
                    .split(',')
                    .map(|m| m.trim().parse::<i64>().ok())
                    .collect::<Option<Vec<_>>>()?;

                let full_name = format!("{name} {trailing}").to_lowercase();
                Self::with_modifiers(fold_time_zone(&full_name), modifiers)
            }
        };

        Some(Self { array, ..parsed })
    }

    pub fn is_json(&self) -> bool {
        self.name == "json"
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.modifiers.is_empty() {
            let mods: Vec<String> = self.modifiers.iter().map(|m| m.to_string()).collect();
            write!(f, "({})", mods.join(","))?;
        }
        if self.array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

impl Serialize for TypeName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Functions whose result differs per row, so a default using them cannot be
/// stored once in the catalog and forces every existing row to be rewritten.
const KNOWN_VOLATILE: &[&str] = &[
    "random",
    "gen_random_uuid",
    "uuid_generate_v1",
    "uuid_generate_v4",
    "clock_timestamp",
    "timeofday",
    "txid_current",
    "nextval",
    "setseed",
    "uuid",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultExpr {
    /// A constant literal: 0, 'active', TRUE, etc.
    Literal(String),
    /// A function call: now(), gen_random_uuid(), my_func(), etc.
    FunctionCall { name: String, args: Vec<String> },
}

impl DefaultExpr {
    /// Classify a raw default expression. Anything shaped like
    /// `identifier(args)` is a function call, everything else a literal.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if let Some(open) = input.find('(')
            && input.ends_with(')')
        {
            let name = input[..open].trim();
            let is_ident = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            if is_ident {
                let inner = input[open + 1..input.len() - 1].trim();
                let args = if inner.is_empty() {
                    vec![]
                } else {
                    inner.split(',').map(|a| a.trim().to_string()).collect()
                };
                return Self::FunctionCall {
                    name: name.to_string(),
                    args,
                };
            }
        }
        Self::Literal(input.to_string())
    }

    /// Whether this default is a call to a function known to be volatile.
    pub fn is_known_volatile(&self) -> bool {
        match self {
            Self::FunctionCall { name, .. } => {
                let lower = name.to_lowercase();
                let bare = lower.rsplit('.').next().unwrap_or(&lower);
                KNOWN_VOLATILE.contains(&bare)
            }
            Self::Literal(_) => false,
        }
    }
}

impl fmt::Display for DefaultExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.write_str(value),
            Self::FunctionCall { name, args } => write!(f, "{}({})", name, args.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_type() {
        assert_eq!(TypeName::parse("Boolean"), Some(TypeName::simple("boolean")));
        assert_eq!(
            TypeName::parse("timestamp with time zone"),
            Some(TypeName::simple("timestamptz"))
        );
    }

    #[test]
    fn test_parse_type_with_modifiers() {
        let t = TypeName::parse("decimal(8, 2)").expect("valid type");
        assert_eq!(t.name, "decimal");
        assert_eq!(t.modifiers, vec![8, 2]);
        assert_eq!(t.to_string(), "decimal(8,2)");

        let t = TypeName::parse("character varying(255)").expect("valid type");
        assert_eq!(t.name, "character varying");
        assert_eq!(t.modifiers, vec![255]);
    }

    #[test]
    fn test_parse_modifiers_before_time_zone_words() {
        let t = TypeName::parse("timestamp(3) with time zone").expect("valid type");
        assert_eq!(t, TypeName::with_modifiers("timestamptz", vec![3]));
        assert_eq!(t.to_string(), "timestamptz(3)");

        let t = TypeName::parse("TIME(3) WITHOUT TIME ZONE").expect("valid type");
        assert_eq!(t, TypeName::with_modifiers("time", vec![3]));

        let t = TypeName::parse("timestamp(6)  without  time zone").expect("valid type");
        assert_eq!(t, TypeName::with_modifiers("timestamp", vec![6]));
    }

    #[test]
    fn test_parse_array_types() {
        let t = TypeName::parse("numeric(10,2)[]").expect("valid type");
        assert_eq!(t, TypeName::with_modifiers("numeric", vec![10, 2]).array_of());
        assert_eq!(t.to_string(), "numeric(10,2)[]");

        let t = TypeName::parse("varchar(255)[]").expect("valid type");
        assert_eq!(t, TypeName::with_modifiers("varchar", vec![255]).array_of());

        assert_eq!(
            TypeName::parse("text[][]"),
            Some(TypeName::simple("text").array_of())
        );
        assert_eq!(
            TypeName::parse("integer[3]"),
            Some(TypeName::simple("integer").array_of())
        );
    }

    #[test]
    fn test_parse_rejects_malformed_types() {
        assert_eq!(TypeName::parse(""), None);
        assert_eq!(TypeName::parse("varchar(abc)"), None);
        assert_eq!(TypeName::parse("varchar(10"), None);
        assert_eq!(TypeName::parse("(10)"), None);
        assert_eq!(TypeName::parse("numeric((1))"), None);
        assert_eq!(TypeName::parse("varchar(10) (2)"), None);
        assert_eq!(TypeName::parse("int[x]"), None);
        assert_eq!(TypeName::parse("int]"), None);
        assert_eq!(TypeName::parse("[]"), None);
    }

    #[test]
    fn test_default_expr_classification() {
        assert_eq!(
            DefaultExpr::parse("false"),
            DefaultExpr::Literal("false".to_string())
        );
        assert_eq!(
            DefaultExpr::parse("gen_random_uuid()"),
            DefaultExpr::FunctionCall {
                name: "gen_random_uuid".to_string(),
                args: vec![],
            }
        );
        assert_eq!(
            DefaultExpr::parse("'(a)'"),
            DefaultExpr::Literal("'(a)'".to_string())
        );
    }

    #[test]
    fn test_known_volatile_functions() {
        assert!(DefaultExpr::parse("gen_random_uuid()").is_known_volatile());
        assert!(DefaultExpr::parse("public.uuid_generate_v4()").is_known_volatile());
        assert!(DefaultExpr::parse("nextval('orders_id_seq')").is_known_volatile());
        assert!(DefaultExpr::parse("CLOCK_TIMESTAMP()").is_known_volatile());
        // now() is stable: evaluated once per statement
        assert!(!DefaultExpr::parse("now()").is_known_volatile());
        assert!(!DefaultExpr::parse("0").is_known_volatile());
    }
}
