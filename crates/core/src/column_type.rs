//! CQL column types
//!
//! `ColumnType` is read from two places: the text form stored in
//! `system_schema.columns.type` (parsed with [`str::parse`]) and the binary
//! `[option]` encoding in native protocol result metadata. Its `Display`
//! output is valid CQL type syntax and is what the DDL renderer writes.

use std::fmt;
use std::str::FromStr;

use crate::cql::{quote_identifier, quote_string};

/// A CQL data type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// `ascii`
    Ascii,
    /// `bigint`
    BigInt,
    /// `blob`
    Blob,
    /// `boolean`
    Boolean,
    /// `counter`
    Counter,
    /// `date`
    Date,
    /// `decimal`
    Decimal,
    /// `double`
    Double,
    /// `duration`
    Duration,
    /// `float`
    Float,
    /// `inet`
    Inet,
    /// `int`
    Int,
    /// `smallint`
    SmallInt,
    /// `text` (and its alias `varchar`)
    Text,
    /// `time`
    Time,
    /// `timestamp`
    Timestamp,
    /// `timeuuid`
    TimeUuid,
    /// `tinyint`
    TinyInt,
    /// `uuid`
    Uuid,
    /// `varint`
    VarInt,
    /// `list<T>`
    List(Box<ColumnType>),
    /// `set<T>`
    Set(Box<ColumnType>),
    /// `map<K, V>`
    Map(Box<ColumnType>, Box<ColumnType>),
    /// `tuple<T1, T2, ...>`
    Tuple(Vec<ColumnType>),
    /// `frozen<T>`
    Frozen(Box<ColumnType>),
    /// A user-defined type. `fields` is empty when the type was parsed from
    /// schema text rather than decoded from result metadata.
    UserDefined {
        /// Type name within its keyspace
        name: String,
        /// Field names and types, in declaration order
        fields: Vec<(String, ColumnType)>,
    },
    /// A custom marshal class, e.g. `'org.apache.cassandra.db.marshal.DynamicCompositeType'`
    Custom(String),
}

impl ColumnType {
    /// Whether this is the `counter` type
    pub fn is_counter(&self) -> bool {
        matches!(self, ColumnType::Counter)
    }

    /// Strip any `frozen<...>` wrappers
    pub fn unfrozen(&self) -> &ColumnType {
        match self {
            ColumnType::Frozen(inner) => inner.unfrozen(),
            other => other,
        }
    }

    /// Whether the type is a list, set or map (after unfreezing)
    pub fn is_collection(&self) -> bool {
        matches!(
            self.unfrozen(),
            ColumnType::List(_) | ColumnType::Set(_) | ColumnType::Map(_, _)
        )
    }

    /// Look up a builtin type by its CQL name
    pub fn native(name: &str) -> Option<ColumnType> {
        let t = match name.to_ascii_lowercase().as_str() {
            "ascii" => ColumnType::Ascii,
            "bigint" => ColumnType::BigInt,
            "blob" => ColumnType::Blob,
            "boolean" => ColumnType::Boolean,
            "counter" => ColumnType::Counter,
            "date" => ColumnType::Date,
            "decimal" => ColumnType::Decimal,
            "double" => ColumnType::Double,
            "duration" => ColumnType::Duration,
            "float" => ColumnType::Float,
            "inet" => ColumnType::Inet,
            "int" => ColumnType::Int,
            "smallint" => ColumnType::SmallInt,
            "text" | "varchar" => ColumnType::Text,
            "time" => ColumnType::Time,
            "timestamp" => ColumnType::Timestamp,
            "timeuuid" => ColumnType::TimeUuid,
            "tinyint" => ColumnType::TinyInt,
            "uuid" => ColumnType::Uuid,
            "varint" => ColumnType::VarInt,
            _ => return None,
        };
        Some(t)
    }
}

fn join_types(f: &mut fmt::Formatter<'_>, types: &[&ColumnType]) -> fmt::Result {
    for (i, t) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", t)?;
    }
    Ok(())
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Ascii => f.write_str("ascii"),
            ColumnType::BigInt => f.write_str("bigint"),
            ColumnType::Blob => f.write_str("blob"),
            ColumnType::Boolean => f.write_str("boolean"),
            ColumnType::Counter => f.write_str("counter"),
            ColumnType::Date => f.write_str("date"),
            ColumnType::Decimal => f.write_str("decimal"),
            ColumnType::Double => f.write_str("double"),
            ColumnType::Duration => f.write_str("duration"),
            ColumnType::Float => f.write_str("float"),
            ColumnType::Inet => f.write_str("inet"),
            ColumnType::Int => f.write_str("int"),
            ColumnType::SmallInt => f.write_str("smallint"),
            ColumnType::Text => f.write_str("text"),
            ColumnType::Time => f.write_str("time"),
            ColumnType::Timestamp => f.write_str("timestamp"),
            ColumnType::TimeUuid => f.write_str("timeuuid"),
            ColumnType::TinyInt => f.write_str("tinyint"),
            ColumnType::Uuid => f.write_str("uuid"),
            ColumnType::VarInt => f.write_str("varint"),
            ColumnType::List(t) => write!(f, "list<{}>", t),
            ColumnType::Set(t) => write!(f, "set<{}>", t),
            ColumnType::Map(k, v) => write!(f, "map<{}, {}>", k, v),
            ColumnType::Tuple(ts) => {
                f.write_str("tuple<")?;
                join_types(f, &ts.iter().collect::<Vec<_>>())?;
                f.write_str(">")
            }
            ColumnType::Frozen(t) => write!(f, "frozen<{}>", t),
            ColumnType::UserDefined { name, .. } => f.write_str(&quote_identifier(name)),
            ColumnType::Custom(class) => f.write_str(&quote_string(class)),
        }
    }
}

/// Returned when type text cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type '{text}': {reason}")]
pub struct TypeParseError {
    /// The full input
    pub text: String,
    /// What went wrong
    pub reason: String,
}

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn error(&self, reason: impl Into<String>) -> TypeParseError {
        TypeParseError {
            text: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), TypeParseError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}' at offset {}", c, self.pos)))
        }
    }

    /// Quoted (`"..."`, `'...'`) or bare word
    fn word(&mut self) -> Result<(String, Option<char>), TypeParseError> {
        self.skip_ws();
        let rest = self.rest();
        let first = rest
            .chars()
            .next()
            .ok_or_else(|| self.error("unexpected end of input"))?;
        if first == '"' || first == '\'' {
            let mut out = String::new();
            let mut chars = rest.char_indices().skip(1).peekable();
            while let Some((i, c)) = chars.next() {
                if c == first {
                    if let Some(&(_, next)) = chars.peek() {
                        if next == first {
                            out.push(c);
                            chars.next();
                            continue;
                        }
                    }
                    self.pos += i + 1;
                    return Ok((out, Some(first)));
                }
                out.push(c);
            }
            return Err(self.error("unterminated quoted name"));
        }
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error(format!("unexpected '{}' at offset {}", first, self.pos)));
        }
        self.pos += len;
        Ok((rest[..len].to_string(), None))
    }

    fn parse_type(&mut self) -> Result<ColumnType, TypeParseError> {
        let (word, quote) = self.word()?;
        match quote {
            Some('\'') => return Ok(ColumnType::Custom(word)),
            Some(_) => {
                return Ok(ColumnType::UserDefined {
                    name: word,
                    fields: Vec::new(),
                })
            }
            None => {}
        }
        let lower = word.to_ascii_lowercase();
        match lower.as_str() {
            "list" | "set" | "frozen" => {
                self.expect('<')?;
                let inner = Box::new(self.parse_type()?);
                self.expect('>')?;
                Ok(match lower.as_str() {
                    "list" => ColumnType::List(inner),
                    "set" => ColumnType::Set(inner),
                    _ => ColumnType::Frozen(inner),
                })
            }
            "map" => {
                self.expect('<')?;
                let k = self.parse_type()?;
                self.expect(',')?;
                let v = self.parse_type()?;
                self.expect('>')?;
                Ok(ColumnType::Map(Box::new(k), Box::new(v)))
            }
            "tuple" => {
                self.expect('<')?;
                let mut items = vec![self.parse_type()?];
                while self.eat(',') {
                    items.push(self.parse_type()?);
                }
                self.expect('>')?;
                Ok(ColumnType::Tuple(items))
            }
            _ => match ColumnType::native(&lower) {
                Some(t) => Ok(t),
                None => {
                    self.skip_ws();
                    if self.rest().starts_with('<') {
                        return Err(self.error(format!("unsupported parameterized type '{}'", word)));
                    }
                    // A keyspace-qualified UDT name keeps only the type part.
                    let name = lower.rsplit('.').next().unwrap_or(&lower).to_string();
                    Ok(ColumnType::UserDefined {
                        name,
                        fields: Vec::new(),
                    })
                }
            },
        }
    }
}

impl FromStr for ColumnType {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser { input: s, pos: 0 };
        let t = parser.parse_type()?;
        parser.skip_ws();
        if !parser.rest().is_empty() {
            return Err(parser.error(format!("trailing input '{}'", parser.rest())));
        }
        Ok(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> ColumnType {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_native() {
        assert_eq!(parse("int"), ColumnType::Int);
        assert_eq!(parse("varchar"), ColumnType::Text);
        assert_eq!(parse("TEXT"), ColumnType::Text);
        assert_eq!(parse("counter"), ColumnType::Counter);
    }

    #[test]
    fn test_parse_collections() {
        assert_eq!(parse("list<int>"), ColumnType::List(Box::new(ColumnType::Int)));
        assert_eq!(
            parse("map<text, frozen<list<uuid>>>"),
            ColumnType::Map(
                Box::new(ColumnType::Text),
                Box::new(ColumnType::Frozen(Box::new(ColumnType::List(Box::new(
                    ColumnType::Uuid
                )))))
            )
        );
        assert_eq!(
            parse("tuple<int, text, boolean>"),
            ColumnType::Tuple(vec![ColumnType::Int, ColumnType::Text, ColumnType::Boolean])
        );
    }

    #[test]
    fn test_parse_user_defined() {
        assert_eq!(
            parse("frozen<address>"),
            ColumnType::Frozen(Box::new(ColumnType::UserDefined {
                name: "address".into(),
                fields: vec![]
            }))
        );
        assert_eq!(
            parse("\"Address\""),
            ColumnType::UserDefined {
                name: "Address".into(),
                fields: vec![]
            }
        );
    }

    #[test]
    fn test_parse_custom() {
        assert_eq!(
            parse("'org.apache.cassandra.db.marshal.BytesType'"),
            ColumnType::Custom("org.apache.cassandra.db.marshal.BytesType".into())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!("map<int>".parse::<ColumnType>().is_err());
        assert!("list<int".parse::<ColumnType>().is_err());
        assert!("int int".parse::<ColumnType>().is_err());
        assert!("vector<float, 3>".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_display_reparses() {
        for text in [
            "int",
            "list<text>",
            "set<frozen<tuple<int, bigint>>>",
            "map<timeuuid, blob>",
            "frozen<\"Point\">",
        ] {
            let t = parse(text);
            assert_eq!(parse(&t.to_string()), t, "{}", text);
        }
        assert_eq!(parse("map<text,int>").to_string(), "map<text, int>");
    }

    #[test]
    fn test_predicates() {
        assert!(ColumnType::Counter.is_counter());
        assert!(!ColumnType::BigInt.is_counter());
        assert!(parse("frozen<set<int>>").is_collection());
        assert!(!parse("tuple<int>").is_collection());
    }
}
