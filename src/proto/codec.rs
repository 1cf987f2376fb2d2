use std::fmt;

/// One positional field of a SimPLEX command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Str(s) => f.write_str(s),
            Field::Int(i) => write!(f, "{i}"),
            // `{:?}` keeps the fractional part (5.0, not 5)
            Field::Float(x) => write!(f, "{x:?}"),
            Field::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
        }
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Str(s.to_string())
    }
}
impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::Str(s)
    }
}
impl From<&String> for Field {
    fn from(s: &String) -> Self {
        Field::Str(s.clone())
    }
}
impl From<u8> for Field {
    fn from(i: u8) -> Self {
        Field::Int(i64::from(i))
    }
}
impl From<f64> for Field {
    fn from(x: f64) -> Self {
        Field::Float(x)
    }
}
impl From<bool> for Field {
    fn from(b: bool) -> Self {
        Field::Bool(b)
    }
}

/// Join fields with `,`. Values are not quoted or escaped, so they must not
/// contain the delimiter themselves.
pub fn encode(fields: &[Field]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
