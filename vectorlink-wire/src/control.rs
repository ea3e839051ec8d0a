//! The `RPv0` control-plane payload grammar: hello / hello2u / advert /
//! fadvert, modeled as a single tagged union (spec.md §9 "Polymorphism")
//! parsed once at ingress rather than branched on per handler.

use itertools::Itertools;

use crate::addr::{AddrParseError, OverlayAddr, Prefix};

#[derive(Debug, thiserror::Error)]
pub enum ControlParseError {
    #[error("payload has no lines")]
    Empty,
    #[error("first line is not \"RPv0\"")]
    BadMagic,
    #[error("second line is not a \"type: ...\" line")]
    BadTypeLine,
    #[error("unknown control type {0:?}")]
    UnknownType(String),
    #[error("missing typed line for type {0:?}")]
    MissingTypedLine(&'static str),
    #[error("typed line {0:?} has the wrong key")]
    WrongKey(String),
    #[error("malformed timestamp {0:?}")]
    BadTimestamp(String),
    #[error("malformed cost {0:?}")]
    BadCost(String),
    #[error("pathvec line has too few fields: {0:?}")]
    ShortPathvec(String),
    #[error("linkfail line has too few fields: {0:?}")]
    ShortLinkfail(String),
    #[error(transparent)]
    Addr(#[from] AddrParseError),
}

/// A parsed `RPv0` control packet body.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlBody {
    Hello {
        timestamp: f64,
    },
    Hello2u {
        timestamp: f64,
    },
    /// `path` runs from the originating router (element 0, the `receivedFrom`
    /// neighbor from the sender's perspective) to the destination.
    Advert {
        prefix: Prefix,
        timestamp: f64,
        cost: f64,
        path: Vec<OverlayAddr>,
    },
    FAdvert {
        a: OverlayAddr,
        b: OverlayAddr,
        timestamp: f64,
        path: Vec<OverlayAddr>,
    },
}

fn fmt3(v: f64) -> String {
    format!("{v:.3}")
}

fn fmt_path(path: &[OverlayAddr]) -> String {
    path.iter().map(|a| a.to_string()).join(" ")
}

impl ControlBody {
    /// Renders the `RPv0` payload text, trailing `\n` included.
    pub fn to_payload(&self) -> String {
        let mut out = String::from("RPv0\n");
        match self {
            ControlBody::Hello { timestamp } => {
                out.push_str("type: hello\n");
                out.push_str(&format!("timestamp: {}\n", fmt3(*timestamp)));
            }
            ControlBody::Hello2u { timestamp } => {
                out.push_str("type: hello2u\n");
                out.push_str(&format!("timestamp: {}\n", fmt3(*timestamp)));
            }
            ControlBody::Advert {
                prefix,
                timestamp,
                cost,
                path,
            } => {
                out.push_str("type: advert\n");
                out.push_str(&format!(
                    "pathvec: {prefix} {} {} {}\n",
                    fmt3(*timestamp),
                    fmt3(*cost),
                    fmt_path(path)
                ));
            }
            ControlBody::FAdvert {
                a,
                b,
                timestamp,
                path,
            } => {
                out.push_str("type: fadvert\n");
                out.push_str(&format!(
                    "linkfail: {a} {b} {} {}\n",
                    fmt3(*timestamp),
                    fmt_path(path)
                ));
            }
        }
        out
    }

    /// Parses an `RPv0` payload. Per spec.md §7/§9, any grammar violation
    /// (bad magic, missing `type` key, unknown type, malformed typed line)
    /// is a silent drop, not a fatal error: callers get `None` and the
    /// reason is logged at `debug`.
    pub fn parse(payload: &str) -> Option<ControlBody> {
        match Self::try_parse(payload) {
            Ok(body) => Some(body),
            Err(e) => {
                log::debug!("dropping malformed control payload: {e}");
                None
            }
        }
    }

    fn try_parse(payload: &str) -> Result<ControlBody, ControlParseError> {
        let mut lines = payload.lines();
        let magic = lines.next().ok_or(ControlParseError::Empty)?;
        if magic != "RPv0" {
            return Err(ControlParseError::BadMagic);
        }
        let type_line = lines.next().ok_or(ControlParseError::BadTypeLine)?;
        let (key, value) = type_line
            .split_once(':')
            .ok_or(ControlParseError::BadTypeLine)?;
        if key.trim() != "type" {
            return Err(ControlParseError::BadTypeLine);
        }
        let ty = value.trim();

        match ty {
            "hello" => Ok(ControlBody::Hello {
                timestamp: parse_timestamp_line(lines.next(), "hello")?,
            }),
            "hello2u" => Ok(ControlBody::Hello2u {
                timestamp: parse_timestamp_line(lines.next(), "hello2u")?,
            }),
            "advert" => parse_advert(lines.next()),
            "fadvert" => parse_fadvert(lines.next()),
            other => Err(ControlParseError::UnknownType(other.to_string())),
        }
    }
}

fn parse_timestamp_line(
    line: Option<&str>,
    ty: &'static str,
) -> Result<f64, ControlParseError> {
    let line = line.ok_or(ControlParseError::MissingTypedLine(ty))?;
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| ControlParseError::WrongKey(line.to_string()))?;
    if key.trim() != "timestamp" {
        return Err(ControlParseError::WrongKey(line.to_string()));
    }
    value
        .trim()
        .parse()
        .map_err(|_| ControlParseError::BadTimestamp(value.trim().to_string()))
}

fn parse_advert(line: Option<&str>) -> Result<ControlBody, ControlParseError> {
    let line = line.ok_or(ControlParseError::MissingTypedLine("advert"))?;
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| ControlParseError::WrongKey(line.to_string()))?;
    if key.trim() != "pathvec" {
        return Err(ControlParseError::WrongKey(line.to_string()));
    }
    let fields: Vec<&str> = value.trim().split_whitespace().collect();
    if fields.len() < 4 {
        return Err(ControlParseError::ShortPathvec(line.to_string()));
    }
    let prefix: Prefix = fields[0].parse()?;
    let timestamp: f64 = fields[1]
        .parse()
        .map_err(|_| ControlParseError::BadTimestamp(fields[1].to_string()))?;
    let cost: f64 = fields[2]
        .parse()
        .map_err(|_| ControlParseError::BadCost(fields[2].to_string()))?;
    let mut path = Vec::with_capacity(fields.len() - 3);
    for f in &fields[3..] {
        path.push(f.parse::<OverlayAddr>()?);
    }
    Ok(ControlBody::Advert {
        prefix,
        timestamp,
        cost,
        path,
    })
}

fn parse_fadvert(line: Option<&str>) -> Result<ControlBody, ControlParseError> {
    let line = line.ok_or(ControlParseError::MissingTypedLine("fadvert"))?;
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| ControlParseError::WrongKey(line.to_string()))?;
    if key.trim() != "linkfail" {
        return Err(ControlParseError::WrongKey(line.to_string()));
    }
    let fields: Vec<&str> = value.trim().split_whitespace().collect();
    if fields.len() < 4 {
        return Err(ControlParseError::ShortLinkfail(line.to_string()));
    }
    let a: OverlayAddr = fields[0].parse()?;
    let b: OverlayAddr = fields[1].parse()?;
    let timestamp: f64 = fields[2]
        .parse()
        .map_err(|_| ControlParseError::BadTimestamp(fields[2].to_string()))?;
    let mut path = Vec::with_capacity(fields.len() - 3);
    for f in &fields[3..] {
        path.push(f.parse::<OverlayAddr>()?);
    }
    Ok(ControlBody::FAdvert {
        a,
        b,
        timestamp,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_roundtrip() {
        let body = ControlBody::Hello { timestamp: 10.0 };
        let payload = body.to_payload();
        assert_eq!(payload, "RPv0\ntype: hello\ntimestamp: 10.000\n");
        assert_eq!(ControlBody::parse(&payload), Some(body));
    }

    #[test]
    fn advert_roundtrip() {
        let body = ControlBody::Advert {
            prefix: "1.2.0.0/16".parse().unwrap(),
            timestamp: 3.5,
            cost: 0.123,
            path: vec![OverlayAddr(1), OverlayAddr(2)],
        };
        let payload = body.to_payload();
        assert_eq!(
            payload,
            "RPv0\ntype: advert\npathvec: 1.2.0.0/16 3.500 0.123 0.0.0.1 0.0.0.2\n"
        );
        assert_eq!(ControlBody::parse(&payload), Some(body));
    }

    #[test]
    fn fadvert_roundtrip() {
        let body = ControlBody::FAdvert {
            a: "1.1.0.1".parse().unwrap(),
            b: "1.1.0.2".parse().unwrap(),
            timestamp: 4.0,
            path: vec![OverlayAddr(1)],
        };
        let payload = body.to_payload();
        assert_eq!(ControlBody::parse(&payload), Some(body));
    }

    #[test]
    fn bad_magic_drops_silently() {
        assert_eq!(ControlBody::parse("NOPE\ntype: hello\n"), None);
    }

    #[test]
    fn bad_type_key_drops_silently() {
        assert_eq!(ControlBody::parse("RPv0\nkind: hello\n"), None);
    }

    #[test]
    fn unknown_type_is_ignored() {
        assert_eq!(ControlBody::parse("RPv0\ntype: friendship\n"), None);
    }
}
