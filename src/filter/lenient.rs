//! Forgiving deserializers for filter options.
//!
//! Options arrive from query strings (everything is a string) and from JSON
//! bodies (typed values). A value that cannot be understood becomes `None`
//! instead of failing the whole request.

use super::StatusFilter;
use crate::camera::CameraStatus;
use crate::severity::SeverityLevel;

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Num(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseList {
    List(Vec<String>),
    Text(String),
}

fn loose<'de, D>(d: D) -> Result<Option<Loose>, D::Error>
where
    D: Deserializer<'de>,
{
    // Unparseable shapes (objects, nested arrays) are treated as absent too.
    Ok(Option::<Loose>::deserialize(d).unwrap_or(None))
}

fn parse_number(value: Loose) -> Option<f64> {
    let n = match value {
        Loose::Num(n) => n,
        Loose::Text(s) => s.trim().parse::<f64>().ok()?,
        Loose::Bool(_) => return None,
    };
    n.is_finite().then_some(n)
}

pub fn number<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose(d)?.and_then(parse_number))
}

pub fn level<'de, D>(d: D) -> Result<Option<SeverityLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let n = match loose(d)?.and_then(parse_number) {
        Some(n) => n,
        None => return Ok(None),
    };
    if n.fract() != 0.0 || !(1.0..=5.0).contains(&n) {
        return Ok(None);
    }
    Ok(SeverityLevel::try_from(n as u8).ok())
}

pub fn flag<'de, D>(d: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match loose(d)? {
        Some(Loose::Bool(b)) => Some(b),
        Some(Loose::Num(n)) if n == 1.0 => Some(true),
        Some(Loose::Num(n)) if n == 0.0 => Some(false),
        Some(Loose::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

pub fn status<'de, D>(d: D) -> Result<Option<StatusFilter>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match loose(d)? {
        Some(Loose::Text(s)) if s.trim().eq_ignore_ascii_case("ALL") => Some(StatusFilter::All),
        Some(Loose::Text(s)) => CameraStatus::parse(&s).map(StatusFilter::Only),
        _ => None,
    })
}

pub fn text<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match loose(d)? {
        Some(Loose::Text(s)) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Some(Loose::Num(n)) if n.is_finite() && n.fract() == 0.0 => Some(format!("{}", n as i64)),
        _ => None,
    })
}

pub fn keywords<'de, D>(d: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<LooseList>::deserialize(d).unwrap_or(None);
    let words: Vec<String> = match raw {
        Some(LooseList::List(list)) => list,
        Some(LooseList::Text(s)) => s.split(',').map(str::to_string).collect(),
        None => return Ok(None),
    };
    let words: Vec<String> = words
        .into_iter()
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .collect();
    Ok((!words.is_empty()).then_some(words))
}
