// Días, horas y franjas horarias: parseo y solapamiento.
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    /// Lunes a viernes, en orden. Es el rango que recorre la búsqueda de ventanas.
    pub const WEEKDAYS: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = EngineError;

    /// Acepta nombre completo, abreviatura de 3 letras o de 2 ("monday", "MON", "MO").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tok = s.trim().to_lowercase();
        let day = match tok.as_str() {
            "monday" | "mon" | "mo" => Day::Monday,
            "tuesday" | "tue" | "tu" => Day::Tuesday,
            "wednesday" | "wed" | "we" => Day::Wednesday,
            "thursday" | "thu" | "th" => Day::Thursday,
            "friday" | "fri" | "fr" => Day::Friday,
            "saturday" | "sat" | "sa" => Day::Saturday,
            "sunday" | "sun" | "su" => Day::Sunday,
            _ => {
                return Err(EngineError::InvalidTimeSlot {
                    input: s.to_string(),
                    reason: "unknown day".to_string(),
                })
            }
        };
        Ok(day)
    }
}

/// Convierte "HH:MM" (o "HH.MM", o "H:MM") a `NaiveTime`.
pub fn parse_time(t: &str) -> Option<NaiveTime> {
    let mut tok = t.trim().replace('.', ":");
    if tok.len() == 4 && tok.is_ascii() && !tok.contains(':') {
        // "0830" -> "08:30"
        tok.insert(2, ':');
    }
    let (hh, mm) = tok.split_once(':')?;
    let hh = hh.parse::<u32>().ok()?;
    let mm = mm.parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(hh, mm, 0)
}

/// Minutos desde medianoche.
pub fn minutes_of(t: NaiveTime) -> i64 {
    (t.hour() * 60 + t.minute()) as i64
}

/// Minutos entre `start` y `end` (negativo si `end` es anterior).
pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> i64 {
    minutes_of(end) - minutes_of(start)
}

/// Dos rangos se solapan salvo que uno termine antes (o justo cuando) empieza el otro.
pub fn ranges_overlap(a: (NaiveTime, NaiveTime), b: (NaiveTime, NaiveTime)) -> bool {
    !(a.1 <= b.0 || b.1 <= a.0)
}

/// Serde de `NaiveTime` como "HH:MM".
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{}'", raw)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        TimeRange { start, end }
    }

    pub fn minutes(&self) -> i64 {
        minutes_between(self.start, self.end)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Bloque semanal de una oferta. Invariante: `start < end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSlot")]
pub struct TimeSlot {
    pub day: Day,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Deserialize)]
struct RawTimeSlot {
    day: Day,
    #[serde(with = "hhmm")]
    start: NaiveTime,
    #[serde(with = "hhmm")]
    end: NaiveTime,
    #[serde(default)]
    location: Option<String>,
}

impl TryFrom<RawTimeSlot> for TimeSlot {
    type Error = EngineError;

    fn try_from(raw: RawTimeSlot) -> Result<Self, Self::Error> {
        TimeSlot::new(raw.day, raw.start, raw.end, raw.location)
    }
}

impl TimeSlot {
    pub fn new(
        day: Day,
        start: NaiveTime,
        end: NaiveTime,
        location: Option<String>,
    ) -> EngineResult<Self> {
        if end <= start {
            return Err(EngineError::InvalidTimeSlot {
                input: format!("{} {}-{}", day, start.format("%H:%M"), end.format("%H:%M")),
                reason: "end must be after start".to_string(),
            });
        }
        // "" y None significan lo mismo: sin sala asignada
        let location = location.filter(|l| !l.trim().is_empty());
        Ok(TimeSlot { day, start, end, location })
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    pub fn duration_minutes(&self) -> i64 {
        minutes_between(self.start, self.end)
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.day == other.day && ranges_overlap((self.start, self.end), (other.start, other.end))
    }

    /// Ventana común de dos bloques que se solapan.
    pub fn overlap_window(&self, other: &TimeSlot) -> TimeRange {
        TimeRange::new(self.start.max(other.start), self.end.min(other.end))
    }
}

/// Parsea una franja compacta a bloques, uno por día.
/// Ejemplo: "MON WED 09:00-10:30" -> [(monday, 09:00, 10:30), (wednesday, 09:00, 10:30)]
pub fn parse_slots(meeting: &str, location: Option<&str>) -> EngineResult<Vec<TimeSlot>> {
    let invalid = |reason: &str| EngineError::InvalidTimeSlot {
        input: meeting.to_string(),
        reason: reason.to_string(),
    };
    let parts: Vec<&str> = meeting.split_whitespace().collect();
    let time_idx = parts
        .iter()
        .position(|t| t.contains('-'))
        .ok_or_else(|| invalid("missing HH:MM-HH:MM range"))?;
    if time_idx == 0 {
        return Err(invalid("missing day"));
    }
    let (start, end) = parts[time_idx]
        .split_once('-')
        .ok_or_else(|| invalid("missing HH:MM-HH:MM range"))?;
    let start = parse_time(start).ok_or_else(|| invalid("unparseable start time"))?;
    let end = parse_time(end).ok_or_else(|| invalid("unparseable end time"))?;

    let mut out = Vec::with_capacity(time_idx);
    for tok in &parts[..time_idx] {
        let day: Day = tok.parse()?;
        out.push(TimeSlot::new(day, start, end, location.map(str::to_string))?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("08:30"), Some(t(8, 30)));
        assert_eq!(parse_time("14.00"), Some(t(14, 0)));
        assert_eq!(parse_time("0915"), Some(t(9, 15)));
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("nope"), None);
    }

    #[test]
    fn test_ranges_overlap_boundary() {
        // 08:30-09:50 y 09:00-10:00 se solapan
        assert!(ranges_overlap((t(8, 30), t(9, 50)), (t(9, 0), t(10, 0))));
        // 08:00-09:00 y 09:00-10:00 no se solapan (límite)
        assert!(!ranges_overlap((t(8, 0), t(9, 0)), (t(9, 0), t(10, 0))));
    }

    #[test]
    fn test_parse_time_rejects_non_ascii_tokens() {
        assert_eq!(parse_time("0830"), Some(t(8, 30)));
        assert_eq!(parse_time("1é2"), None);
        assert_eq!(parse_time("é:30"), None);
        assert!(serde_json::from_str::<TimeSlot>(r#"{"day":"monday","start":"1é2","end":"10:00"}"#).is_err());
    }

    #[test]
    fn test_slot_rejects_inverted_range() {
        assert!(TimeSlot::new(Day::Monday, t(10, 0), t(9, 0), None).is_err());
        assert!(TimeSlot::new(Day::Monday, t(10, 0), t(10, 0), None).is_err());
    }

    #[test]
    fn test_parse_slots_multiple_days() {
        let slots = parse_slots("MON wed 09:00-10:30", Some("Room 101")).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].day, Day::Monday);
        assert_eq!(slots[1].day, Day::Wednesday);
        assert_eq!(slots[1].duration_minutes(), 90);
        assert_eq!(slots[0].location.as_deref(), Some("Room 101"));

        assert!(parse_slots("09:00-10:30", None).is_err());
        assert!(parse_slots("MON", None).is_err());
        assert!(parse_slots("XYZ 09:00-10:00", None).is_err());
    }

    #[test]
    fn test_slot_json_uses_hhmm() {
        let slot: TimeSlot =
            serde_json::from_str(r#"{"day":"tuesday","start":"10:00","end":"11:15","location":""}"#)
                .unwrap();
        assert_eq!(slot.location, None);
        assert_eq!(slot.duration_minutes(), 75);
        let back = serde_json::to_string(&slot).unwrap();
        assert_eq!(back, r#"{"day":"tuesday","start":"10:00","end":"11:15"}"#);

        let bad = serde_json::from_str::<TimeSlot>(r#"{"day":"monday","start":"11:00","end":"10:00"}"#);
        assert!(bad.is_err());
    }
}
