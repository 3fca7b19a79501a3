//! Weekday names and minute-precision clock times used by class schedules.

use time::{macros::format_description, OffsetDateTime, Time, Weekday};

pub const WEEK: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "Monday",
        Weekday::Tuesday => "Tuesday",
        Weekday::Wednesday => "Wednesday",
        Weekday::Thursday => "Thursday",
        Weekday::Friday => "Friday",
        Weekday::Saturday => "Saturday",
        Weekday::Sunday => "Sunday",
    }
}

/// Accepts full English day names in any case.
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    let raw = raw.trim();
    WEEK.into_iter()
        .find(|day| weekday_name(*day).eq_ignore_ascii_case(raw))
}

pub fn minutes_since_midnight(t: Time) -> i64 {
    i64::from(t.hour()) * 60 + i64::from(t.minute())
}

/// Drops seconds and below so comparisons happen at minute precision.
pub fn truncate_to_minute(t: Time) -> Time {
    Time::from_hms(t.hour(), t.minute(), 0).unwrap_or(t)
}

pub fn parse_clock(raw: &str) -> Option<Time> {
    let raw = raw.trim();
    let hm = format_description!("[hour]:[minute]");
    let hms = format_description!("[hour]:[minute]:[second]");
    Time::parse(raw, &hm)
        .or_else(|_| Time::parse(raw, &hms))
        .ok()
        .map(truncate_to_minute)
}

pub fn format_clock(t: Time) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}

/// Local wall clock at the moment of a request.
#[derive(Debug, Clone, Copy)]
pub struct Moment {
    pub at: OffsetDateTime,
}

impl Moment {
    pub fn new(at: OffsetDateTime) -> Self {
        Self { at }
    }

    pub fn weekday(&self) -> Weekday {
        self.at.weekday()
    }

    pub fn time_of_day(&self) -> Time {
        truncate_to_minute(self.at.time())
    }

    pub fn date(&self) -> time::Date {
        self.at.date()
    }
}

/// `HH:MM` (de)serialization for schedule times.
pub mod clock {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use time::Time;

    pub fn serialize<S: Serializer>(t: &Time, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_clock(*t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Time, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_clock(&raw).ok_or_else(|| D::Error::custom(format!("invalid time {raw:?}, expected HH:MM")))
    }

    pub mod option {
        use serde::{de::Error, Deserialize, Deserializer, Serializer};
        use time::Time;

        pub fn serialize<S: Serializer>(t: &Option<Time>, s: S) -> Result<S::Ok, S::Error> {
            match t {
                Some(t) => s.serialize_some(&crate::schedule::format_clock(*t)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Time>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => crate::schedule::parse_clock(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid time {raw:?}, expected HH:MM"))),
                None => Ok(None),
            }
        }
    }
}

/// Day sets as lists of names, e.g. `["Monday", "Wednesday"]`.
pub mod weekdays {
    use serde::{de::Error, ser::SerializeSeq, Deserialize, Deserializer, Serializer};
    use time::Weekday;

    pub fn serialize<S: Serializer>(days: &[Weekday], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(days.len()))?;
        for day in days {
            seq.serialize_element(super::weekday_name(*day))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Weekday>, D::Error> {
        let names = Vec::<String>::deserialize(d)?;
        names
            .iter()
            .map(|n| super::parse_weekday(n).ok_or_else(|| D::Error::custom(format!("unknown day {n:?}"))))
            .collect()
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serialize, Serializer};
        use time::Weekday;

        pub fn serialize<S: Serializer>(days: &Option<Vec<Weekday>>, s: S) -> Result<S::Ok, S::Error> {
            days.as_ref()
                .map(|d| d.iter().map(|day| crate::schedule::weekday_name(*day)).collect::<Vec<_>>())
                .serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<Weekday>>, D::Error> {
            #[derive(Deserialize)]
            struct Wrap(#[serde(with = "crate::schedule::weekdays")] Vec<Weekday>);
            Ok(Option::<Wrap>::deserialize(d)?.map(|w| w.0))
        }
    }
}
