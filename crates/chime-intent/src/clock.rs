// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twelve-hour clock conversion and spoken time formatting.

use std::fmt;

/// Which half of the day a twelve-hour time falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    /// Parses `am`, `a.m.`, `PM`, `p.m` and similar spellings.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker
            .chars()
            .find(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
        {
            Some('a') => Some(Self::Am),
            Some('p') => Some(Self::Pm),
            _ => None,
        }
    }
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Am => "AM",
            Self::Pm => "PM",
        })
    }
}

/// `hour` must be in `1..=12`; 12 AM is midnight and 12 PM is noon.
pub fn to_24_hour(hour: u32, meridiem: Meridiem) -> u32 {
    match (meridiem, hour) {
        (Meridiem::Am, 12) => 0,
        (Meridiem::Am, h) => h,
        (Meridiem::Pm, 12) => 12,
        (Meridiem::Pm, h) => h + 12,
    }
}

pub fn to_12_hour(hour: u32) -> (u32, Meridiem) {
    let meridiem = if hour < 12 { Meridiem::Am } else { Meridiem::Pm };
    let h = match hour % 12 {
        0 => 12,
        h => h,
    };
    (h, meridiem)
}

/// `9 PM`, `9:05 PM`, `12 AM`.
pub fn format_time(hour: u32, minute: u32) -> String {
    let (h, meridiem) = to_12_hour(hour);
    if minute == 0 {
        format!("{h} {meridiem}")
    } else {
        format!("{h}:{minute:02} {meridiem}")
    }
}

/// Always includes minutes: `2:00 PM`, `4:07 AM`.
pub fn format_time_with_minutes(hour: u32, minute: u32) -> String {
    let (h, meridiem) = to_12_hour(hour);
    format!("{h}:{minute:02} {meridiem}")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn midnight_and_noon() {
        assert_eq!(to_24_hour(12, Meridiem::Am), 0);
        assert_eq!(to_24_hour(12, Meridiem::Pm), 12);
        assert_eq!(to_24_hour(11, Meridiem::Pm), 23);
        assert_eq!(to_12_hour(0), (12, Meridiem::Am));
        assert_eq!(to_12_hour(12), (12, Meridiem::Pm));
    }

    #[test]
    fn markers() {
        assert_eq!(Meridiem::from_marker("a.m."), Some(Meridiem::Am));
        assert_eq!(Meridiem::from_marker("PM"), Some(Meridiem::Pm));
        assert_eq!(Meridiem::from_marker("x"), None);
    }

    #[test]
    fn formatting_drops_zero_minutes() {
        assert_eq!(format_time(21, 0), "9 PM");
        assert_eq!(format_time(21, 5), "9:05 PM");
        assert_eq!(format_time(0, 30), "12:30 AM");
        assert_eq!(format_time_with_minutes(14, 0), "2:00 PM");
    }

    proptest! {
        #[test]
        fn twelve_hour_round_trips(hour in 1u32..=12, pm in any::<bool>()) {
            let meridiem = if pm { Meridiem::Pm } else { Meridiem::Am };
            let h24 = to_24_hour(hour, meridiem);
            prop_assert!(h24 < 24);
            prop_assert_eq!(to_12_hour(h24), (hour, meridiem));
        }
    }
}
