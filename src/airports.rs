//! Directory of supported airports

use chrono_tz::Tz;

/// A supported airport
#[derive(Debug, Clone, Copy)]
pub struct Airport {
    pub code: &'static str,
    /// Full name used as the geocoding query
    pub name: &'static str,
    pub timezone: Tz,
}

const AIRPORTS: &[Airport] = &[
    Airport {
        code: "RUH",
        name: "King Khalid International Airport, Riyadh, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "JED",
        name: "King Abdulaziz International Airport, Jeddah, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "DMM",
        name: "King Fahd International Airport, Dammam, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "MED",
        name: "Prince Mohammad bin Abdulaziz International Airport, Medina, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "TIF",
        name: "Taif Regional Airport, Taif, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "AHB",
        name: "Abha International Airport, Abha, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "ELQ",
        name: "Prince Nayef bin Abdulaziz Regional Airport, Buraidah, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "YNB",
        name: "Yanbu Airport, Yanbu, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "HAS",
        name: "Ha'il Regional Airport, Ha'il, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "EAM",
        name: "Najran Domestic Airport, Najran, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "AQI",
        name: "Al Qaisumah/Hafr Al Batin Airport, Hafr Al Batin, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "GIZ",
        name: "Jizan Regional Airport, Jizan, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "ULH",
        name: "Prince Abdul Majeed bin Abdulaziz Domestic Airport, Al-Ula, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "URY",
        name: "Guriat Domestic Airport, Gurayat, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "TUU",
        name: "Tabuk Regional Airport, Tabuk, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "WAE",
        name: "Wadi Al Dawasir Domestic Airport, Wadi ad-Dawasir, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "RAE",
        name: "Arar Domestic Airport, Arar, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
    Airport {
        code: "DWD",
        name: "Dawadmi Domestic Airport, Dawadmi, Saudi Arabia",
        timezone: chrono_tz::Asia::Riyadh,
    },
];

/// Look up a supported airport by IATA code
#[must_use]
pub fn lookup(code: &str) -> Option<&'static Airport> {
    AIRPORTS.iter().find(|airport| airport.code == code)
}

/// All supported airport codes
pub fn codes() -> impl Iterator<Item = &'static str> {
    AIRPORTS.iter().map(|airport| airport.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_and_unknown() {
        let ruh = lookup("RUH").unwrap();
        assert!(ruh.name.contains("King Khalid"));
        assert_eq!(ruh.timezone, chrono_tz::Asia::Riyadh);
        assert!(lookup("LHR").is_none());
        assert!(lookup("ruh").is_none());
    }

    #[test]
    fn test_codes_are_unique_iata() {
        let codes: Vec<_> = codes().collect();
        assert_eq!(codes.len(), 18);
        for (i, code) in codes.iter().enumerate() {
            assert_eq!(code.len(), 3);
            assert!(!codes[i + 1..].contains(code), "duplicate {code}");
        }
    }
}
