//! Curated route catalog backing the picker keyboards.

/// A pickable city with its IATA code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct City {
    pub label: &'static str,
    pub code: &'static str,
}

/// Popular directions offered in the pickers. MOW is the metropolitan code
/// covering all Moscow airports.
pub const CITIES: &[City] = &[
    City { label: "🇺🇿 Tashkent", code: "TAS" },
    City { label: "🇺🇿 Samarkand", code: "SKD" },
    City { label: "🇷🇺 Moscow", code: "MOW" },
    City { label: "🇷🇺 St. Petersburg", code: "LED" },
    City { label: "🇦🇪 Dubai", code: "DXB" },
    City { label: "🇹🇷 Istanbul", code: "IST" },
    City { label: "🇬🇪 Tbilisi", code: "TBS" },
    City { label: "🇰🇿 Almaty", code: "ALA" },
    City { label: "🇰🇿 Astana", code: "NQZ" },
];

/// Cities offered as destinations, excluding the already-chosen origin.
pub fn destinations_excluding(origin: &str) -> Vec<&'static City> {
    CITIES.iter().filter(|c| c.code != origin).collect()
}
