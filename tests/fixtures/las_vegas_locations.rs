//! Real Las Vegas / Henderson locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap via Overpass API.
//! These are real, routable locations that work with OSRM Nevada data.

use route_optimizer::Location;

/// A named place with coordinates, usable in `const` tables.
#[derive(Debug, Clone, Copy)]
pub struct Place {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Place {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn location(&self) -> Location {
        Location::new(self.name, self.lat, self.lng)
    }
}

// ============================================================================
// Major Casinos / Hotels (good for start/end locations)
// ============================================================================

pub const CASINOS: &[Place] = &[
    Place::new("Wynn Las Vegas", 36.1263781, -115.1658180),
    Place::new("Encore at Wynn", 36.1289345, -115.1653620),
    Place::new("MGM Grand", 36.1023654, -115.1688720),
    Place::new("Bellagio", 36.1126, -115.1767),
    Place::new("Caesars Palace", 36.1162, -115.1745),
    Place::new("Longhorn Casino", 36.1070664, -115.0591256),
];

// ============================================================================
// Las Vegas Strip Area Restaurants
// ============================================================================

pub const STRIP_RESTAURANTS: &[Place] = &[
    Place::new("Hard Rock Cafe", 36.1041592, -115.1722166),
    Place::new("SW Steakhouse", 36.1262145, -115.1669146),
    Place::new("Sinatra", 36.1300035, -115.1654850),
    Place::new("Public House", 36.1219193, -115.1689317),
    Place::new("Brooklyn Bowl", 36.1175388, -115.1695094),
    Place::new("Gordon Ramsay BurGR", 36.1107195, -115.1720818),
    Place::new("Spago by Wolfgang Puck", 36.1139368, -115.1741462),
    Place::new("Guy Fieri's Vegas Kitchen", 36.1184064, -115.1722088),
    Place::new("Otto Pizzeria", 36.1231219, -115.1684514),
    Place::new("Rao's", 36.1163982, -115.1763053),
    Place::new("Il Fornaio", 36.1024474, -115.1740110),
    Place::new("Strip Steak", 36.0908722, -115.1776176),
];

// ============================================================================
// Henderson / East Las Vegas Area
// ============================================================================

pub const HENDERSON_LOCATIONS: &[Place] = &[
    Place::new("I Love Sushi Henderson", 35.9916660, -115.1028343),
    Place::new("Islander's Grill", 36.0335058, -114.9856162),
    Place::new("Naga", 36.0137634, -114.9928676),
    Place::new("Green Valley Ranch Area", 36.0308, -115.0825),
    Place::new("Sunset Station Area", 36.0614, -115.0631),
];

/// Wynn to MGM Grand with `waypoints` Strip restaurants in between.
pub fn strip_tour(waypoints: usize) -> Vec<Location> {
    let mut tour = Vec::with_capacity(waypoints + 2);
    tour.push(CASINOS[0].location());
    tour.extend(STRIP_RESTAURANTS.iter().take(waypoints).map(Place::location));
    tour.push(CASINOS[2].location());
    tour
}

/// Twelve locations spread across the metro area, in no useful order.
pub fn geographically_diverse_locations() -> Vec<Location> {
    vec![
        Place::new("Beers and Bets", 36.1428945, -115.1573836).location(),
        Place::new("Islander's Grill", 36.0335058, -114.9856162).location(),
        Place::new("Wynn Las Vegas", 36.1263781, -115.1658180).location(),
        Place::new("Budget Suites South", 36.0366259, -115.1713361).location(),
        Place::new("Bellagio", 36.1126, -115.1767).location(),
        Place::new("Sunset Station Area", 36.0614, -115.0631).location(),
        Place::new("MGM Grand", 36.1023654, -115.1688720).location(),
        Place::new("Rivas Mexican Grill North", 36.1450055, -115.0482587).location(),
        Place::new("Bootlegger Bistro", 36.0492047, -115.1715744).location(),
        Place::new("Longhorn Casino", 36.1070664, -115.0591256).location(),
        Place::new("Green Valley Ranch Area", 36.0308, -115.0825).location(),
        Place::new("I Love Sushi Henderson", 35.9916660, -115.1028343).location(),
    ]
}
