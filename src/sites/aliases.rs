//! Location aliases between the site metadata table and recorder site ids.

/// Metadata location name to the name used in recorder site ids.
pub static LOCATION_ALIASES: &[(&str, &str)] = &[
    ("sq260", "sq2601"),
    ("mangrove", "mangroves"),
    ("palma", "lapalma"),
    ("elsi", "elsicroc"),
    ("rancho", "ranchobajo"),
    ("miramar", "mirenmar"),
    ("nuevo", "rionuevo"),
    ("gamba", "lagamba"),
    ("tarde", "latarde"),
    ("lareserva", "indigenousreserve"),
    ("sendero", "golfito"),
];

/// Map a normalised metadata location to its recorder-side name.
///
/// Locations without an alias are returned unchanged.
pub fn canonical_location(location: &str) -> &str {
    LOCATION_ALIASES
        .iter()
        .find(|(from, _)| *from == location)
        .map_or(location, |(_, to)| to)
}
