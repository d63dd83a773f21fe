//! Track id lookup

/// Track names indexed by the session packet's `trackId`
const TRACK_NAMES: [&str; 25] = [
    "Melbourne",
    "Paul Ricard",
    "Shanghai",
    "Sakhir (Bahrain)",
    "Catalunya",
    "Monaco",
    "Montreal",
    "Silverstone",
    "Hockenheim",
    "Hungaroring",
    "Spa",
    "Monza",
    "Singapore",
    "Suzuka",
    "Abu Dhabi",
    "Texas",
    "Brazil",
    "Austria",
    "Sochi",
    "Mexico",
    "Baku (Azerbaijan)",
    "Sakhir Short",
    "Silverstone Short",
    "Texas Short",
    "Suzuka Short",
];

/// Human-readable name for a track id; `-1` and out-of-range ids are "Unknown"
pub fn track_name(track_id: i8) -> &'static str {
    usize::try_from(track_id).ok().and_then(|i| TRACK_NAMES.get(i).copied()).unwrap_or("Unknown")
}
