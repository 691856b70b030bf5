//! Team identity resolution: loose names, nicknames, typos and legacy
//! abbreviations all collapse to one canonical [`TeamCode`] per franchise.

use crate::{MAX_TEAMS_PER_PLAYER, TeamCode};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Normalized key (lowercase, alphanumeric only) → canonical code.
const SYNONYMS: &[(&str, &str)] = &[
    // NFC East
    ("washington", "WSH"), ("commanders", "WSH"), ("was", "WSH"), ("wsh", "WSH"),
    ("washingtoncommanders", "WSH"),
    ("cowboys", "DAL"), ("dal", "DAL"), ("dallas", "DAL"), ("dallascowboys", "DAL"),
    ("eagles", "PHI"), ("phi", "PHI"), ("philadelphia", "PHI"), ("philadelphiaeagles", "PHI"),
    ("giants", "NYG"), ("nyg", "NYG"), ("newyorkgiants", "NYG"),
    // NFC North
    ("packers", "GB"), ("gb", "GB"), ("greenbay", "GB"), ("greenbaypackers", "GB"),
    ("bears", "CHI"), ("chi", "CHI"), ("beras", "CHI"), ("chicago", "CHI"), ("chicagobears", "CHI"),
    ("vikings", "MIN"), ("min", "MIN"), ("minnesota", "MIN"), ("minnesotavikings", "MIN"),
    ("lions", "DET"), ("det", "DET"), ("detroit", "DET"), ("detroitlions", "DET"),
    // NFC South
    ("buccaneers", "TB"), ("bucs", "TB"), ("buc", "TB"), ("tb", "TB"), ("tampa", "TB"),
    ("tampabay", "TB"), ("tampabaybuccaneers", "TB"),
    ("saints", "NO"), ("no", "NO"), ("nol", "NO"), ("neworleans", "NO"), ("neworleanssaints", "NO"),
    ("falcons", "ATL"), ("atl", "ATL"), ("atlanta", "ATL"), ("atlantafalcons", "ATL"),
    ("panthers", "CAR"), ("car", "CAR"), ("carolina", "CAR"), ("carolinapanthers", "CAR"),
    // NFC West
    ("49ers", "SF"), ("niners", "SF"), ("sf", "SF"), ("sanfrancisco", "SF"), ("sanfrancisco49ers", "SF"),
    ("rams", "LAR"), ("lar", "LAR"), ("la", "LAR"), ("losangelesrams", "LAR"),
    ("seahawks", "SEA"), ("sea", "SEA"), ("seattle", "SEA"), ("seattleseahawks", "SEA"),
    ("cardinals", "ARI"), ("arizona", "ARI"), ("ari", "ARI"), ("cardinasl", "ARI"),
    ("arizonacardinals", "ARI"),
    // AFC East
    ("bills", "BUF"), ("buf", "BUF"), ("buffalo", "BUF"), ("buffalobills", "BUF"),
    ("patriots", "NE"), ("ne", "NE"), ("newengland", "NE"), ("pats", "NE"), ("newenglandpatriots", "NE"),
    ("dolphins", "MIA"), ("mia", "MIA"), ("miami", "MIA"), ("miamidolphins", "MIA"),
    ("jets", "NYJ"), ("nyj", "NYJ"), ("newyorkjets", "NYJ"),
    // AFC North
    ("ravens", "BAL"), ("bal", "BAL"), ("baltimore", "BAL"), ("baltimoreravens", "BAL"),
    ("bengals", "CIN"), ("cin", "CIN"), ("cincinnati", "CIN"), ("cincinnatibengals", "CIN"),
    ("browns", "CLE"), ("cle", "CLE"), ("cleveland", "CLE"), ("clevelandbrowns", "CLE"),
    ("steelers", "PIT"), ("steelesr", "PIT"), ("pit", "PIT"), ("pittsburgh", "PIT"),
    ("pittsburghsteelers", "PIT"),
    // AFC South
    ("colts", "IND"), ("ind", "IND"), ("indy", "IND"), ("indianapolis", "IND"), ("indianapoliscolts", "IND"),
    ("texans", "HOU"), ("hou", "HOU"), ("houston", "HOU"), ("houstontexans", "HOU"),
    ("jaguars", "JAX"), ("jags", "JAX"), ("jax", "JAX"), ("jac", "JAX"), ("jacksonville", "JAX"),
    ("jacksonvillejaguars", "JAX"),
    ("titans", "TEN"), ("ten", "TEN"), ("tennessee", "TEN"), ("tennesseetitans", "TEN"),
    // AFC West
    ("chiefs", "KC"), ("cheifs", "KC"), ("kc", "KC"), ("kansascity", "KC"), ("kansascitychiefs", "KC"),
    ("broncos", "DEN"), ("den", "DEN"), ("denver", "DEN"), ("denverbroncos", "DEN"),
    ("chargers", "LAC"), ("lac", "LAC"), ("sd", "LAC"), ("sandiego", "LAC"), ("losangeleschargers", "LAC"),
    ("raiders", "LV"), ("lv", "LV"), ("vegas", "LV"), ("oak", "LV"), ("oakland", "LV"),
    ("lasvegas", "LV"), ("lasvegasraiders", "LV"),
];

/// Relocated franchises and alternate feed abbreviations, by canonical code.
const LEGACY_ALIASES: &[(&str, &[&str])] = &[
    ("WSH", &["WAS", "WSH"]),
    ("LAC", &["LAC", "SD"]),
    ("LAR", &["LAR", "LA", "STL"]),
    ("LV", &["LV", "OAK"]),
    ("JAX", &["JAX", "JAC"]),
    ("ARI", &["ARI", "ARZ"]),
    ("BAL", &["BAL", "BLT"]),
    ("CLE", &["CLE", "CLV"]),
    ("HOU", &["HOU", "HST"]),
];

static SYNONYM_TABLE: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| SYNONYMS.iter().copied().collect());

/// Every canonical code, sorted.
pub fn canonical_codes() -> Vec<TeamCode> {
    let mut codes: Vec<&str> = SYNONYMS.iter().map(|(_, code)| *code).collect();
    codes.sort_unstable();
    codes.dedup();
    codes.into_iter().map(TeamCode::new).collect()
}

pub fn is_canonical(code: &TeamCode) -> bool {
    SYNONYMS.iter().any(|(_, c)| *c == code.as_str())
}

fn normalize_key(token: &str) -> String {
    token
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolve a free-text team reference to its canonical code.
///
/// Unknown 2–4 character abbreviations are passed through uppercased, so the
/// result is not guaranteed to be one of the 32 real codes.
pub fn resolve(token: &str) -> Option<TeamCode> {
    let key = normalize_key(token);
    if key.is_empty() {
        return None;
    }
    if let Some(code) = SYNONYM_TABLE.get(key.as_str()) {
        return Some(TeamCode::new(*code));
    }

    let raw = token.trim();
    if !(2..=4).contains(&raw.len()) || !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let upper = raw.to_ascii_uppercase();
    let canonical: &str = LEGACY_ALIASES
        .iter()
        .find(|(_, variants)| variants.contains(&upper.as_str()))
        .map(|(canon, _)| *canon)
        .unwrap_or(upper.as_str());
    Some(TeamCode::new(canonical))
}

/// Parse "chiefs, bills 49ers" into at most four distinct codes, first-seen order.
pub fn parse_list(input: &str) -> Vec<TeamCode> {
    dedupe_capped(
        input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .filter_map(resolve),
    )
}

fn dedupe_capped(codes: impl Iterator<Item = TeamCode>) -> Vec<TeamCode> {
    let mut out: Vec<TeamCode> = Vec::with_capacity(MAX_TEAMS_PER_PLAYER);
    for code in codes {
        if out.len() == MAX_TEAMS_PER_PLAYER {
            break;
        }
        if !out.contains(&code) {
            out.push(code);
        }
    }
    out
}

/// Serde hook for persisted rosters: re-resolve, dedupe and cap at four.
pub(crate) fn deserialize_roster<'de, D>(deserializer: D) -> Result<Vec<TeamCode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(dedupe_capped(raw.iter().filter_map(|t| resolve(t))))
}
