//! Friendly names for the subject abbreviations used by Dutch secondary schools.

use std::collections::HashMap;
use std::sync::OnceLock;

static SUBJECTS: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

const SUBJECT_TABLE: &[(&str, &str)] = &[
    ("ak", "Aardrijkskunde"),
    ("beco", "Bedrijfseconomie"),
    ("bi", "Biologie"),
    ("biol", "Biologie"),
    ("bio", "Biologie"),
    ("bsm", "Bewegen, Sport en Maatschappij"),
    ("bv", "Beeldende Vorming"),
    ("bwi", "Bouwen, Wonen en Interieur"),
    ("ckv", "Culturele en Kunstzinnige Vorming"),
    ("cm", "Cultuur en Maatschappij"),
    ("die", "Diëtetiek"),
    ("du", "Duits"),
    ("dutl", "Duitse taal en literatuur"),
    ("ec", "Economie"),
    ("eco", "Economie"),
    ("econ", "Economie"),
    ("em", "Economie en Maatschappij"),
    ("en", "Engels"),
    ("entl", "Engelse taal en literatuur"),
    ("eo", "Economie en Ondernemen"),
    ("fa", "Frans"),
    ("fatl", "Franse taal en literatuur"),
    ("fi", "Filosofie"),
    ("fil", "Filosofie"),
    ("filo", "Filosofie"),
    ("gd", "Godsdienst"),
    ("gds", "Godsdienst"),
    ("ges", "Geschiedenis"),
    ("gs", "Geschiedenis"),
    ("gr", "Grieks"),
    ("grtl", "Griekse taal en literatuur"),
    ("in", "Informatica"),
    ("kc", "Kunst en Cultuur"),
    ("kcv", "Kunst en Culturele Vorming"),
    ("la", "Latijn"),
    ("latl", "Latijnse taal en literatuur"),
    ("lo", "Lichamelijke Opvoeding"),
    ("lob", "Loopbaanoriëntatie"),
    ("ma", "Maatschappijleer"),
    ("maat", "Maatschappijleer"),
    ("maw", "Maatschappijwetenschappen"),
    ("mu", "Muziek"),
    ("na", "Natuurkunde"),
    ("nat", "Natuurkunde"),
    ("nlt", "Natuur, Leven en Technologie"),
    ("ne", "Nederlands"),
    ("netl", "Nederlandse taal en literatuur"),
    ("nask", "Natuur- en Scheikunde"),
    ("nsk", "Natuur- en Scheikunde"),
    ("rek", "Rekenen"),
    ("sk", "Scheikunde"),
    ("schk", "Scheikunde"),
    ("wi", "Wiskunde"),
    ("wisa", "Wiskunde A"),
    ("wisb", "Wiskunde B"),
    ("wisc", "Wiskunde C"),
    ("wisd", "Wiskunde D"),
    ("zw", "Zorg en Welzijn"),
];

fn subjects() -> &'static HashMap<&'static str, &'static str> {
    SUBJECTS.get_or_init(|| SUBJECT_TABLE.iter().copied().collect())
}

/// Look up the display name of a subject code, case-insensitively.
/// Unknown codes are returned lower-cased with the first letter capitalized.
pub fn friendly_name(code: &str) -> String {
    let lower = code.to_lowercase();
    match subjects().get(lower.as_str()) {
        Some(name) => name.to_string(),
        None => capitalize(&lower),
    }
}

pub fn friendly_names(codes: &[String]) -> Vec<String> {
    codes.iter().map(|code| friendly_name(code)).collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
