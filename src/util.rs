use once_cell::sync::Lazy;
use regex::Regex;

static RELEASE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|beatport\.com/release/.+/)(\d+)$").expect("valid regex"));
static TRACK_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|beatport\.com/track/.+/)(\d+)$").expect("valid regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("valid regex"));
static MEDIUM_INFO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(CD|disc)\s*\d+").expect("valid regex"));
static DISAMBIGUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r" \(\d+\)$").expect("valid regex"));
static TRAILING_ARTICLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.*?), (a|an|the)$").expect("valid regex"));

/// Mask a secret for logging unless `BEATPORT4_DEBUG_DISABLE_REDACTION` is set.
pub fn redact(value: &str) -> String {
    if std::env::var_os("BEATPORT4_DEBUG_DISABLE_REDACTION").is_some() {
        value.to_string()
    } else {
        "<REDACTED>".to_string()
    }
}

/// Extract the numeric release id from a bare id or a beatport.com release URL.
pub fn parse_release_id(input: &str) -> Option<&str> {
    RELEASE_ID
        .captures(input.trim())
        .and_then(|c| c.get(2))
        .map(|m| m.as_str())
}

/// Extract the numeric track id from a bare id or a beatport.com track URL.
pub fn parse_track_id(input: &str) -> Option<&str> {
    TRACK_ID
        .captures(input.trim())
        .and_then(|c| c.get(2))
        .map(|m| m.as_str())
}

/// Punctuation and medium markers ("CD1", "disc 2") make Beatport's search
/// miss otherwise good matches.
pub fn sanitize_release_query(query: &str) -> String {
    let q = NON_WORD.replace_all(query, " ");
    let q = MEDIUM_INFO.replace_all(&q, "");
    q.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "Eb Minor" -> "D#min", "C Major" -> "Cmaj". Anything not shaped like
/// "<note> <major|minor>" yields None.
pub fn normalize_key(key: &str) -> Option<String> {
    let mut parts = key.split(' ');
    let (note, chord) = match (parts.next(), parts.next(), parts.next()) {
        (Some(n), Some(c), None) if !n.is_empty() && c.chars().count() > 2 => (n, c),
        _ => return None,
    };
    let keep = chord.chars().count() - 2;
    let chord: String = chord.chars().take(keep).collect();
    let mut key = format!("{}{}", note, chord).to_lowercase();
    for (flat, sharp) in [("db", "c#"), ("eb", "d#"), ("gb", "f#"), ("ab", "g#"), ("bb", "a#")] {
        key = key.replace(flat, sharp);
    }
    let mut chars = key.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
}

/// Join artist names into one credit string and return the first artist's id.
pub fn join_artists<'a, I>(artists: I) -> (String, Option<String>)
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut artist_id = None;
    let mut names = Vec::new();
    for (id, name) in artists {
        if artist_id.is_none() && !id.is_empty() {
            artist_id = Some(id.to_string());
        }
        let name = DISAMBIGUATION.replace(name, "");
        let name = TRAILING_ARTICLE.replace(&name, "$2 $1");
        names.push(name.into_owned());
    }
    (names.join(", "), artist_id)
}
