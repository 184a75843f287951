use regex::Regex;
use std::sync::OnceLock;

fn punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[.,!?;:'"]"#).expect("static regex"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Normalize entity text: lowercase, drop punctuation, collapse whitespace
pub fn normalize_entity(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = punctuation().replace_all(&lowered, "");
    whitespace().replace_all(stripped.trim(), " ").to_string()
}
