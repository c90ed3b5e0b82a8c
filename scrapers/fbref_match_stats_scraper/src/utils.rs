use regex::Regex;
use sha2::{Digest, Sha256};

use crate::types::MatchId;

/// Pulls the segment after `/matches/` out of an FBref match report URL.
pub fn extract_match_id(url: &str) -> MatchId {
    let re = Regex::new(r"/matches/([^/?#]+)(?:[/?#]|$)").unwrap();
    re.captures(url)
        .map(|cap| MatchId::Known(cap[1].to_string()))
        .unwrap_or(MatchId::Unknown)
}

/// Names a URL's output files. Pages without a match id fall back to a
/// digest of the URL so they never share a file.
pub fn output_key(match_id: &MatchId, url: &str) -> String {
    match match_id {
        MatchId::Known(id) => sanitize_file_stem(id),
        MatchId::Unknown => {
            let mut hasher = Sha256::new();
            hasher.update(url.as_bytes());
            let digest = format!("{:x}", hasher.finalize());
            format!("{}_{}", match_id, &digest[..12])
        }
    }
}

/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "table".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_match_id() {
        assert_eq!(
            extract_match_id(
                "https://fbref.com/en/matches/07f058d4/Dinamo-Zagreb-Chelsea-September-6-2022-Champions-League"
            ),
            MatchId::Known("07f058d4".to_string())
        );
        assert_eq!(
            extract_match_id("https://fbref.com/en/matches/07f058d4"),
            MatchId::Known("07f058d4".to_string())
        );
        assert_eq!(
            extract_match_id("https://fbref.com/en/matches/07f058d4?lang=en"),
            MatchId::Known("07f058d4".to_string())
        );
    }

    #[test]
    fn test_extract_match_id_unknown() {
        assert_eq!(
            extract_match_id("https://fbref.com/en/comps/8/schedule/Champions-League-Scores-and-Fixtures"),
            MatchId::Unknown
        );
        assert_eq!(extract_match_id("https://fbref.com/en/matches/"), MatchId::Unknown);
        assert_eq!(extract_match_id("not a url"), MatchId::Unknown);
    }

    #[test]
    fn test_output_key() {
        let id = MatchId::Known("07f058d4".to_string());
        assert_eq!(output_key(&id, "https://fbref.com/en/matches/07f058d4/x"), "07f058d4");

        let a = output_key(&MatchId::Unknown, "https://example.com/a.html");
        let b = output_key(&MatchId::Unknown, "https://example.com/b.html");
        assert!(a.starts_with("unknown_"));
        assert_eq!(a.len(), "unknown_".len() + 12);
        assert_ne!(a, b);
        assert_eq!(a, output_key(&MatchId::Unknown, "https://example.com/a.html"));
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("stats_b0b2c2ba_summary"), "stats_b0b2c2ba_summary");
        assert_eq!(sanitize_file_stem("a/b c"), "a_b_c");
        assert_eq!(sanitize_file_stem(""), "table");
    }
}
