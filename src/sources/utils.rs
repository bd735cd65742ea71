//! Release-name helpers shared by the aggregation cache and the resolver
//!
//! Filename-level filters (video extensions, episode matching, extras) and
//! quality/info classification from release names.

use regex::Regex;

use crate::models::Quality;

/// Playable video containers. `.m2ts` is deliberately absent: BluRay stream
/// containers do not play through debrid HTTP links and are never selectable.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".mkv", ".mp4", ".avi", ".m4v", ".mov", ".mpg", ".mpeg", ".ts", ".webm", ".wmv", ".flv",
];

/// Containers rejected outright even though they are video
pub const EXCLUDED_CONTAINERS: &[&str] = &[".m2ts"];

/// Filename fragments that mark non-feature extras inside packs
pub const EXTRAS_TOKENS: &[&str] = &[
    "sample",
    "trailer",
    "extras",
    "featurette",
    "behind.the.scenes",
    "deleted.scenes",
    "bloopers",
    "interview",
    "bonus",
    "nced",
    "ncop",
];

/// Whether a filename ends in a playable video extension
pub fn has_video_extension(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Whether a filename uses a rejected container
pub fn has_excluded_container(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    EXCLUDED_CONTAINERS.iter().any(|ext| lower.ends_with(ext))
}

/// Whether a filename matches the requested season/episode.
///
/// Accepts the usual release markers: `S01E03`, `S01.E03`, `1x03`,
/// `Season 1 Episode 3`.
pub fn seas_ep_filter(season: u32, episode: u32, filename: &str) -> bool {
    let pattern = format!(
        r"(?i)(?:s0*{s}[. _-]?e0*{e}(?:\D|$)|\b{s}x0*{e}(?:\D|$)|season[. _-]*0*{s}[. _-]*episode[. _-]*0*{e}(?:\D|$))",
        s = season,
        e = episode
    );
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(filename),
        Err(_) => false,
    }
}

/// Extras tokens to exclude for this title: a token that occurs in the title
/// itself (or an alias) must not disqualify files of that title.
pub fn extras_tokens_for(title: &str, aliases: &[String]) -> Vec<&'static str> {
    let mut haystacks: Vec<String> = vec![title.to_lowercase()];
    haystacks.extend(aliases.iter().map(|a| a.to_lowercase()));
    EXTRAS_TOKENS
        .iter()
        .copied()
        .filter(|token| {
            let plain = token.replace('.', " ");
            !haystacks
                .iter()
                .any(|h| h.contains(token) || h.contains(&plain))
        })
        .collect()
}

/// Whether a filename looks like a non-feature extra
pub fn is_extra(filename: &str, tokens: &[&str]) -> bool {
    let lower = filename.to_lowercase().replace(['_', ' '], ".");
    tokens.iter().any(|t| lower.contains(t))
}

/// Derive a clean display name from a raw release name
pub fn clean_file_name(name: &str) -> String {
    let decoded = urlencoding::decode(name)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| name.to_string());
    let spaced = decoded.replace(['.', '_', '+'], " ");
    let mut out = String::with_capacity(spaced.len());
    let mut last_space = false;
    for c in spaced.chars() {
        if c.is_whitespace() {
            if !last_space && !out.is_empty() {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out.trim().to_string()
}

/// Classify quality and extra annotations from a release name or URL
pub fn get_file_info(name: &str) -> (Quality, Vec<String>) {
    let lower = name.to_lowercase();
    let quality = if lower.contains("2160p") || lower.contains("4k") || lower.contains("uhd") {
        Quality::UHD4K
    } else if lower.contains("1080p") || lower.contains("1080i") {
        Quality::FHD1080p
    } else if lower.contains("720p") {
        Quality::HD720p
    } else if ["480p", "360p", "cam", "telesync", "hdts", "hdcam", "dvdscr"]
        .iter()
        .any(|t| lower.contains(t))
    {
        Quality::SD
    } else {
        Quality::Unknown
    };

    let mut info = Vec::new();
    let tags: &[(&[&str], &str)] = &[
        (&["dolby.vision", "dolby vision", ".dv.", " dv "], "DV"),
        (&["hdr10+", "hdr10plus"], "HDR10+"),
        (&["hdr"], "HDR"),
        (&["remux"], "REMUX"),
        (&["bluray", "blu-ray", "bdrip"], "BLURAY"),
        (&["web-dl", "webdl", "webrip", ".web."], "WEB"),
        (&["hdtv"], "HDTV"),
        (&["hevc", "x265", "h265", "h.265"], "HEVC"),
        (&["av1"], "AV1"),
        (&["x264", "h264", "h.264", "avc"], "AVC"),
        (&["atmos"], "ATMOS"),
        (&["truehd"], "TRUEHD"),
        (&["dts-hd", "dtshd"], "DTS-HD"),
        (&["dts"], "DTS"),
        (&["ddp", "dd+", "eac3", "e-ac3"], "DD+"),
        (&["aac"], "AAC"),
        (&["10bit", "10-bit"], "10BIT"),
        (&["3d"], "3D"),
    ];
    for (needles, label) in tags {
        if needles.iter().any(|n| lower.contains(n)) && !info.contains(&label.to_string()) {
            info.push(label.to_string());
        }
    }
    (quality, info)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Extension Filters
    // -------------------------------------------------------------------------

    #[test]
    fn test_video_extension_allow_list() {
        assert!(has_video_extension("Show.S01E01.1080p.mkv"));
        assert!(has_video_extension("movie.MP4"));
        assert!(!has_video_extension("readme.nfo"));
        assert!(!has_video_extension("subs.srt"));
        // .m2ts is video but excluded from the allow-list
        assert!(!has_video_extension("disc.m2ts"));
    }

    #[test]
    fn test_excluded_container() {
        assert!(has_excluded_container("00001.M2TS"));
        assert!(!has_excluded_container("movie.mkv"));
    }

    // -------------------------------------------------------------------------
    // Episode Matching
    // -------------------------------------------------------------------------

    #[test]
    fn test_seas_ep_filter_sxxeyy() {
        assert!(seas_ep_filter(1, 3, "Show.S01E03.1080p.mkv"));
        assert!(seas_ep_filter(1, 3, "Show.s01.e03.mkv"));
        assert!(seas_ep_filter(10, 12, "Show.S10E12.mkv"));
        assert!(!seas_ep_filter(1, 3, "Show.S01E04.mkv"));
        assert!(!seas_ep_filter(2, 3, "Show.S01E03.mkv"));
    }

    #[test]
    fn test_seas_ep_filter_cross_format() {
        assert!(seas_ep_filter(1, 3, "Show.1x03.mkv"));
        assert!(!seas_ep_filter(1, 3, "Show.1x13.mkv"));
        assert!(seas_ep_filter(4, 7, "Show Season 4 Episode 7.mkv"));
    }

    #[test]
    fn test_seas_ep_filter_no_false_prefix() {
        // E03 must not match E030
        assert!(!seas_ep_filter(1, 3, "Show.S01E030.mkv"));
    }

    // -------------------------------------------------------------------------
    // Extras Filtering
    // -------------------------------------------------------------------------

    #[test]
    fn test_extras_tokens_respect_title() {
        let tokens = extras_tokens_for("The Sample Chronicles", &[]);
        assert!(!tokens.contains(&"sample"));
        assert!(tokens.contains(&"trailer"));
    }

    #[test]
    fn test_is_extra() {
        let tokens = extras_tokens_for("Regular Movie", &[]);
        assert!(is_extra("Regular.Movie.Sample.mkv", &tokens));
        assert!(is_extra("behind the scenes.mkv", &tokens));
        assert!(!is_extra("Regular.Movie.2020.1080p.mkv", &tokens));
    }

    // -------------------------------------------------------------------------
    // Name Cleaning
    // -------------------------------------------------------------------------

    #[test]
    fn test_clean_file_name() {
        assert_eq!(
            clean_file_name("The.Batman.2022.2160p.WEB-DL"),
            "The Batman 2022 2160p WEB-DL"
        );
        assert_eq!(clean_file_name("Some%20Movie_1080p"), "Some Movie 1080p");
        assert_eq!(clean_file_name("  spaced   out  "), "spaced out");
    }

    // -------------------------------------------------------------------------
    // Quality Classification
    // -------------------------------------------------------------------------

    #[test]
    fn test_get_file_info_quality() {
        assert_eq!(get_file_info("Movie.2160p.WEB-DL").0, Quality::UHD4K);
        assert_eq!(get_file_info("Movie.1080p.BluRay").0, Quality::FHD1080p);
        assert_eq!(get_file_info("Movie.720p.HDTV").0, Quality::HD720p);
        assert_eq!(get_file_info("Movie.480p").0, Quality::SD);
        assert_eq!(get_file_info("Movie.HDCAM").0, Quality::SD);
        assert_eq!(get_file_info("Movie.NoMarkers").0, Quality::Unknown);
    }

    #[test]
    fn test_get_file_info_tags() {
        let (_, info) = get_file_info("Movie.2160p.WEB-DL.HDR.HEVC.Atmos");
        assert!(info.contains(&"HDR".to_string()));
        assert!(info.contains(&"HEVC".to_string()));
        assert!(info.contains(&"ATMOS".to_string()));
        assert!(info.contains(&"WEB".to_string()));
    }

    #[test]
    fn test_get_file_info_no_duplicate_tags() {
        let (_, info) = get_file_info("Movie.x265.HEVC.1080p");
        assert_eq!(info.iter().filter(|t| *t == "HEVC").count(), 1);
    }
}
