//! Data structures and types for resolvarr
//!
//! Contains all shared models used across the crate organized by domain:
//! - **Providers**: debrid vendor keys and capabilities
//! - **Sources**: candidate descriptors handed over by scrapers
//! - **Packs**: transient multi-file torrent/NZB contents
//! - **Cache**: hash-availability verdicts
//! - **Resolution**: outcome of resolving a candidate

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

// =============================================================================
// Provider Models
// =============================================================================

/// Debrid vendor identifier. Closed set; the display name, enabled flag and
/// adapter constructor are associated 1:1 through the registry in `debrid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKey {
    Rd,
    Pm,
    Ad,
    Tb,
    Oc,
    Ed,
}

impl ProviderKey {
    /// All known providers, registry order.
    pub const ALL: [ProviderKey; 6] = [
        ProviderKey::Rd,
        ProviderKey::Pm,
        ProviderKey::Ad,
        ProviderKey::Tb,
        ProviderKey::Oc,
        ProviderKey::Ed,
    ];

    /// Short settings key (e.g. "rd")
    pub fn short(&self) -> &'static str {
        match self {
            ProviderKey::Rd => "rd",
            ProviderKey::Pm => "pm",
            ProviderKey::Ad => "ad",
            ProviderKey::Tb => "tb",
            ProviderKey::Oc => "oc",
            ProviderKey::Ed => "ed",
        }
    }

    /// Human-readable vendor name
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKey::Rd => "real-debrid",
            ProviderKey::Pm => "premiumize.me",
            ProviderKey::Ad => "alldebrid",
            ProviderKey::Tb => "torbox",
            ProviderKey::Oc => "offcloud",
            ProviderKey::Ed => "easydebrid",
        }
    }

    /// Parse from either the short key or the display name
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.short() == s || p.display_name() == s)
    }

    /// Vendors that can unrestrict plain hoster links (not just torrents)
    pub fn is_hoster_capable(&self) -> bool {
        matches!(self, ProviderKey::Rd | ProviderKey::Pm | ProviderKey::Ad)
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// =============================================================================
// Source Models
// =============================================================================

/// Where a candidate came from, which decides the resolution branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Produced by an external scraping provider; needs a debrid vendor to
    /// turn the magnet/NZB into a link
    ExternalScraper,
    /// Already lives in a debrid vendor's cloud; resolution is one vendor call
    DebridCloud(ProviderKey),
    /// Local library reference (direct path or `.strm` pointer file)
    LocalFolders,
    /// Plain hoster URL, optionally unrestrictable
    HosterDirect,
}

/// Pack granularity of a torrent/NZB candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackKind {
    Season,
    Show,
}

/// What a scrape/cache-read request is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackScope {
    Single,
    Season,
    Show,
}

/// Variant of a cloud item link, used by vendors that distinguish how the
/// item landed in the cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectLinkKind {
    Link,
    Usenet,
    Webdl,
}

/// One playable-media candidate. Owned by the request that created it and
/// never shared across concurrent resolutions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub provenance: Provenance,
    /// Debrid vendor this candidate resolves through (external sources)
    pub provider: Option<ProviderKey>,
    /// Magnet URI, NZB reference or direct URL
    pub url: String,
    /// 40-char lowercase hex info-hash, when torrent-backed
    pub hash: Option<String>,
    /// Release name as scraped
    pub name: String,
    /// Cleaned name for display
    pub display_name: String,
    pub quality: Quality,
    /// Extra codec/audio/HDR annotations, pipe-joined
    pub info: String,
    pub size_bytes: u64,
    pub seeders: u32,
    /// Set when the candidate is a multi-episode pack
    pub package: Option<PackKind>,
    /// Episode range covered by a partial season pack
    pub episode_start: Option<u32>,
    pub episode_end: Option<u32>,
    /// Last season covered by a show pack
    pub last_season: Option<u32>,
    /// The scraper already reported a true per-item size; skip the divider
    pub true_size: bool,
    /// Opaque cloud item id for debrid-cloud sources
    pub cloud_id: Option<String>,
    /// Pre-resolved direct link for debrid-cloud sources
    pub url_dl: Option<String>,
    /// Whether `url_dl` should be used as-is instead of unrestricting
    pub direct_debrid_link: bool,
    pub direct_kind: Option<DirectLinkKind>,
}

impl Source {
    /// A bare external torrent candidate, the common scraper output
    pub fn external_torrent(
        provider: ProviderKey,
        url: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            provenance: Provenance::ExternalScraper,
            provider: Some(provider),
            url: url.into(),
            hash: Some(hash.into()),
            name: String::new(),
            display_name: String::new(),
            quality: Quality::Unknown,
            info: String::new(),
            size_bytes: 0,
            seeders: 0,
            package: None,
            episode_start: None,
            episode_end: None,
            last_season: None,
            true_size: false,
            cloud_id: None,
            url_dl: None,
            direct_debrid_link: false,
            direct_kind: None,
        }
    }

    /// Whether the locator is torrent-shaped (magnet URI or known info-hash)
    pub fn is_torrent(&self) -> bool {
        self.url.starts_with("magnet:") || self.hash.is_some()
    }

    /// Generate a magnet URI from the hash and a display name
    pub fn to_magnet(&self, display_name: &str) -> Option<String> {
        self.hash.as_ref().map(|h| {
            format!(
                "magnet:?xt=urn:btih:{}&dn={}",
                h,
                urlencoding::encode(display_name)
            )
        })
    }

    /// Per-episode size estimate: pack totals are amortized over the divider
    /// that is current *now*, never the one in effect when the entry was
    /// cached. Sources flagged `true_size` already carry a per-item size.
    pub fn per_unit_size(&self, meta: &MediaIdentity) -> u64 {
        match self.package {
            Some(kind) if !self.true_size => {
                let divider = meta.divider_for(kind).max(1);
                self.size_bytes / divider as u64
            }
            _ => self.size_bytes,
        }
    }

    /// Format size for display
    pub fn format_size(&self) -> String {
        format_bytes(self.size_bytes)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.quality,
            self.format_size(),
            self.display_name
        )
    }
}

// =============================================================================
// Media Identity
// =============================================================================

/// Media type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Episode,
}

/// Validated identity of the media being requested. Produced by the metadata
/// layer (out of scope here) and handed in alongside candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaIdentity {
    pub media_type: MediaType,
    pub title: String,
    pub year: u16,
    pub imdb_id: String,
    pub tmdb_id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub ep_name: Option<String>,
    /// Alternative titles consulted by the extras filter
    pub aliases: Vec<String>,
    /// Episodes aired in the requested season (season-pack divider)
    pub season_episode_count: u32,
    /// Total episodes aired across the show (show-pack divider)
    pub show_episode_count: u32,
    pub total_seasons: u32,
}

impl MediaIdentity {
    pub fn movie(title: impl Into<String>, year: u16, imdb_id: impl Into<String>) -> Self {
        Self {
            media_type: MediaType::Movie,
            title: title.into(),
            year,
            imdb_id: imdb_id.into(),
            tmdb_id: String::new(),
            season: None,
            episode: None,
            ep_name: None,
            aliases: Vec::new(),
            season_episode_count: 1,
            show_episode_count: 1,
            total_seasons: 0,
        }
    }

    pub fn episode(
        title: impl Into<String>,
        imdb_id: impl Into<String>,
        season: u32,
        episode: u32,
    ) -> Self {
        Self {
            media_type: MediaType::Episode,
            title: title.into(),
            year: 0,
            imdb_id: imdb_id.into(),
            tmdb_id: String::new(),
            season: Some(season),
            episode: Some(episode),
            ep_name: None,
            aliases: Vec::new(),
            season_episode_count: 1,
            show_episode_count: 1,
            total_seasons: 0,
        }
    }

    pub fn is_episode(&self) -> bool {
        self.media_type == MediaType::Episode
    }

    /// Episode-count divider used to amortize a pack's total size
    pub fn divider_for(&self, kind: PackKind) -> u32 {
        match kind {
            PackKind::Season => self.season_episode_count,
            PackKind::Show => self.show_episode_count,
        }
    }
}

// =============================================================================
// Pack Models
// =============================================================================

/// Entry inside a multi-file torrent/NZB pack. Produced transiently while
/// resolving; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackFile {
    pub filename: String,
    pub size_bytes: u64,
    /// Vendor-specific link token, fed to the unrestriction call
    pub link: String,
    /// Transfer/torrent id of the enumeration transfer, for cleanup
    pub transfer_id: Option<String>,
}

impl fmt::Display for PackFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.filename, format_bytes(self.size_bytes))
    }
}

/// Status of an in-flight NZB transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NzbStatus {
    /// 0.0 - 1.0
    pub progress: f32,
    pub eta: Option<String>,
    pub state: String,
    pub files: Vec<PackFile>,
}

impl NzbStatus {
    pub fn is_ready(&self) -> bool {
        !self.files.is_empty()
    }
}

impl fmt::Display for NzbStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.0}%){}",
            self.state.to_uppercase(),
            self.progress * 100.0,
            self.eta
                .as_deref()
                .map(|e| format!(" ETA {}", e))
                .unwrap_or_default()
        )
    }
}

// =============================================================================
// Cache Models
// =============================================================================

/// One hash-availability observation. Immutable once recorded; a fresher
/// verdict supersedes rather than mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheVerdict {
    pub hash: String,
    pub provider: ProviderKey,
    pub cached: bool,
    pub recorded_at: u64,
}

impl CacheVerdict {
    pub fn new(hash: impl Into<String>, provider: ProviderKey) -> Self {
        Self {
            hash: hash.into(),
            provider,
            cached: true,
            recorded_at: unix_now(),
        }
    }
}

/// Current unix time in seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Normalize an info-hash to the canonical lowercase form
pub fn normalize_hash(hash: &str) -> String {
    hash.trim().to_lowercase()
}

/// Whether a string is a well-formed 40-char hex info-hash
pub fn is_info_hash(s: &str) -> bool {
    s.len() == 40 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

// =============================================================================
// Quality Models
// =============================================================================

/// Video quality classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Quality {
    UHD4K,
    FHD1080p,
    HD720p,
    SD,
    #[default]
    Unknown,
}

impl Quality {
    /// Quality ranking for sorting (higher = better)
    pub fn rank(&self) -> u8 {
        match self {
            Quality::UHD4K => 4,
            Quality::FHD1080p => 3,
            Quality::HD720p => 2,
            Quality::SD => 1,
            Quality::Unknown => 0,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::UHD4K => write!(f, "4K"),
            Quality::FHD1080p => write!(f, "1080p"),
            Quality::HD720p => write!(f, "720p"),
            Quality::SD => write!(f, "SD"),
            Quality::Unknown => write!(f, "???"),
        }
    }
}

impl Ord for Quality {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Quality {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Running per-request quality histogram for UI summaries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityTally {
    pub uhd_4k: u32,
    pub fhd_1080p: u32,
    pub hd_720p: u32,
    pub sd: u32,
    pub total: u32,
}

impl QualityTally {
    pub fn bump(&mut self, quality: Quality) {
        match quality {
            Quality::UHD4K => self.uhd_4k += 1,
            Quality::FHD1080p => self.fhd_1080p += 1,
            Quality::HD720p => self.hd_720p += 1,
            // unknowns count as SD, matching the summary buckets
            Quality::SD | Quality::Unknown => self.sd += 1,
        }
        self.total += 1;
    }
}

impl fmt::Display for QualityTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "4K: {} | 1080p: {} | 720p: {} | SD: {} | total: {}",
            self.uhd_4k, self.fhd_1080p, self.hd_720p, self.sd, self.total
        )
    }
}

// =============================================================================
// Resolution Outcome
// =============================================================================

/// Result of resolving one candidate. Failures collapse into `NotAvailable`
/// so the caller can move on to the next candidate; causes are logged at the
/// failure site.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Final playable URL
    Url(String),
    /// Pack needs interactive selection; filtered file list attached
    Selection(Vec<PackFile>),
    /// Nothing usable from this candidate
    NotAvailable,
}

impl Resolution {
    pub fn is_available(&self) -> bool {
        !matches!(self, Resolution::NotAvailable)
    }

    pub fn url(self) -> Option<String> {
        match self {
            Resolution::Url(u) => Some(u),
            _ => None,
        }
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Format a byte count for display
pub fn format_bytes(bytes: u64) -> String {
    const GB: u64 = 1024 * 1024 * 1024;
    const MB: u64 = 1024 * 1024;
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.0} MB", bytes as f64 / MB as f64)
    } else {
        format!("{} KB", bytes / 1024)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // ProviderKey Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_provider_key_parse() {
        assert_eq!(ProviderKey::parse("rd"), Some(ProviderKey::Rd));
        assert_eq!(ProviderKey::parse("real-debrid"), Some(ProviderKey::Rd));
        assert_eq!(ProviderKey::parse("TORBOX"), Some(ProviderKey::Tb));
        assert_eq!(ProviderKey::parse("premiumize.me"), Some(ProviderKey::Pm));
        assert_eq!(ProviderKey::parse("nope"), None);
    }

    #[test]
    fn test_provider_key_display() {
        assert_eq!(ProviderKey::Rd.to_string(), "real-debrid");
        assert_eq!(ProviderKey::Ed.to_string(), "easydebrid");
    }

    #[test]
    fn test_hoster_capable() {
        assert!(ProviderKey::Rd.is_hoster_capable());
        assert!(ProviderKey::Pm.is_hoster_capable());
        assert!(ProviderKey::Ad.is_hoster_capable());
        assert!(!ProviderKey::Tb.is_hoster_capable());
        assert!(!ProviderKey::Oc.is_hoster_capable());
    }

    // -------------------------------------------------------------------------
    // Hash Helpers
    // -------------------------------------------------------------------------

    #[test]
    fn test_normalize_hash() {
        assert_eq!(
            normalize_hash(" ABCDEF0123456789ABCDEF0123456789ABCDEF01 "),
            "abcdef0123456789abcdef0123456789abcdef01"
        );
    }

    #[test]
    fn test_is_info_hash() {
        assert!(is_info_hash("abcdef0123456789abcdef0123456789abcdef01"));
        assert!(!is_info_hash("abcdef"));
        assert!(!is_info_hash("zzzzzz0123456789abcdef0123456789abcdef01"));
    }

    // -------------------------------------------------------------------------
    // Source Tests
    // -------------------------------------------------------------------------

    fn episode_meta() -> MediaIdentity {
        let mut meta = MediaIdentity::episode("Some Show", "tt0000001", 1, 3);
        meta.season_episode_count = 8;
        meta.show_episode_count = 24;
        meta
    }

    #[test]
    fn test_per_unit_size_season_pack() {
        // 10 GB season pack over 8 aired episodes => 1.25 GB per episode
        let mut source = Source::external_torrent(
            ProviderKey::Rd,
            "magnet:?xt=urn:btih:abc",
            "abcdef0123456789abcdef0123456789abcdef01",
        );
        source.package = Some(PackKind::Season);
        source.size_bytes = 10 * 1024 * 1024 * 1024;

        let per_ep = source.per_unit_size(&episode_meta());
        assert_eq!(per_ep, 10 * 1024 * 1024 * 1024 / 8);
        assert_eq!(format_bytes(per_ep), "1.25 GB");
    }

    #[test]
    fn test_per_unit_size_show_pack() {
        let mut source = Source::external_torrent(
            ProviderKey::Rd,
            "magnet:?xt=urn:btih:abc",
            "abcdef0123456789abcdef0123456789abcdef01",
        );
        source.package = Some(PackKind::Show);
        source.size_bytes = 24 * 1024 * 1024 * 1024;

        assert_eq!(source.per_unit_size(&episode_meta()), 1024 * 1024 * 1024);
    }

    #[test]
    fn test_per_unit_size_respects_true_size() {
        let mut source = Source::external_torrent(
            ProviderKey::Rd,
            "magnet:?xt=urn:btih:abc",
            "abcdef0123456789abcdef0123456789abcdef01",
        );
        source.package = Some(PackKind::Season);
        source.true_size = true;
        source.size_bytes = 1024;

        assert_eq!(source.per_unit_size(&episode_meta()), 1024);
    }

    #[test]
    fn test_per_unit_size_single() {
        let mut source = Source::external_torrent(
            ProviderKey::Rd,
            "magnet:?xt=urn:btih:abc",
            "abcdef0123456789abcdef0123456789abcdef01",
        );
        source.size_bytes = 4096;
        assert_eq!(source.per_unit_size(&episode_meta()), 4096);
    }

    #[test]
    fn test_to_magnet() {
        let source = Source::external_torrent(
            ProviderKey::Rd,
            "",
            "abcdef0123456789abcdef0123456789abcdef01",
        );
        let magnet = source.to_magnet("The Batman (2022)").unwrap();
        assert!(magnet.starts_with("magnet:?xt=urn:btih:abcdef"));
        assert!(magnet.contains("dn=The%20Batman%20%282022%29"));
    }

    #[test]
    fn test_is_torrent() {
        let source = Source::external_torrent(
            ProviderKey::Rd,
            "magnet:?xt=urn:btih:abc",
            "abcdef0123456789abcdef0123456789abcdef01",
        );
        assert!(source.is_torrent());

        let mut hoster = Source::external_torrent(ProviderKey::Rd, "https://host/file", "x");
        hoster.hash = None;
        assert!(!hoster.is_torrent());
    }

    // -------------------------------------------------------------------------
    // Quality Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_quality_ordering() {
        assert!(Quality::UHD4K > Quality::FHD1080p);
        assert!(Quality::FHD1080p > Quality::HD720p);
        assert!(Quality::HD720p > Quality::SD);
        assert!(Quality::SD > Quality::Unknown);
    }

    #[test]
    fn test_quality_tally() {
        let mut tally = QualityTally::default();
        tally.bump(Quality::UHD4K);
        tally.bump(Quality::FHD1080p);
        tally.bump(Quality::FHD1080p);
        tally.bump(Quality::Unknown);

        assert_eq!(tally.uhd_4k, 1);
        assert_eq!(tally.fhd_1080p, 2);
        assert_eq!(tally.sd, 1); // unknown buckets as SD
        assert_eq!(tally.total, 4);
    }

    // -------------------------------------------------------------------------
    // Formatting Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(10 * 1024 * 1024 * 1024), "10.00 GB");
        assert_eq!(format_bytes(890 * 1024 * 1024), "890 MB");
        assert_eq!(format_bytes(5 * 1024), "5 KB");
    }

    #[test]
    fn test_pack_file_display() {
        let file = PackFile {
            filename: "Show.S01E03.mkv".to_string(),
            size_bytes: 2 * 1024 * 1024 * 1024,
            link: "token".to_string(),
            transfer_id: None,
        };
        assert_eq!(file.to_string(), "Show.S01E03.mkv (2.00 GB)");
    }

    #[test]
    fn test_nzb_status_ready() {
        let mut status = NzbStatus {
            progress: 0.4,
            eta: Some("2m".to_string()),
            state: "downloading".to_string(),
            files: vec![],
        };
        assert!(!status.is_ready());
        assert_eq!(status.to_string(), "DOWNLOADING (40%) ETA 2m");

        status.files.push(PackFile {
            filename: "a.mkv".to_string(),
            size_bytes: 1,
            link: "l".to_string(),
            transfer_id: None,
        });
        assert!(status.is_ready());
    }

    // -------------------------------------------------------------------------
    // Resolution Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_resolution_accessors() {
        assert!(Resolution::Url("http://x".to_string()).is_available());
        assert!(!Resolution::NotAvailable.is_available());
        assert_eq!(
            Resolution::Url("http://x".to_string()).url(),
            Some("http://x".to_string())
        );
        assert_eq!(Resolution::NotAvailable.url(), None);
    }

    // -------------------------------------------------------------------------
    // Serde Round-Trip (interchange contract: all named fields survive)
    // -------------------------------------------------------------------------

    #[test]
    fn test_source_serde_round_trip() {
        let mut source = Source::external_torrent(
            ProviderKey::Ad,
            "magnet:?xt=urn:btih:abc",
            "abcdef0123456789abcdef0123456789abcdef01",
        );
        source.package = Some(PackKind::Season);
        source.episode_start = Some(5);
        source.episode_end = Some(8);
        source.size_bytes = 123;

        let json = serde_json::to_string(&source).unwrap();
        let back: Source = serde_json::from_str(&json).unwrap();
        assert_eq!(back.provider, Some(ProviderKey::Ad));
        assert_eq!(back.package, Some(PackKind::Season));
        assert_eq!(back.episode_start, Some(5));
        assert_eq!(back.episode_end, Some(8));
        assert_eq!(
            back.hash.as_deref(),
            Some("abcdef0123456789abcdef0123456789abcdef01")
        );
    }
}
