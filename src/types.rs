use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFault {
    RefreshFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at_ms: i64,
    pub last_error: Option<TokenFault>,
}

impl Token {
    pub fn new(access_token: String, refresh_token: String, expires_in: u64, now_ms: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at_ms: expiry_ms(now_ms, expires_in),
            last_error: None,
        }
    }

    /// An already expired token carrying only a refresh token. The first
    /// validation exchanges it for a usable access token.
    pub fn from_refresh_token(refresh_token: String) -> Self {
        Self {
            access_token: String::new(),
            refresh_token,
            expires_at_ms: 0,
            last_error: None,
        }
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }

    pub fn apply_refresh(&mut self, response: TokenResponse, now_ms: i64) {
        self.access_token = response.access_token;
        // rotation is optional on the provider side
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = refresh_token;
        }
        self.expires_at_ms = expiry_ms(now_ms, response.expires_in);
        self.last_error = None;
    }
}

// Saturates instead of overflowing on absurd lifetimes
fn expiry_ms(now_ms: i64, expires_in: u64) -> i64 {
    let lifetime_ms = i64::try_from(expires_in)
        .unwrap_or(i64::MAX / 1000)
        .saturating_mul(1000);
    now_ms.saturating_add(lifetime_ms)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PendingSignIn {
    pub code_verifier: String,
    pub csrf_state: String,
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOwner {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackCount {
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Option<Vec<Image>>,
    pub owner: PlaylistOwner,
    pub tracks: TrackCount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumObject {
    pub name: String,
    #[serde(default)]
    pub images: Option<Vec<Image>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackObject {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Named>,
    pub album: AlbumObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTrackItem {
    #[serde(default)]
    pub track: Option<TrackObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub cover_image_url: Option<String>,
    pub owner_name: String,
    pub declared_track_count: u64,
}

impl From<PlaylistObject> for Playlist {
    fn from(raw: PlaylistObject) -> Self {
        let cover_image_url = raw
            .images
            .and_then(|images| images.into_iter().next())
            .map(|image| image.url);
        let owner_name = raw
            .owner
            .display_name
            .or(raw.owner.id)
            .unwrap_or_default();

        Self {
            id: raw.id,
            name: raw.name,
            cover_image_url,
            owner_name,
            declared_track_count: raw.tracks.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub uri: String,
    pub name: String,
    pub artist_names: Vec<String>,
    pub album_name: String,
    pub cover_image_url: Option<String>,
}

impl Track {
    /// Artist names in the form the download backend expects.
    pub fn artist_line(&self) -> String {
        self.artist_names.join(";")
    }
}

impl From<TrackObject> for Track {
    fn from(raw: TrackObject) -> Self {
        Self {
            uri: raw.uri,
            name: raw.name,
            artist_names: raw.artists.into_iter().map(|a| a.name).collect(),
            album_name: raw.album.name,
            cover_image_url: raw
                .album
                .images
                .and_then(|images| images.into_iter().next())
                .map(|image| image.url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistBatch {
    pub name: String,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "320")]
    High,
    #[serde(rename = "192")]
    Standard,
}

impl Quality {
    pub fn bitrate(&self) -> &'static str {
        match self {
            Quality::High => "320",
            Quality::Standard => "192",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}kbps", self.bitrate())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().trim_end_matches("kbps") {
            "320" | "high" => Ok(Quality::High),
            "192" | "standard" => Ok(Quality::Standard),
            other => Err(format!("unknown quality '{}', expected 320 or 192", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Idle,
    Starting,
    #[serde(alias = "working")]
    Running,
    Done,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Cancelled)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobState::Idle => "IDLE",
            JobState::Starting => "STARTING",
            JobState::Running => "RUNNING",
            JobState::Done => "DONE",
            JobState::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "path")]
    pub storage_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(rename = "status")]
    pub state: JobState,
    #[serde(rename = "completed", default)]
    pub completed_count: u64,
    #[serde(rename = "total", default)]
    pub total_count: u64,
    #[serde(default)]
    pub current_track: Option<String>,
    #[serde(default)]
    pub recent_logs: Vec<String>,
    #[serde(rename = "completed_files", default)]
    pub completed_artifacts: Vec<Artifact>,
}

impl JobStatus {
    pub fn currently_processing(&self) -> Option<&str> {
        self.current_track
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    pub fn is_success(&self) -> bool {
        self.state == JobState::Done && self.completed_count == self.total_count
    }
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub tracks: u64,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub name: String,
    pub artists: String,
    pub album: String,
    pub uri: String,
}

#[derive(Tabled)]
pub struct SelectionTableRow {
    pub playlist: String,
    pub selection: String,
}

#[derive(Tabled)]
pub struct ArtifactTableRow {
    pub name: String,
    pub path: String,
}
