//! Wire and domain types for drones, dumps and the community feed.
//!
//! Backend payloads may omit or null any field at any nesting level. Every
//! type here decodes leniently once, at the boundary, into explicit
//! `Option`s so nothing downstream has to guard ad hoc:
//!
//! - missing, `null` and empty strings become `None`
//! - numeric ids may arrive as numbers or numeric strings
//! - timestamps are RFC 3339 or naive ISO-8601 (read as UTC); anything else is `None`
//! - a non-array `dumps` list is empty; undecodable list items are skipped

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::api::{ApiError, ApiResult};

// ============================================================================
// Lenient decoding helpers
// ============================================================================

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| text_from_value(&v)))
}

fn text_from_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value))
}

fn id_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn required_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value).ok_or_else(|| serde::de::Error::custom("missing or invalid id"))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(parse_timestamp))
}

fn lenient_choice<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let text = lenient_text(deserializer)?;
    Ok(text.and_then(|t| match t.trim().parse() {
        Ok(choice) => Some(choice),
        Err(_) => {
            tracing::warn!(value = %t, "ignoring unknown choice value");
            None
        }
    }))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(list_from_value(value))
}

fn lenient_entity<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match serde_json::from_value(v) {
        Ok(entity) => Some(entity),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed nested entity");
            None
        }
    }))
}

fn lenient_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(Value::Object(fields)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(fields
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(decoded) => Some((key, decoded)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "skipping malformed map entry");
                None
            }
        })
        .collect())
}

fn lenient_text_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::Object(fields)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(fields
        .into_iter()
        .filter_map(|(key, value)| text_from_value(&value).map(|text| (key, text)))
        .collect())
}

/// Decodes an array of `T`, skipping items that do not decode.
///
/// Anything that is not an array yields an empty list.
pub fn list_from_value<T: DeserializeOwned>(value: Option<Value>) -> Vec<T> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed list item");
                None
            }
        })
        .collect()
}

/// Parses a backend timestamp (RFC 3339, or naive ISO-8601 read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ============================================================================
// Drones
// ============================================================================

/// Flight controller firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    Betaflight,
    Kiss,
}

impl Controller {
    pub fn as_str(self) -> &'static str {
        match self {
            Controller::Betaflight => "Betaflight",
            Controller::Kiss => "Kiss",
        }
    }
}

impl FromStr for Controller {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "betaflight" => Ok(Controller::Betaflight),
            "kiss" => Ok(Controller::Kiss),
            _ => Err(format!("Unknown controller: {value}")),
        }
    }
}

/// Video transmission system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSystem {
    Analogico,
    Digital,
}

impl VideoSystem {
    pub fn as_str(self) -> &'static str {
        match self {
            VideoSystem::Analogico => "Analogico",
            VideoSystem::Digital => "Digital",
        }
    }
}

impl FromStr for VideoSystem {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "analogico" | "analog" => Ok(VideoSystem::Analogico),
            "digital" => Ok(VideoSystem::Digital),
            _ => Err(format!("Unknown video system: {value}")),
        }
    }
}

macro_rules! serialize_as_str {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.as_str())
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

serialize_as_str!(Controller, VideoSystem);

/// A drone profile from the private list (`GET /drones`, `GET /drones/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Drone {
    #[serde(deserialize_with = "required_id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "lenient_choice")]
    pub controller: Option<Controller>,
    #[serde(default, deserialize_with = "lenient_choice")]
    pub video: Option<VideoSystem>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub radio: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub components: Option<String>,
}

/// User input for creating or editing a drone, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DroneDraft {
    pub name: String,
    pub comment: String,
    pub controller: String,
    pub video: String,
    pub radio: String,
    pub components: String,
}

/// Body for `POST /drones` and `PUT /drones/{id}`.
///
/// Every optional field serializes as `null` when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DronePayload {
    pub name: String,
    pub comment: Option<String>,
    pub controller: Option<Controller>,
    pub video: Option<VideoSystem>,
    pub radio: Option<String>,
    pub components: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl DroneDraft {
    /// Prefills a draft from a stored drone (for edits).
    pub fn from_drone(drone: &Drone) -> Self {
        Self {
            name: drone.name.clone().unwrap_or_default(),
            comment: drone.comment.clone().unwrap_or_default(),
            controller: drone
                .controller
                .map_or_else(String::new, |c| c.as_str().to_string()),
            video: drone
                .video
                .map_or_else(String::new, |v| v.as_str().to_string()),
            radio: drone.radio.clone().unwrap_or_default(),
            components: drone.components.clone().unwrap_or_default(),
        }
    }

    /// Trims every field and checks preconditions.
    ///
    /// # Errors
    /// Returns a validation error when the name is empty or a choice field
    /// holds an unknown value.
    pub fn validate(&self) -> ApiResult<DronePayload> {
        let name = non_empty(&self.name).ok_or_else(|| ApiError::validation("Name is required."))?;

        let controller = non_empty(&self.controller)
            .map(|c| {
                c.parse::<Controller>()
                    .ok()
                    .ok_or_else(|| ApiError::validation("Controller must be Betaflight or Kiss."))
            })
            .transpose()?;
        let video = non_empty(&self.video)
            .map(|v| {
                v.parse::<VideoSystem>()
                    .ok()
                    .ok_or_else(|| ApiError::validation("Video must be Analogico or Digital."))
            })
            .transpose()?;

        Ok(DronePayload {
            name,
            comment: non_empty(&self.comment),
            controller,
            video,
            radio: non_empty(&self.radio),
            components: non_empty(&self.components),
        })
    }
}

// ============================================================================
// Accounts
// ============================================================================

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

const MIN_PASSWORD_LEN: usize = 6;

/// Body for `POST /auth/login` and `POST /auth/register`.
#[derive(Clone, Serialize)]
pub struct Credentials {
    email: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Trims and validates sign-in input.
    ///
    /// # Errors
    /// Returns a validation error for a malformed email or a short password.
    pub fn new(email: &str, password: &str) -> ApiResult<Self> {
        let email = email.trim();
        let password = password.trim();

        if !EMAIL_RE.is_match(email) {
            return Err(ApiError::validation("Invalid email."));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::validation(
                "Password must be at least 6 characters.",
            ));
        }

        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Response of `POST /auth/register` and `GET /auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Account {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
}

// ============================================================================
// Community feed
// ============================================================================

/// A public post exposing one drone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommunityPost {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    /// Only present on the owner's own listing (`GET /community/me`).
    #[serde(default, deserialize_with = "lenient_id")]
    pub drone_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub public_note: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_public: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Attribution for a post. Display fallback: `pilot`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Owner {
    #[serde(default, deserialize_with = "lenient_text")]
    pub handle: Option<String>,
}

impl Owner {
    pub const FALLBACK_HANDLE: &'static str = "pilot";

    pub fn display_handle(&self) -> &str {
        self.handle.as_deref().unwrap_or(Self::FALLBACK_HANDLE)
    }
}

/// The drone half of a feed entry; unlike [`Drone`] even the id may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedDrone {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "lenient_choice")]
    pub controller: Option<Controller>,
    #[serde(default, deserialize_with = "lenient_choice")]
    pub video: Option<VideoSystem>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub radio: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub components: Option<String>,
}

/// An uploaded dump. Display fallback for the name: `Dump #<id>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Dump {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub drone_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub original_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub bytes: Option<i64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Dump {
    /// Newest first. Missing timestamps count as the epoch; ties go to the
    /// higher id so same-instant uploads keep a deterministic order.
    pub fn newest_first(a: &Dump, b: &Dump) -> Ordering {
        let millis = |d: &Dump| d.created_at.map_or(0, |t| t.timestamp_millis());
        millis(b)
            .cmp(&millis(a))
            .then_with(|| b.id.unwrap_or(0).cmp(&a.id.unwrap_or(0)))
    }

    pub fn display_name(&self) -> String {
        match (&self.original_name, self.id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("Dump #{id}"),
            (None, None) => "Dump".to_string(),
        }
    }
}

/// One `GET /community/feed` item: post, drone, owner and public dumps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub post: CommunityPost,
    #[serde(default, deserialize_with = "null_as_default")]
    pub drone: FeedDrone,
    #[serde(default, deserialize_with = "null_as_default")]
    pub owner: Owner,
    #[serde(default, deserialize_with = "lenient_list")]
    pub dumps: Vec<Dump>,
}

impl FeedEntry {
    /// Card title: post title, else drone name, else `Drone #<id>`.
    pub fn display_title(&self) -> String {
        if let Some(title) = self.post.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            return title.to_string();
        }
        if let Some(name) = &self.drone.name {
            return name.clone();
        }
        match self.drone.id {
            Some(id) => format!("Drone #{id}"),
            None => "Drone".to_string(),
        }
    }
}

/// User input for publishing or hiding a drone in the community.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishDraft {
    pub drone_id: i64,
    pub is_public: bool,
    pub title: String,
    pub public_note: String,
}

/// Body for `POST /community/posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishPayload {
    pub drone_id: i64,
    pub is_public: bool,
    pub title: String,
    pub public_note: Option<String>,
}

impl PublishDraft {
    /// Checks preconditions; a hidden post falls back to the drone name,
    /// then to `Drone #<id>`, for its title.
    ///
    /// # Errors
    /// Returns a validation error when publishing without a title.
    pub fn validate(&self, drone_name: Option<&str>) -> ApiResult<PublishPayload> {
        let title = non_empty(&self.title);
        if self.is_public && title.is_none() {
            return Err(ApiError::validation("Public title is required."));
        }

        let title = title
            .or_else(|| drone_name.and_then(non_empty))
            .unwrap_or_else(|| format!("Drone #{}", self.drone_id));

        Ok(PublishPayload {
            drone_id: self.drone_id,
            is_public: self.is_public,
            title,
            public_note: non_empty(&self.public_note),
        })
    }
}

/// Response of `POST /community/posts`: the created or updated post id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PostRef {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
}

/// Body and response of `PATCH /community/dumps/{id}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpVisibility {
    #[serde(default, skip_serializing, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_public: bool,
}

// ============================================================================
// Dump upload and parse
// ============================================================================

/// File extensions the backend accepts for dumps.
pub const DUMP_EXTENSIONS: [&str; 5] = [".sql", ".dump", ".gz", ".zip", ".txt"];

/// A dump file checked and ready for `POST /dumps`.
#[derive(Clone)]
pub struct DumpUpload {
    pub(crate) drone_id: i64,
    pub(crate) file_name: String,
    pub(crate) bytes: Vec<u8>,
}

impl fmt::Debug for DumpUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpUpload")
            .field("drone_id", &self.drone_id)
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl DumpUpload {
    /// Keeps only the final component of `file_name` and checks its extension.
    ///
    /// # Errors
    /// Returns a validation error when no file name is given or the
    /// extension is not one of [`DUMP_EXTENSIONS`].
    pub fn new(drone_id: i64, file_name: &str, bytes: Vec<u8>) -> ApiResult<Self> {
        let name = Path::new(file_name.trim())
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or_default()
            .to_string();
        if name.is_empty() {
            return Err(ApiError::validation("Pick a file first."));
        }

        let ext = Path::new(&name)
            .extension()
            .and_then(OsStr::to_str)
            .map_or_else(String::new, |e| format!(".{}", e.to_lowercase()));
        if !DUMP_EXTENSIONS.contains(&ext.as_str()) {
            let shown = if ext.is_empty() { "(none)" } else { ext.as_str() };
            return Err(ApiError::validation(format!(
                "Unsupported file extension: {shown}"
            )));
        }

        Ok(Self {
            drone_id,
            file_name: name,
            bytes,
        })
    }

    pub fn drone_id(&self) -> i64 {
        self.drone_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Settings of one profile, grouped (`pid`, `rates`, `osd`, ...) by key.
pub type SettingGroups = BTreeMap<String, BTreeMap<String, String>>;

/// Response of `GET /drones/{id}/dumps/{dump}/parse`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DumpReport {
    #[serde(default, deserialize_with = "lenient_entity")]
    pub drone: Option<Drone>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dump: Dump,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parsed: ParsedDump,
}

/// A flight controller CLI dump split into sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParsedDump {
    #[serde(deserialize_with = "lenient_text_map")]
    pub firmware: BTreeMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub features: FeatureFlags,
    #[serde(deserialize_with = "null_as_default")]
    pub ports: SerialPorts,
    #[serde(deserialize_with = "lenient_list")]
    pub resources: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub modes: AuxModes,
    #[serde(deserialize_with = "null_as_default")]
    pub settings: DumpSettings,
    #[serde(deserialize_with = "lenient_list")]
    pub other_commands: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub warnings: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub stats: ParseStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    #[serde(deserialize_with = "lenient_list")]
    pub enabled: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerialPorts {
    #[serde(deserialize_with = "lenient_list")]
    pub serial: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuxModes {
    #[serde(deserialize_with = "lenient_list")]
    pub aux: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DumpSettings {
    #[serde(deserialize_with = "lenient_text_map")]
    pub global: BTreeMap<String, String>,
    #[serde(deserialize_with = "lenient_map")]
    pub profiles: BTreeMap<String, SettingGroups>,
    #[serde(deserialize_with = "lenient_map")]
    pub rateprofiles: BTreeMap<String, SettingGroups>,
}

/// Numeric keys in numeric order; anything else after them, by name.
fn profile_order<'a, T>(profiles: &'a BTreeMap<String, T>) -> Vec<(&'a str, &'a T)> {
    let mut ordered: Vec<(&str, &T)> = profiles.iter().map(|(k, v)| (k.as_str(), v)).collect();
    ordered.sort_by_key(|(key, _)| (key.parse::<i64>().unwrap_or(i64::MAX), key.to_string()));
    ordered
}

impl DumpSettings {
    pub fn profiles_in_order(&self) -> Vec<(&str, &SettingGroups)> {
        profile_order(&self.profiles)
    }

    pub fn rateprofiles_in_order(&self) -> Vec<(&str, &SettingGroups)> {
        profile_order(&self.rateprofiles)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseStats {
    #[serde(deserialize_with = "lenient_id")]
    pub lines_total: Option<i64>,
    #[serde(deserialize_with = "lenient_id")]
    pub recognized: Option<i64>,
    #[serde(deserialize_with = "lenient_id")]
    pub unknown: Option<i64>,
}
