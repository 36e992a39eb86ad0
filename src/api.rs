use std::fmt::Display;

use chrono::{DateTime, NaiveDateTime};
use reqwest::{StatusCode, blocking::Client};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};

use crate::settings::Credentials;

pub const BITBUCKET_URI: &str = "https://api.bitbucket.org/";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to complete HTTP request")]
    Request(#[source] reqwest::Error),
    #[error("Unable to complete HTTP request - {status}")]
    Status { status: StatusCode },
    #[error("Unable to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unable to build HTTP client")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Repository {
    #[serde(deserialize_with = "nullable")]
    pub owner: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub slug: String,
    #[serde(deserialize_with = "nullable")]
    pub scm: String,
    #[serde(deserialize_with = "nullable")]
    pub creator: String,
    #[serde(rename = "created_on", deserialize_with = "timestamp")]
    pub created_on: Option<NaiveDateTime>,
    #[serde(rename = "last_updated", deserialize_with = "timestamp")]
    pub last_updated: Option<NaiveDateTime>,
    #[serde(rename = "has_wiki", deserialize_with = "nullable")]
    pub has_wiki: bool,
}

impl Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Follower {
    #[serde(deserialize_with = "nullable")]
    pub username: String,
    #[serde(rename = "first_name", deserialize_with = "nullable")]
    pub first_name: String,
    #[serde(rename = "last_name", deserialize_with = "nullable")]
    pub last_name: String,
}

impl Display for Follower {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{} {}", self.username, self.first_name, self.last_name)
    }
}

// The followers endpoint wraps its array in an object instead of returning it bare.
#[derive(Deserialize)]
struct FollowerListEnvelope {
    #[serde(default, deserialize_with = "nullable")]
    count: u32,
    #[serde(default)]
    followers: Option<Vec<Follower>>,
}

/// Parses the timestamps the 1.0 API emits. They normally carry no zone
/// (`2012-06-20T10:11:12.123456` or `2012-06-20 10:11:12`); values with an
/// offset are converted to UTC.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
}

// Explicit nulls read as the field's default, same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse_timestamp(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// Blocking client for the Bitbucket 1.0 API, authenticated with HTTP Basic.
pub struct BitbucketClient {
    http: Client,
    base_uri: String,
    credentials: Credentials,
}

impl BitbucketClient {
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        Self::with_base_uri(BITBUCKET_URI, credentials)
    }

    pub fn with_base_uri(
        base_uri: impl Into<String>,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        let mut base_uri = base_uri.into();
        if !base_uri.ends_with('/') {
            base_uri.push('/');
        }
        let http = Client::builder()
            .user_agent(concat!("bb-followers/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Client)?;
        Ok(BitbucketClient { http, base_uri, credentials })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn list_repositories(&self) -> Result<Vec<Repository>, Error> {
        self.get("1.0/user/repositories")
    }

    pub fn list_followers(&self, owner: &str, slug: &str) -> Result<Vec<Follower>, Error> {
        let envelope: FollowerListEnvelope =
            self.get(&format!("1.0/repositories/{owner}/{slug}/followers"))?;
        log::debug!("{owner}/{slug} reports {} followers", envelope.count);
        Ok(envelope.followers.unwrap_or_default())
    }

    fn get<T: DeserializeOwned>(&self, resource: &str) -> Result<T, Error> {
        let url = format!("{}{}", self.base_uri, resource);
        log::debug!("GET {url}");
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .map_err(Error::Request)?;

        let status = response.status();
        log::debug!("{url} answered {status}");
        if !status.is_success() {
            return Err(Error::Status { status });
        }

        let body = response.text().map_err(Error::Request)?;
        serde_json::from_str(&body).map_err(|source| Error::Decode { url, source })
    }
}
