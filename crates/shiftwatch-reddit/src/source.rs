//! [`RedditSource`]: async Reddit client implementing [`CodeSource`].

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder};
use shiftwatch_core::{
  extract::codes_from_thread,
  source::{CodeSource, Retrieval},
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
  Error, Result,
  listing::{parse_newest_post, parse_token, parse_top_level_comments},
};

pub const DEFAULT_SUBREDDIT: &str = "borderlandsshiftcodes";

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const OAUTH_BASE: &str = "https://oauth.reddit.com";
const ANONYMOUS_BASE: &str = "https://www.reddit.com";

/// Refresh the bearer token this long before Reddit says it expires.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

/// Connection settings for the Reddit API.
///
/// With an empty `client_id` the anonymous JSON endpoints are used instead of
/// OAuth.
#[derive(Debug, Clone)]
pub struct RedditConfig {
  pub subreddit:     String,
  pub client_id:     String,
  pub client_secret: String,
  pub user_agent:    String,
}

impl Default for RedditConfig {
  fn default() -> Self {
    Self {
      subreddit:     DEFAULT_SUBREDDIT.to_owned(),
      client_id:     String::new(),
      client_secret: String::new(),
      user_agent:    String::new(),
    }
  }
}

struct CachedToken {
  token:   String,
  expires: Instant,
}

/// Reads the newest post of one subreddit.
pub struct RedditSource {
  client: Client,
  config: RedditConfig,
  token:  Mutex<Option<CachedToken>>,
}

impl RedditSource {
  pub fn new(config: RedditConfig) -> Result<Self> {
    let user_agent = if config.user_agent.is_empty() {
      concat!("shiftwatch/", env!("CARGO_PKG_VERSION")).to_owned()
    } else {
      config.user_agent.clone()
    };

    let client = Client::builder()
      .timeout(Duration::from_secs(10))
      .user_agent(user_agent)
      .build()?;

    Ok(Self {
      client,
      config,
      token: Mutex::new(None),
    })
  }

  fn authenticated(&self) -> bool { !self.config.client_id.is_empty() }

  fn url(&self, path: &str) -> String {
    let base = if self.authenticated() { OAUTH_BASE } else { ANONYMOUS_BASE };
    format!("{base}{path}")
  }

  /// Return a bearer token, requesting a new one once the cached token is
  /// close to expiry. `None` in anonymous mode.
  async fn bearer(&self) -> Result<Option<String>> {
    if !self.authenticated() {
      return Ok(None);
    }

    let mut cached = self.token.lock().await;
    if let Some(token) = cached.as_ref()
      && token.expires > Instant::now()
    {
      return Ok(Some(token.token.clone()));
    }

    debug!("requesting reddit access token");
    let req = self
      .client
      .post(TOKEN_URL)
      .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
      .form(&[("grant_type", "client_credentials")]);
    let body = send(req, TOKEN_URL).await?;
    let (token, expires_in) = parse_token(&body)?;

    let lifetime = Duration::from_secs(expires_in.unwrap_or(3600)).saturating_sub(TOKEN_SLACK);
    *cached = Some(CachedToken {
      token:   token.clone(),
      expires: Instant::now() + lifetime,
    });
    Ok(Some(token))
  }

  async fn get(&self, path: &str, bearer: Option<&str>) -> Result<String> {
    let url = self.url(path);
    let mut req = self.client.get(&url).query(&[("raw_json", "1")]);
    if let Some(token) = bearer {
      req = req.bearer_auth(token);
    }
    send(req, &url).await
  }

  async fn top_level_comments(&self, post_id: &str, bearer: Option<&str>) -> Result<Vec<String>> {
    let path = format!("/r/{}/comments/{post_id}.json?depth=1", self.config.subreddit);
    let body = self.get(&path, bearer).await?;
    parse_top_level_comments(&body)
  }

  async fn fetch_newest(&self) -> Result<Retrieval> {
    let bearer = self.bearer().await?;

    let path = format!("/r/{}/new.json?limit=1", self.config.subreddit);
    let body = self.get(&path, bearer.as_deref()).await?;
    let Some(post) = parse_newest_post(&body)? else {
      info!(subreddit = %self.config.subreddit, "subreddit has no posts");
      return Ok(Retrieval::default());
    };

    let post_id = post.id.as_str();
    let bearer = bearer.as_deref();
    let codes = codes_from_thread(&post.body(), move || self.top_level_comments(post_id, bearer))
      .await?;

    debug!(post = %post.id, codes = codes.len(), "extracted codes from newest post");
    Ok(Retrieval {
      codes,
      post: Some(post.meta()),
    })
  }
}

/// Send `req` and return the body of a successful response.
async fn send(req: RequestBuilder, url: &str) -> Result<String> {
  let resp = req.send().await?;
  let status = resp.status();
  if !status.is_success() {
    let body = resp.text().await.unwrap_or_default();
    return Err(Error::Status {
      url: url.to_owned(),
      status: status.as_u16(),
      body,
    });
  }
  Ok(resp.text().await?)
}

impl CodeSource for RedditSource {
  async fn fetch(&self) -> shiftwatch_core::Result<Retrieval> {
    Ok(self.fetch_newest().await?)
  }
}
