//! GitHub REST implementation of [`RemoteClient`]
//!
//! Token authentication only. The token is installed into the client's
//! default headers once and never logged. Offset listings advance by page
//! number (a short page means the listing is exhausted); the audit-log
//! endpoint is cursor-paginated and the next cursor is read from the
//! `Link` response header.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, USER_AGENT};
use serde::de::DeserializeOwned;

use super::error::RemoteError;
use super::types::{
    AuditEvent, RemoteCollaborator, RemoteRepo, RemoteTeam, RemoteTeamMember, RemoteUser,
    RepoPermission, TokenPermissions,
};
use super::{Page, PageToken, RemoteClient};

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";
const SCOPES_HEADER: &str = "x-oauth-scopes";

/// Cap on error-body bytes carried into an error message
const MAX_ERROR_BODY: usize = 300;

pub struct GithubClient {
    http: reqwest::Client,
    base: String,
    org: String,
}

impl GithubClient {
    pub fn new(base_url: &str, org: &str, token: &str) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            API_VERSION_HEADER,
            HeaderValue::from_static(API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("orgmirror/", env!("CARGO_PKG_VERSION"))),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            RemoteError::Decode {
                path: "<client setup>".to_string(),
                message: "token contains characters not valid in a header".to_string(),
            }
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
            org: org.to_string(),
        })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn check(resp: reqwest::Response, path: &str) -> Result<reqwest::Response, RemoteError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let mut message = resp.text().await.unwrap_or_default();
        message.truncate(MAX_ERROR_BODY);
        Err(RemoteError::status(status.as_u16(), path, message.trim()))
    }

    /// GET an offset-paginated listing. The server reports no explicit
    /// "last page" marker for these endpoints; a short page means the
    /// listing is exhausted.
    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &PageToken,
        per_page: u32,
        extra_query: &[(&str, &str)],
    ) -> Result<Page<T>, RemoteError> {
        let page = match token {
            PageToken::Number(n) => *n,
            PageToken::Cursor(_) => {
                return Err(RemoteError::Decode {
                    path: path.to_string(),
                    message: "expected a numbered page token for this listing".to_string(),
                });
            }
        };

        let resp = self
            .http
            .get(self.url(path))
            .query(&[("per_page", per_page.to_string()), ("page", page.to_string())])
            .query(extra_query)
            .send()
            .await?;
        let resp = Self::check(resp, path).await?;
        let items: Vec<T> = resp.json().await?;

        let next = (items.len() as u64 >= u64::from(per_page)).then(|| PageToken::Number(page + 1));
        Ok(Page { items, next })
    }

    async fn get_one<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let resp = self.http.get(self.url(path)).send().await?;
        let resp = Self::check(resp, path).await?;
        Ok(resp.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<(), RemoteError> {
        let resp = self.http.delete(self.url(path)).send().await?;
        Self::check(resp, path).await?;
        Ok(())
    }

    async fn put_json(&self, path: &str, body: &serde_json::Value) -> Result<(), RemoteError> {
        let resp = self.http.put(self.url(path)).json(body).send().await?;
        Self::check(resp, path).await?;
        Ok(())
    }
}

/// Extract the `after` cursor from a `Link` header's `rel="next"` entry.
pub(crate) fn next_cursor_from_link(link: &str) -> Option<String> {
    for segment in link.split(',') {
        let segment = segment.trim();
        if !segment.contains("rel=\"next\"") {
            continue;
        }
        let url = segment.strip_prefix('<')?.split('>').next()?;
        let query = url.split_once('?')?.1;
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("after=")
                && !value.is_empty()
            {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn header_i64(headers: &HeaderMap, name: &str) -> i64 {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl RemoteClient for GithubClient {
    async fn list_members(
        &self,
        token: &PageToken,
        per_page: u32,
    ) -> Result<Page<RemoteUser>, RemoteError> {
        let path = format!("/orgs/{}/members", self.org);
        self.get_page(&path, token, per_page, &[]).await
    }

    async fn get_user(&self, login: &str) -> Result<RemoteUser, RemoteError> {
        self.get_one(&format!("/users/{login}")).await
    }

    async fn list_teams(
        &self,
        token: &PageToken,
        per_page: u32,
    ) -> Result<Page<RemoteTeam>, RemoteError> {
        let path = format!("/orgs/{}/teams", self.org);
        self.get_page(&path, token, per_page, &[]).await
    }

    async fn list_repos(
        &self,
        token: &PageToken,
        per_page: u32,
    ) -> Result<Page<RemoteRepo>, RemoteError> {
        let path = format!("/orgs/{}/repos", self.org);
        self.get_page(&path, token, per_page, &[]).await
    }

    async fn list_team_members(
        &self,
        slug: &str,
        token: &PageToken,
        per_page: u32,
    ) -> Result<Page<RemoteTeamMember>, RemoteError> {
        let path = format!("/orgs/{}/teams/{slug}/members", self.org);
        self.get_page(&path, token, per_page, &[]).await
    }

    async fn list_repo_collaborators(
        &self,
        repo: &str,
        token: &PageToken,
        per_page: u32,
    ) -> Result<Page<RemoteCollaborator>, RemoteError> {
        let path = format!("/repos/{}/{repo}/collaborators", self.org);
        self.get_page(&path, token, per_page, &[("affiliation", "direct")])
            .await
    }

    async fn list_repo_teams(
        &self,
        repo: &str,
        token: &PageToken,
        per_page: u32,
    ) -> Result<Page<RemoteTeam>, RemoteError> {
        let path = format!("/repos/{}/{repo}/teams", self.org);
        self.get_page(&path, token, per_page, &[]).await
    }

    async fn list_outside_collaborators(
        &self,
        token: &PageToken,
        per_page: u32,
    ) -> Result<Page<RemoteUser>, RemoteError> {
        let path = format!("/orgs/{}/outside_collaborators", self.org);
        self.get_page(&path, token, per_page, &[]).await
    }

    async fn search_audit_log(
        &self,
        phrase: &str,
        token: &PageToken,
        per_page: u32,
    ) -> Result<Page<AuditEvent>, RemoteError> {
        let path = format!("/orgs/{}/audit-log", self.org);
        let cursor = match token {
            PageToken::Cursor(c) => c.as_str(),
            PageToken::Number(_) => {
                return Err(RemoteError::Decode {
                    path,
                    message: "audit log requires a cursor token".to_string(),
                });
            }
        };

        let mut req = self
            .http
            .get(self.url(&path))
            .query(&[("phrase", phrase), ("per_page", &per_page.to_string())]);
        if !cursor.is_empty() {
            req = req.query(&[("after", cursor)]);
        }

        let resp = Self::check(req.send().await?, &path).await?;
        let next = resp
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_cursor_from_link)
            .map(PageToken::Cursor);
        let items: Vec<AuditEvent> = resp.json().await?;

        Ok(Page { items, next })
    }

    async fn token_permissions(&self) -> Result<TokenPermissions, RemoteError> {
        let path = "/user";
        let resp = Self::check(self.http.get(self.url(path)).send().await?, path).await?;

        let headers = resp.headers().clone();
        let scopes = headers
            .get(SCOPES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        #[derive(serde::Deserialize)]
        struct WhoAmI {
            login: String,
        }
        let who: WhoAmI = resp.json().await?;

        Ok(TokenPermissions {
            login: who.login,
            scopes,
            rate_limit: header_i64(&headers, "x-ratelimit-limit"),
            rate_remaining: header_i64(&headers, "x-ratelimit-remaining"),
            rate_reset: header_i64(&headers, "x-ratelimit-reset"),
        })
    }

    async fn delete_team(&self, slug: &str) -> Result<(), RemoteError> {
        self.delete(&format!("/orgs/{}/teams/{slug}", self.org)).await
    }

    async fn remove_org_member(&self, login: &str) -> Result<(), RemoteError> {
        self.delete(&format!("/orgs/{}/members/{login}", self.org)).await
    }

    async fn add_team_member(&self, slug: &str, login: &str) -> Result<(), RemoteError> {
        self.put_json(
            &format!("/orgs/{}/teams/{slug}/memberships/{login}", self.org),
            &serde_json::json!({ "role": "member" }),
        )
        .await
    }

    async fn remove_team_member(&self, slug: &str, login: &str) -> Result<(), RemoteError> {
        self.delete(&format!("/orgs/{}/teams/{slug}/memberships/{login}", self.org))
            .await
    }

    async fn add_outside_collaborator(
        &self,
        repo: &str,
        login: &str,
        permission: RepoPermission,
    ) -> Result<(), RemoteError> {
        self.put_json(
            &format!("/repos/{}/{repo}/collaborators/{login}", self.org),
            &serde_json::json!({ "permission": permission.as_str() }),
        )
        .await
    }

    async fn remove_outside_collaborator(
        &self,
        repo: &str,
        login: &str,
    ) -> Result<(), RemoteError> {
        self.delete(&format!("/repos/{}/{repo}/collaborators/{login}", self.org))
            .await
    }

    async fn remove_repo_collaborator(&self, repo: &str, login: &str) -> Result<(), RemoteError> {
        self.delete(&format!("/repos/{}/{repo}/collaborators/{login}", self.org))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_cursor_from_link() {
        let link = r#"<https://api.github.com/orgs/acme/audit-log?phrase=actor%3Aoctocat&after=MTY2&before=>; rel="next", <https://api.github.com/orgs/acme/audit-log?phrase=actor%3Aoctocat>; rel="first""#;
        assert_eq!(next_cursor_from_link(link), Some("MTY2".to_string()));
    }

    #[test]
    fn test_next_cursor_absent() {
        let link = r#"<https://api.github.com/orgs/acme/audit-log?phrase=x>; rel="first""#;
        assert_eq!(next_cursor_from_link(link), None);
        assert_eq!(next_cursor_from_link(""), None);
    }

    #[test]
    fn test_next_cursor_empty_after_param() {
        let link = r#"<https://api.github.com/x?after=&before=abc>; rel="next""#;
        assert_eq!(next_cursor_from_link(link), None);
    }

    #[test]
    fn test_client_rejects_bad_token_characters() {
        let err = GithubClient::new(DEFAULT_API_BASE, "acme", "bad\ntoken");
        assert!(err.is_err());
    }
}
