use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::domain::{
    ports::DocumentSource, ContentType, DocumentContent, DocumentRef, DomainError,
};
use crate::infrastructure::config::SourceConfig;

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Document library on a SharePoint drive, read through Microsoft Graph.
///
/// The client-credentials token is fetched on first use and kept for the life
/// of the process; it is never refreshed.
pub struct GraphDocumentSource {
    http: reqwest::Client,
    config: SourceConfig,
    client_secret: String,
    token: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct DriveItemPage {
    #[serde(default)]
    value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveItem {
    id: String,
    name: String,
    web_url: Option<String>,
    file: Option<FileFacet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileFacet {
    mime_type: Option<String>,
}

impl DriveItemPage {
    /// Files only; folders carry no `file` facet.
    fn into_documents(self) -> (Vec<DocumentRef>, Option<String>) {
        let docs = self
            .value
            .into_iter()
            .filter_map(|item| {
                let file = item.file?;
                Some(DocumentRef {
                    id: item.id,
                    name: item.name,
                    web_url: item.web_url,
                    mime_type: file.mime_type,
                })
            })
            .collect();
        (docs, self.next_link)
    }
}

impl GraphDocumentSource {
    pub fn new(config: SourceConfig, client_secret: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            client_secret: client_secret.into(),
            token: OnceCell::new(),
        }
    }

    /// Reads the client secret from `GRAPH_CLIENT_SECRET`.
    pub fn from_env(config: SourceConfig) -> Result<Self, DomainError> {
        let secret = std::env::var("GRAPH_CLIENT_SECRET")
            .map_err(|_| DomainError::validation("GRAPH_CLIENT_SECRET is not set"))?;
        Ok(Self::new(config, secret))
    }

    fn drive_url(&self) -> String {
        format!(
            "{}/sites/{}/drives/{}",
            self.config.graph_url.trim_end_matches('/'),
            self.config.site_id,
            self.config.drive_id
        )
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.config.login_url.trim_end_matches('/'),
            self.config.tenant_id
        )
    }

    async fn token(&self) -> Result<&str, DomainError> {
        self.token
            .get_or_try_init(|| self.fetch_token())
            .await
            .map(String::as_str)
    }

    #[instrument(skip(self))]
    async fn fetch_token(&self) -> Result<String, DomainError> {
        let response = self
            .http
            .post(self.token_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| DomainError::source(format!("token request: {e}")))?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| DomainError::source(format!("token response: {e}")))?;

        info!("obtained document source token");
        Ok(body.access_token)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, DomainError> {
        let token = self.token().await?;
        self.http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| DomainError::source(format!("GET {url}: {e}")))
    }
}

#[async_trait]
impl DocumentSource for GraphDocumentSource {
    #[instrument(skip(self))]
    async fn list_documents(&self) -> Result<Vec<DocumentRef>, DomainError> {
        let mut documents = Vec::new();
        let mut next = Some(format!("{}/root/children", self.drive_url()));

        while let Some(url) = next {
            let page: DriveItemPage = self
                .get(&url)
                .await?
                .json()
                .await
                .map_err(|e| DomainError::source(format!("listing response: {e}")))?;

            let (docs, next_link) = page.into_documents();
            debug!(count = docs.len(), "listed page");
            documents.extend(docs);
            next = next_link;
        }

        Ok(documents)
    }

    #[instrument(skip(self, doc), fields(document = %doc.name))]
    async fn fetch_content(&self, doc: &DocumentRef) -> Result<DocumentContent, DomainError> {
        let url = format!("{}/items/{}/content", self.drive_url(), doc.id);
        let response = self.get(&url).await?;

        let header_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DomainError::source(format!("downloading {}: {e}", doc.name)))?;

        let declared = doc.mime_type.as_deref().or(header_type.as_deref());
        Ok(DocumentContent {
            bytes: bytes.to_vec(),
            content_type: ContentType::detect(declared, &doc.name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SourceConfig {
        SourceConfig {
            tenant_id: "tenant".into(),
            client_id: "client".into(),
            site_id: "site".into(),
            drive_id: "drive".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_urls() {
        let source = GraphDocumentSource::new(config(), "secret");

        assert_eq!(
            source.drive_url(),
            "https://graph.microsoft.com/v1.0/sites/site/drives/drive"
        );
        assert_eq!(
            source.token_url(),
            "https://login.microsoftonline.com/tenant/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_listing_skips_folders() {
        let page: DriveItemPage = serde_json::from_str(
            r#"{
                "value": [
                    {"id": "1", "name": "Policies", "folder": {"childCount": 3}},
                    {"id": "2", "name": "refunds.pdf", "webUrl": "https://x/refunds.pdf",
                     "file": {"mimeType": "application/pdf"}},
                    {"id": "3", "name": "notes.txt", "file": {}}
                ],
                "@odata.nextLink": "https://graph/next"
            }"#,
        )
        .unwrap();

        let (docs, next) = page.into_documents();

        assert_eq!(next.as_deref(), Some("https://graph/next"));
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "refunds.pdf");
        assert_eq!(docs[0].mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(docs[1].mime_type, None);
    }
}
