//! Knowledge file endpoints.
//!
//! Every endpoint except the download answers with an [`ApiResponse`]
//! envelope; a non-success code becomes [`ClientError::Api`].

use bytes::Bytes;
use nonempty::NonEmpty;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use tracing::debug;

use crate::client::{ChatClient, ClientError};
use crate::model::{ApiResponse, FileQuery, FileUpload, KnowledgeFile, Page, SimilarDocument};

impl ChatClient {
    /// One page of knowledge files, newest first.
    pub async fn list_files(&self, query: &FileQuery) -> Result<Page<KnowledgeFile>, ClientError> {
        let req = self.request(Method::GET, "/files/list").query(query);
        self.send_json::<ApiResponse<_>>(req).await?.into_data()
    }

    /// Upload a file. When the same content already exists the server returns
    /// the existing entry with `is_duplicate` set.
    pub async fn upload_file(&self, upload: FileUpload) -> Result<KnowledgeFile, ClientError> {
        debug!(file_name = %upload.file_name, bytes = upload.content.len(), "uploading file");

        let mut part = Part::bytes(upload.content).file_name(upload.file_name);
        if let Some(mime_type) = &upload.mime_type {
            part = part.mime_str(mime_type)?;
        }

        let mut form = Form::new().part("file", part);
        if let Some(description) = upload.description {
            form = form.text("description", description);
        }
        form = form.text("enableVectorization", upload.enable_vectorization.to_string());

        let req = self.request(Method::POST, "/files/upload").multipart(form);
        self.send_json::<ApiResponse<_>>(req).await?.into_data()
    }

    pub async fn get_file(&self, id: i64) -> Result<KnowledgeFile, ClientError> {
        let req = self.request(Method::GET, &format!("/files/{}", id));
        self.send_json::<ApiResponse<_>>(req).await?.into_data()
    }

    /// Files whose name contains `file_name`.
    pub async fn search_files(&self, file_name: &str) -> Result<Vec<KnowledgeFile>, ClientError> {
        let req = self
            .request(Method::GET, "/files/search")
            .query(&[("fileName", file_name)]);
        self.send_json::<ApiResponse<_>>(req).await?.into_data()
    }

    pub async fn files_by_type(&self, file_type: &str) -> Result<Vec<KnowledgeFile>, ClientError> {
        let req = self
            .request(Method::GET, "/files/by-type")
            .query(&[("fileType", file_type)]);
        self.send_json::<ApiResponse<_>>(req).await?.into_data()
    }

    /// Vector search over the embedded knowledge base.
    pub async fn search_similar(
        &self,
        query: &str,
        top_k: u32,
        threshold: f32,
    ) -> Result<Vec<SimilarDocument>, ClientError> {
        let req = self.request(Method::GET, "/files/search-similar").query(&[
            ("query", query.to_string()),
            ("topK", top_k.to_string()),
            ("threshold", threshold.to_string()),
        ]);
        self.send_json::<ApiResponse<_>>(req).await?.into_data()
    }

    /// Raw content of a stored file.
    pub async fn download_file(&self, id: i64) -> Result<Bytes, ClientError> {
        let req = self.request(Method::GET, &format!("/files/download/{}", id));
        Ok(self.send(req).await?.bytes().await?)
    }

    /// Delete a file. Returns the server's confirmation message.
    pub async fn delete_file(&self, id: i64) -> Result<String, ClientError> {
        let req = self.request(Method::DELETE, &format!("/files/{}", id));
        self.send_json::<ApiResponse<serde_json::Value>>(req)
            .await?
            .into_message()
    }

    pub async fn batch_delete_files(&self, ids: &NonEmpty<i64>) -> Result<String, ClientError> {
        let req = self.request(Method::DELETE, "/files/batch").json(ids);
        self.send_json::<ApiResponse<serde_json::Value>>(req)
            .await?
            .into_message()
    }

    pub async fn update_file_description(
        &self,
        id: i64,
        description: &str,
    ) -> Result<KnowledgeFile, ClientError> {
        let req = self
            .request(Method::PUT, &format!("/files/{}/description", id))
            .query(&[("description", description)]);
        self.send_json::<ApiResponse<_>>(req).await?.into_data()
    }

    /// Split and embed a file into the vector store.
    pub async fn vectorize_file(&self, id: i64) -> Result<String, ClientError> {
        let req = self.request(Method::POST, &format!("/files/{}/vectorize", id));
        self.send_json::<ApiResponse<serde_json::Value>>(req)
            .await?
            .into_message()
    }

    pub async fn batch_vectorize_files(&self, ids: &NonEmpty<i64>) -> Result<String, ClientError> {
        let req = self.request(Method::POST, "/files/batch-vectorize").json(ids);
        self.send_json::<ApiResponse<serde_json::Value>>(req)
            .await?
            .into_message()
    }
}
