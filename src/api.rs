use serde_json::{Value, json};

use crate::config::Config;
use crate::http::{ApiError, JsonHttp, Method};
use crate::model::{
    Achievement, ImportResult, Note, NoteDraft, Playlist, PlaylistDraft, PlaylistPreview,
    ProgressStats, User, Video, VideoStatus,
};

/// Typed wrapper over the study-playlist REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: JsonHttp,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: JsonHttp::new(&config.api_url, config.connect_timeout, config.read_timeout),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_http(http: JsonHttp) -> Self {
        Self { http }
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    // users

    pub fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        self.http.send(
            Method::Post,
            "users/login",
            &json!({ "email": email, "password": password }),
        )
    }

    pub fn create_user(&self, name: &str, email: &str, password: &str) -> Result<User, ApiError> {
        self.http.send(
            Method::Post,
            "users",
            &json!({ "name": name, "email": email, "password": password }),
        )
    }

    pub fn get_user(&self, id: i64) -> Result<User, ApiError> {
        self.http.get(&format!("users/{id}"))
    }

    // playlists

    pub fn playlists_for_user(&self, user_id: i64) -> Result<Vec<Playlist>, ApiError> {
        self.http.get(&format!("playlists/user/{user_id}"))
    }

    pub fn get_playlist(&self, id: i64) -> Result<Playlist, ApiError> {
        self.http.get(&format!("playlists/{id}"))
    }

    pub fn create_playlist(&self, draft: &PlaylistDraft) -> Result<Playlist, ApiError> {
        self.http.send(Method::Post, "playlists", draft)
    }

    pub fn update_playlist(&self, id: i64, draft: &PlaylistDraft) -> Result<Playlist, ApiError> {
        self.http.send(Method::Put, &format!("playlists/{id}"), draft)
    }

    pub fn delete_playlist(&self, id: i64) -> Result<(), ApiError> {
        self.http
            .send_unit::<Value>(Method::Delete, &format!("playlists/{id}"), None)
    }

    pub fn preview_playlist(&self, playlist_url: &str) -> Result<PlaylistPreview, ApiError> {
        self.http.send(
            Method::Post,
            "playlists/preview",
            &json!({ "playlistUrl": playlist_url }),
        )
    }

    pub fn import_playlist(
        &self,
        playlist_url: &str,
        playlist_id: i64,
    ) -> Result<ImportResult, ApiError> {
        self.http.send(
            Method::Post,
            "playlists/import",
            &json!({ "playlistUrl": playlist_url, "playlistId": playlist_id }),
        )
    }

    // videos

    pub fn videos_for_playlist(&self, playlist_id: i64) -> Result<Vec<Video>, ApiError> {
        self.http.get(&format!("videos/playlist/{playlist_id}"))
    }

    pub fn get_video(&self, id: i64) -> Result<Video, ApiError> {
        self.http.get(&format!("videos/{id}"))
    }

    pub fn add_video(&self, playlist_id: i64, url: &str) -> Result<Video, ApiError> {
        self.http.send(
            Method::Post,
            "videos",
            &json!({ "url": url, "playlistId": playlist_id }),
        )
    }

    pub fn update_video_status(&self, id: i64, status: VideoStatus) -> Result<(), ApiError> {
        self.http.send_unit(
            Method::Patch,
            &format!("videos/{id}/status"),
            Some(&json!({ "status": status })),
        )
    }

    pub fn delete_video(&self, id: i64) -> Result<(), ApiError> {
        self.http
            .send_unit::<Value>(Method::Delete, &format!("videos/{id}"), None)
    }

    // notes

    pub fn notes_for_video(&self, video_id: i64) -> Result<Vec<Note>, ApiError> {
        self.http.get(&format!("notes/video/{video_id}"))
    }

    pub fn create_note(&self, draft: &NoteDraft) -> Result<Note, ApiError> {
        self.http.send(Method::Post, "notes", draft)
    }

    pub fn update_note(&self, id: i64, draft: &NoteDraft) -> Result<Note, ApiError> {
        self.http.send(Method::Put, &format!("notes/{id}"), draft)
    }

    pub fn delete_note(&self, id: i64) -> Result<(), ApiError> {
        self.http
            .send_unit::<Value>(Method::Delete, &format!("notes/{id}"), None)
    }

    // achievements and progress

    pub fn create_achievement(
        &self,
        user_id: i64,
        playlist_id: i64,
    ) -> Result<Achievement, ApiError> {
        self.http.send(
            Method::Post,
            "achievements",
            &json!({ "userId": user_id, "playlistId": playlist_id }),
        )
    }

    pub fn achievements_for_user(&self, user_id: i64) -> Result<Vec<Achievement>, ApiError> {
        self.http.get(&format!("achievements/user/{user_id}"))
    }

    /// The server's progress record is passed through untyped; its shape is
    /// not fixed across API versions.
    pub fn playlist_progress(&self, playlist_id: i64) -> Result<Value, ApiError> {
        self.http
            .get(&format!("achievements/playlist/{playlist_id}/progress"))
    }

    pub fn progress_stats(&self, user_id: i64) -> Result<ProgressStats, ApiError> {
        self.http.get(&format!("progress/user/{user_id}"))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::http::test_server::{Behavior, TestServer};

    fn client(server: &TestServer) -> ApiClient {
        ApiClient::from_http(JsonHttp::new(
            &server.base_url,
            Duration::from_millis(200),
            Duration::from_millis(500),
        ))
    }

    #[test]
    fn login_posts_credentials_and_decodes_user() {
        let server = TestServer::spawn(vec![Behavior::Respond(
            200,
            r#"{"id":4,"name":"Ada","email":"ada@example.test","password":null}"#.to_string(),
        )]);

        let user = client(&server)
            .login("ada@example.test", "secret")
            .expect("login should succeed");

        assert_eq!(user.id, 4);
        assert_eq!(user.name, "Ada");
        let requests = server.requests();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/api/users/login");
        let body: Value = serde_json::from_str(&requests[0].body).expect("json body");
        assert_eq!(body["email"], "ada@example.test");
        assert_eq!(body["password"], "secret");
    }

    #[test]
    fn login_failure_surfaces_server_message() {
        let server = TestServer::spawn(vec![Behavior::Respond(
            401,
            r#"{"error":"Invalid credentials"}"#.to_string(),
        )]);

        let err = client(&server)
            .login("ada@example.test", "wrong")
            .expect_err("401 should fail");

        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("Invalid credentials"));
    }

    #[test]
    fn status_update_patches_status_field() {
        let server = TestServer::spawn(vec![Behavior::Respond(200, String::new())]);

        client(&server)
            .update_video_status(12, VideoStatus::Completed)
            .expect("status update should succeed");

        let requests = server.requests();
        assert_eq!(requests[0].method, "PATCH");
        assert_eq!(requests[0].path, "/api/videos/12/status");
        assert_eq!(requests[0].body, r#"{"status":"COMPLETED"}"#);
    }

    #[test]
    fn import_sends_url_and_target_playlist() {
        let server = TestServer::spawn(vec![Behavior::Respond(
            200,
            r#"{"importedVideos":14}"#.to_string(),
        )]);

        let result = client(&server)
            .import_playlist("https://youtube.test/playlist?list=abc", 31)
            .expect("import should succeed");

        assert_eq!(result.imported_videos, 14);
        let body: Value =
            serde_json::from_str(&server.requests()[0].body).expect("json body");
        assert_eq!(body["playlistId"], 31);
        assert_eq!(body["playlistUrl"], "https://youtube.test/playlist?list=abc");
    }

    #[test]
    fn delete_note_sends_no_body() {
        let server = TestServer::spawn(vec![Behavior::Respond(204, String::new())]);

        client(&server).delete_note(5).expect("delete should succeed");

        let requests = server.requests();
        assert_eq!(requests[0].method, "DELETE");
        assert_eq!(requests[0].path, "/api/notes/5");
        assert!(requests[0].body.is_empty());
    }
}
