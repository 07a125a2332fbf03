//! Integration tests per gli endpoint delle conversazioni

mod common;

#[cfg(test)]
mod chat_tests {
    use super::common::*;
    use axum_test::TestServer;
    use axum_test::http::{HeaderName, StatusCode};
    use novachat_server::core::AppState;
    use serde_json::json;
    use std::sync::Arc;

    async fn setup() -> (TestServer, Arc<AppState>) {
        let state = create_test_state().await;
        let server = create_test_server(state.clone());
        (server, state)
    }

    fn bearer(token: &str) -> (HeaderName, String) {
        (
            HeaderName::from_static("authorization"),
            format!("Bearer {}", token),
        )
    }

    // ============================================================
    // POST /chats - get-or-create per coppia non ordinata
    // ============================================================

    #[tokio::test]
    async fn test_create_chat_is_symmetric() {
        let (server, state) = setup().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;

        let (name, value) = bearer(&create_test_jwt(alice.user_id, "alice"));
        let response = server
            .post("/chats")
            .add_header(name, value)
            .json(&json!({ "userId": bob.user_id }))
            .await;
        response.assert_status_ok();
        let chat_ab = response.json::<serde_json::Value>()["chatId"].as_i64().unwrap();

        // stessa coppia, direzione opposta: stessa chat
        let (name, value) = bearer(&create_test_jwt(bob.user_id, "bob"));
        let response = server
            .post("/chats")
            .add_header(name, value)
            .json(&json!({ "userId": alice.user_id }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["chatId"].as_i64().unwrap(), chat_ab);
        assert_eq!(
            body["participant"]["userId"].as_i64().unwrap(),
            alice.user_id
        );
    }

    #[tokio::test]
    async fn test_create_chat_with_self_rejected() {
        let (server, state) = setup().await;
        let alice = seed_user(&state, "alice").await;

        let (name, value) = bearer(&create_test_jwt(alice.user_id, "alice"));
        let response = server
            .post("/chats")
            .add_header(name, value)
            .json(&json!({ "userId": alice.user_id }))
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_create_chat_with_missing_user() {
        let (server, state) = setup().await;
        let alice = seed_user(&state, "alice").await;

        let (name, value) = bearer(&create_test_jwt(alice.user_id, "alice"));
        let response = server
            .post("/chats")
            .add_header(name, value)
            .json(&json!({ "userId": 9999 }))
            .await;
        response.assert_status_not_found();
    }

    // ============================================================
    // POST /chats/join/{code} - bootstrap via invito
    // ============================================================

    #[tokio::test]
    async fn test_join_by_link_reuses_existing_chat() {
        let (server, state) = setup().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;

        // chat già esistente tra i due
        let existing = state
            .chat
            .get_or_create(alice.user_id, bob.user_id)
            .await
            .unwrap();

        let (name, value) = bearer(&create_test_jwt(alice.user_id, "alice"));
        let response = server.post("/chat-link").add_header(name, value).await;
        let code = response.json::<serde_json::Value>()["code"]
            .as_str()
            .unwrap()
            .to_string();

        let (name, value) = bearer(&create_test_jwt(bob.user_id, "bob"));
        let response = server
            .post(&format!("/chats/join/{}", code))
            .add_header(name, value)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["chatId"].as_i64().unwrap(), existing.chat_id);
        assert_eq!(
            body["participant"]["userId"].as_i64().unwrap(),
            alice.user_id
        );
    }

    #[tokio::test]
    async fn test_join_own_link_rejected() {
        let (server, state) = setup().await;
        let alice = seed_user(&state, "alice").await;

        let alice_token = create_test_jwt(alice.user_id, "alice");
        let (name, value) = bearer(&alice_token);
        let response = server.post("/chat-link").add_header(name, value).await;
        let code = response.json::<serde_json::Value>()["code"]
            .as_str()
            .unwrap()
            .to_string();

        let (name, value) = bearer(&alice_token);
        let response = server
            .post(&format!("/chats/join/{}", code))
            .add_header(name, value)
            .await;
        response.assert_status_bad_request();
    }

    // ============================================================
    // GET /chats - lista ordinata per attività recente
    // ============================================================

    #[tokio::test]
    async fn test_list_chats_sorted_by_recent_activity() {
        let (server, state) = setup().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;
        let carol = seed_user(&state, "carol").await;

        let chat_bob = state
            .chat
            .get_or_create(alice.user_id, bob.user_id)
            .await
            .unwrap();
        let chat_carol = state
            .chat
            .get_or_create(alice.user_id, carol.user_id)
            .await
            .unwrap();

        // attività sulla chat con Bob: deve risalire in testa
        let (name, value) = bearer(&create_test_jwt(bob.user_id, "bob"));
        server
            .post(&format!("/chats/{}/messages", chat_bob.chat_id))
            .add_header(name, value)
            .json(&json!({ "content": "ciao" }))
            .await
            .assert_status(StatusCode::CREATED);

        let (name, value) = bearer(&create_test_jwt(alice.user_id, "alice"));
        let response = server.get("/chats").add_header(name, value).await;
        response.assert_status_ok();

        let chats: Vec<serde_json::Value> = response.json();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0]["chatId"].as_i64().unwrap(), chat_bob.chat_id);
        assert_eq!(chats[1]["chatId"].as_i64().unwrap(), chat_carol.chat_id);
        assert_eq!(chats[0]["unreadCount"].as_i64().unwrap(), 1);
        assert_eq!(
            chats[0]["lastMessage"]["content"].as_str().unwrap(),
            "ciao"
        );
    }

    // ============================================================
    // DELETE /chats/{chat_id} + PUT /chats/{chat_id}/read
    // ============================================================

    #[tokio::test]
    async fn test_delete_chat_allows_a_new_conversation() {
        let (server, state) = setup().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;

        let chat = state
            .chat
            .get_or_create(alice.user_id, bob.user_id)
            .await
            .unwrap();

        let (name, value) = bearer(&create_test_jwt(alice.user_id, "alice"));
        server
            .delete(&format!("/chats/{}", chat.chat_id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let (name, value) = bearer(&create_test_jwt(alice.user_id, "alice"));
        let response = server.get("/chats").add_header(name, value).await;
        let chats: Vec<serde_json::Value> = response.json();
        assert!(chats.is_empty());

        // la coppia può ripartire con una nuova conversazione
        let fresh = state
            .chat
            .get_or_create(bob.user_id, alice.user_id)
            .await
            .unwrap();
        assert_ne!(fresh.chat_id, chat.chat_id);
    }

    #[tokio::test]
    async fn test_mark_chat_read_resets_counter_idempotently() {
        let (server, state) = setup().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;

        let chat = state
            .chat
            .get_or_create(alice.user_id, bob.user_id)
            .await
            .unwrap();

        let (name, value) = bearer(&create_test_jwt(bob.user_id, "bob"));
        server
            .post(&format!("/chats/{}/messages", chat.chat_id))
            .add_header(name, value)
            .json(&json!({ "content": "unread" }))
            .await
            .assert_status(StatusCode::CREATED);

        assert_eq!(
            state
                .chat
                .unread_count(&chat.chat_id, &alice.user_id)
                .await
                .unwrap(),
            1
        );

        let alice_token = create_test_jwt(alice.user_id, "alice");
        for _ in 0..2 {
            let (name, value) = bearer(&alice_token);
            server
                .put(&format!("/chats/{}/read", chat.chat_id))
                .add_header(name, value)
                .await
                .assert_status(StatusCode::NO_CONTENT);
        }

        assert_eq!(
            state
                .chat
                .unread_count(&chat.chat_id, &alice.user_id)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_chat_routes_require_membership() {
        let (server, state) = setup().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;
        let mallory = seed_user(&state, "mallory").await;

        let chat = state
            .chat
            .get_or_create(alice.user_id, bob.user_id)
            .await
            .unwrap();

        let (name, value) = bearer(&create_test_jwt(mallory.user_id, "mallory"));
        let response = server
            .get(&format!("/chats/{}/messages", chat.chat_id))
            .add_header(name, value)
            .await;
        // mai rivelare che la chat esiste
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_list_chats_without_token() {
        let (server, _state) = setup().await;
        let response = server.get("/chats").await;
        response.assert_status_forbidden();
    }
}
