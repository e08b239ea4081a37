//! Input validation and stored-data edge cases.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn long_username_rejected() {
    let app = TestApp::new();
    let username = format!("@{}", "a".repeat(32));

    let (status, body) = app
        .request(
            Method::POST,
            "/api/register",
            Some(json!({ "name": "Long", "username": username })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username must be at most 32 characters");

    app.register(&username[..32]).await;
}

#[tokio::test]
async fn message_page_capped() {
    let app = TestApp::new();
    let (user_id, token) = app.register("@flood").await;
    app.post("/api/chats", json!({ "id": 7, "type": "group", "name": "Flood" }), &token).await;

    app.state
        .db
        .with_conn(|conn| {
            for i in 0..205 {
                conn.execute(
                    "INSERT INTO messages (chat_id, user_id, text, sender, time, date)
                     VALUES (7, ?1, ?2, 'me', '12:00', '2024-01-01')",
                    (user_id, format!("msg {i}")),
                )?;
            }
            Ok(())
        })
        .unwrap();

    let (status, page) = app.get("/api/chats/7/messages?limit=1000", &token).await;
    assert_eq!(status, StatusCode::OK);
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 200);
    assert_eq!(page[199]["text"], "msg 204");

    let (_, page) = app.get("/api/chats/7/messages?limit=0", &token).await;
    assert_eq!(page.as_array().unwrap().len(), 1);

    let (_, page) = app.get("/api/chats/7/messages", &token).await;
    assert_eq!(page.as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn corrupt_payloads_decode_to_defaults() {
    let app = TestApp::new();
    let (user_id, token) = app.register("@archive").await;
    app.post("/api/chats", json!({ "id": 8, "type": "private", "name": "Old" }), &token).await;

    app.state
        .db
        .with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (chat_id, user_id, sender, time, date, type, gift_data, call_info, reactions)
                 VALUES (8, ?1, 'them', '09:30', '2023-05-05', 'gift', '{not json', 'also[bad', 'oops')",
                [user_id],
            )?;
            Ok(())
        })
        .unwrap();

    let (status, messages) = app.get("/api/chats/8/messages", &token).await;
    assert_eq!(status, StatusCode::OK);
    let message = &messages[0];
    assert!(message["giftData"].is_null());
    assert!(message["callInfo"].is_null());
    assert_eq!(message["reactions"], json!({}));
}

#[tokio::test]
async fn sender_name_is_display_name() {
    let app = TestApp::new();
    let (_, token) = app.register("@named").await;
    app.post("/api/chats", json!({ "id": 11, "type": "group", "name": "Names" }), &token).await;

    let (_, message) = app.post("/api/messages", json!({ "chatId": 11, "text": "hi" }), &token).await;
    assert_eq!(message["senderName"], "Test User");
}

#[tokio::test]
async fn blank_fields_rejected() {
    let app = TestApp::new();
    let (_, token) = app.register("@blank").await;

    let (status, body) = app.post("/api/chats", json!({ "id": 1, "type": "group", "name": "   " }), &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Chat name required");

    app.post("/api/chats", json!({ "id": 2, "type": "group", "name": "Real" }), &token).await;
    let (_, message) = app.post("/api/messages", json!({ "chatId": 2, "text": "react" }), &token).await;
    let (status, body) = app
        .post(&format!("/api/messages/{}/reactions", message["id"]), json!({ "emoji": " " }), &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Emoji required");

    let bot = json!({ "id": "b1", "name": "Bot", "username": "@b1_bot", "token": "1:A" });
    for field in ["id", "name", "username", "token"] {
        let mut blanked = bot.clone();
        blanked[field] = json!("");
        let (status, _) = app.post("/api/bots", blanked, &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "blank bot {field} accepted");
    }
    let (_, bots) = app.get("/api/bots", &token).await;
    assert!(bots.as_array().unwrap().is_empty());

    let (status, body) = app.put("/api/user", json!({ "name": "", "bio": "x" }), &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name required");
    let (_, user) = app.get("/api/user", &token).await;
    assert_eq!(user["name"], "Test");
}
