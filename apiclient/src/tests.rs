// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tests of the backend endpoints against a mock server.

use futures_util::StreamExt;
use parleycommon::{
    records::{FeedRecord, RecordContent, UserRecord},
    settings::BackendSettings,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

use crate::{ApiClient, RequestError, feed_api::FeedStreamError};

fn client(server: &MockServer, auth_token: Option<&str>) -> ApiClient {
    let settings = BackendSettings {
        database_url: server.uri(),
        storage_url: server.uri(),
        bucket: "chat.appspot.com".to_owned(),
        auth_token: auth_token.map(ToOwned::to_owned),
    };
    ApiClient::with_default_http_client(&settings).expect("Failed to initialize client")
}

#[tokio::test]
async fn user_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/u1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "displayname": "Amy",
            "id": "u1",
            "profileUrl": "http://x/amy.png"
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/u2.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, None);

    let user = client
        .user_record(&"u1".parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.display_name, "Amy");
    assert_eq!(user.profile_url(), Some("http://x/amy.png"));

    let user = client.user_record(&"u2".parse().unwrap()).await.unwrap();
    assert_eq!(user, None);
}

#[tokio::test]
async fn put_user_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/users/u1.json"))
        .and(query_param("auth", "secret"))
        .and(body_json(json!({
            "displayname": "anonymous",
            "id": "u1",
            "profileUrl": ""
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "displayname": "anonymous",
            "id": "u1",
            "profileUrl": ""
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/u2.json"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, Some("secret"));
    let record = UserRecord {
        display_name: "anonymous".to_owned(),
        id: "u1".to_owned(),
        profile_url: String::new(),
    };
    client
        .put_user_record(&"u1".parse().unwrap(), &record)
        .await
        .unwrap();

    let res = client.put_user_record(&"u2".parse().unwrap(), &record).await;
    assert!(matches!(res, Err(RequestError::Network(_))));
}

#[tokio::test]
async fn append_message_with_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages.json"))
        .and(query_param("auth", "secret"))
        .and(body_json(json!({
            "senderId": "u1",
            "senderName": "Amy",
            "mediaType": "TEXT",
            "text": "hi"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "-Nabc"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, Some("secret"));
    let record = FeedRecord {
        sender_id: "u1".parse().unwrap(),
        sender_name: "Amy".to_owned(),
        content: RecordContent::Text {
            text: "hi".to_owned(),
        },
    };
    let key = client.append_message(&record).await.unwrap();
    assert_eq!(key, "-Nabc");
}

#[tokio::test]
async fn upload_blob_returns_download_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v0/b/chat.appspot.com/o"))
        .and(query_param("name", "u1/1700000000000"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "u1/1700000000000",
            "bucket": "chat.appspot.com",
            "contentType": "image/jpeg",
            "downloadTokens": "tok1,tok2"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, None);
    let url = client
        .upload_blob("u1/1700000000000", vec![0xff, 0xd8, 0xff], "image/jpeg")
        .await
        .unwrap();

    assert_eq!(
        url.as_str(),
        format!(
            "{}/v0/b/chat.appspot.com/o/u1%2F1700000000000?alt=media&token=tok1",
            mock_server.uri()
        )
    );
}

#[tokio::test]
async fn failed_upload_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v0/b/chat.appspot.com/o"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, None);
    let res = client
        .upload_blob("u1/1", b"data".to_vec(), "video/mp4")
        .await;
    assert!(matches!(res, Err(RequestError::Network(_))));
}

#[tokio::test]
async fn download() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/media/y.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg bytes".to_vec()))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, None);

    let url = format!("{}/media/y.jpg", mock_server.uri()).parse().unwrap();
    let bytes = client.download(&url).await.unwrap();
    assert_eq!(&bytes[..], b"jpeg bytes");

    let url = format!("{}/media/missing.jpg", mock_server.uri())
        .parse()
        .unwrap();
    assert!(client.download(&url).await.is_err());
}

#[tokio::test]
async fn subscribe_messages() {
    let mock_server = MockServer::start().await;

    let body = concat!(
        "event: put\n",
        "data: {\"path\":\"/\",\"data\":{\"-a\":{\"senderId\":\"u1\",\"senderName\":\"Amy\",\"mediaType\":\"TEXT\",\"text\":\"hi\"}}}\n",
        "\n",
        "event: keep-alive\n",
        "data: null\n",
        "\n",
        "event: put\n",
        "data: {\"path\":\"/-b\",\"data\":{\"senderId\":\"u2\",\"senderName\":\"Bo\",\"mediaType\":\"PHOTO\",\"fileURL\":\"http://x/y.jpg\"}}\n",
        "\n",
        "event: put\n",
        "data: {\"path\":\"/-a\",\"data\":{\"senderId\":\"u1\",\"senderName\":\"Amy\",\"mediaType\":\"TEXT\",\"text\":\"hi\"}}\n",
        "\n",
    );

    Mock::given(method("GET"))
        .and(path("/messages.json"))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, None);
    let children: Vec<_> = client
        .subscribe_messages()
        .await
        .unwrap()
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(
        children,
        vec![
            json!({"senderId": "u1", "senderName": "Amy", "mediaType": "TEXT", "text": "hi"}),
            json!({"senderId": "u2", "senderName": "Bo", "mediaType": "PHOTO", "fileURL": "http://x/y.jpg"}),
        ]
    );
}

#[tokio::test]
async fn subscribe_messages_cancelled() {
    let mock_server = MockServer::start().await;

    let body = "event: cancel\ndata: \"Permission denied\"\n\n";
    Mock::given(method("GET"))
        .and(path("/messages.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, None);
    let events: Vec<_> = client
        .subscribe_messages()
        .await
        .unwrap()
        .collect::<Vec<_>>()
        .await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Err(FeedStreamError::Cancelled(_))));
}
