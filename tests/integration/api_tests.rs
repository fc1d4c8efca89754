//! API integration tests
//!
//! These run against a live server with a fresh database. Start the
//! server first, then: cargo test -- --ignored

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an authenticated staff token
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "identifier": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Helper to register a borrower, returning its id
async fn create_borrower(client: &Client, token: &str, external_id: &str) -> i64 {
    let response = client
        .post(format!("{}/borrowers", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "name": "Test Borrower",
            "external_id": external_id,
            "email": format!("{}@example.edu", external_id),
            "department": "Computer Science",
            "kind": "student"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No id in response")
}

/// Helper to catalogue a book, returning its id
async fn create_book(client: &Client, token: &str, isbn: &str, copies: i64) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Integration Testing in Practice",
            "author": "Test Author",
            "isbn": isbn,
            "category": "Testing",
            "total_copies": copies
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No id in response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "identifier": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["principal"]["role"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let wrong_password = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "identifier": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    let unknown_identifier = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "identifier": "no-such-account",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(wrong_password.status(), 401);
    assert_eq!(unknown_identifier.status(), 401);

    // Both failures report the same message so callers cannot probe
    // which field was rejected
    let a: Value = wrong_password.json().await.expect("Failed to parse response");
    let b: Value = unknown_identifier.json().await.expect("Failed to parse response");
    assert_eq!(a["message"], b["message"]);
}

#[tokio::test]
#[ignore]
async fn test_get_current_principal() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["identifier"], "admin");
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_unauthenticated_requests_are_rejected() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_book_crud() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let id = create_book(&client, &token, "978-0000000101", 3).await;

    // A new book starts with every copy on the shelf
    let response = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["available_copies"], 3);

    // Update the title
    let response = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "title": "Renamed" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Duplicate ISBN is rejected
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Duplicate",
            "author": "Someone Else",
            "isbn": "978-0000000101",
            "total_copies": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Delete
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_lifecycle() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let book_id = create_book(&client, &token, "978-0000000201", 1).await;
    let borrower_id = create_borrower(&client, &token, "CS-2001").await;

    // Borrow the only copy
    let response = client
        .post(format!("{}/assignments", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "borrower_id": borrower_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let assignment_id = body["id"].as_i64().expect("No id in response");
    assert_eq!(body["status"], "borrowed");
    assert_eq!(body["book"]["id"], book_id);
    assert_eq!(body["borrower"]["id"], borrower_id);

    // The shelf is now empty, so a second borrow fails
    let second_borrower = create_borrower(&client, &token, "CS-2002").await;
    let response = client
        .post(format!("{}/assignments", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "borrower_id": second_borrower }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    // The book cannot be deleted while a copy is out
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Return on time: no fine
    let response = client
        .post(format!("{}/assignments/{}/return", BASE_URL, assignment_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "returned");
    assert_eq!(body["fine_amount"], 0.0);

    // Double return is rejected
    let response = client
        .post(format!("{}/assignments/{}/return", BASE_URL, assignment_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Paying a fine that was never assessed is rejected
    let response = client
        .post(format!("{}/assignments/{}/pay-fine", BASE_URL, assignment_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    // The copy is back on the shelf
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["available_copies"], 1);
}

#[tokio::test]
#[ignore]
async fn test_past_due_date_is_rejected() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let book_id = create_book(&client, &token, "978-0000000301", 1).await;
    let borrower_id = create_borrower(&client, &token, "CS-3001").await;

    let response = client
        .post(format!("{}/assignments", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "book_id": book_id,
            "borrower_id": borrower_id,
            "due_at": "2020-01-01T00:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_borrower_cannot_hold_same_book_twice() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let book_id = create_book(&client, &token, "978-0000000401", 2).await;
    let borrower_id = create_borrower(&client, &token, "CS-4001").await;

    let response = client
        .post(format!("{}/assignments", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "borrower_id": borrower_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    // Copies remain, but the same pair is refused
    let response = client
        .post(format!("{}/assignments", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "borrower_id": borrower_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_borrower_self_service_scope() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    // Register a borrower with a login password
    let response = client
        .post(format!("{}/borrowers", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "name": "Self Service",
            "external_id": "CS-5001",
            "email": "cs-5001@example.edu",
            "kind": "student",
            "password": "bookworm"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let borrower_id = body["id"].as_i64().unwrap();

    // The borrower signs in with their external id
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "identifier": "CS-5001", "password": "bookworm" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["principal"]["role"], "student");
    let student_token = body["token"].as_str().unwrap().to_string();

    // They can read their own ledger
    let response = client
        .get(format!("{}/borrowers/{}/assignments", BASE_URL, borrower_id))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // But not someone else's, nor the full ledger, nor the catalog writes
    let response = client
        .get(format!("{}/borrowers/{}/assignments", BASE_URL, borrower_id + 1))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = client
        .get(format!("{}/assignments", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token))
        .json(&json!({
            "title": "Not Allowed",
            "author": "Student",
            "isbn": "978-0000000501",
            "total_copies": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_of_last_copy() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let book_id = create_book(&client, &token, "978-0000000601", 1).await;

    let mut borrowers = Vec::new();
    for i in 0..4 {
        borrowers.push(create_borrower(&client, &token, &format!("CS-60{:02}", i)).await);
    }

    // Race four borrows for the single copy
    let mut handles = Vec::new();
    for borrower_id in borrowers {
        let client = client.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            client
                .post(format!("{}/assignments", BASE_URL))
                .header("Authorization", format!("Bearer {}", token))
                .json(&json!({ "book_id": book_id, "borrower_id": borrower_id }))
                .send()
                .await
                .expect("Failed to send request")
                .status()
                .as_u16()
        }));
    }

    let mut created = 0;
    for handle in handles {
        let status = handle.await.expect("Task panicked");
        match status {
            201 => created += 1,
            400 => {}
            other => panic!("Unexpected status {}", other),
        }
    }
    assert_eq!(created, 1);

    // The counter never went negative
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["available_copies"], 0);
}

#[tokio::test]
#[ignore]
async fn test_late_return_assesses_fine() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let book_id = create_book(&client, &token, "978-0000000701", 1).await;
    let borrower_id = create_borrower(&client, &token, "CS-7001").await;

    // Borrow with a due date a moment away
    let due_at = (Utc::now() + Duration::seconds(2)).to_rfc3339();
    let response = client
        .post(format!("{}/assignments", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "book_id": book_id,
            "borrower_id": borrower_id,
            "due_at": due_at
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let assignment_id = body["id"].as_i64().unwrap();

    // Let the loan go overdue, then return: one started day at the
    // default rate
    tokio::time::sleep(std::time::Duration::from_secs(4)).await;

    let response = client
        .post(format!("{}/assignments/{}/return", BASE_URL, assignment_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "returned");
    assert_eq!(body["fine_amount"], 0.5);
    assert_eq!(body["fine_paid"], false);

    // Settle the fine; a second payment is refused
    let response = client
        .post(format!("{}/assignments/{}/pay-fine", BASE_URL, assignment_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["fine_paid"], true);

    let response = client
        .post(format!("{}/assignments/{}/pay-fine", BASE_URL, assignment_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_identifier_shared_across_credential_pools() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    // A borrower whose external id matches the admin's username
    let response = client
        .post(format!("{}/borrowers", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "name": "Name Clash",
            "external_id": "admin",
            "email": "clash@example.edu",
            "kind": "student",
            "password": "shelves99"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    // The staff password still resolves to the staff account
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "identifier": "admin", "password": "admin" }))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["principal"]["role"], "admin");

    // The borrower password falls through to the borrower pool
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "identifier": "admin", "password": "shelves99" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["principal"]["role"], "student");
}

#[tokio::test]
#[ignore]
async fn test_change_own_password() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/borrowers", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "name": "Key Turner",
            "external_id": "CS-8001",
            "email": "cs-8001@example.edu",
            "kind": "student",
            "password": "oldpass"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "identifier": "CS-8001", "password": "oldpass" }))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let student_token = body["token"].as_str().unwrap().to_string();

    // A wrong current password is rejected without changing anything
    let response = client
        .put(format!("{}/auth/password", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token))
        .json(&json!({ "current_password": "wrong", "new_password": "newpass" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);

    let response = client
        .put(format!("{}/auth/password", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token))
        .json(&json!({ "current_password": "oldpass", "new_password": "newpass" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    // The old password no longer works; the new one does
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "identifier": "CS-8001", "password": "oldpass" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "identifier": "CS-8001", "password": "newpass" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_stats() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total_books"].is_number());
    assert!(body["active_assignments"].is_number());
    assert!(body["unpaid_fines"].is_number());
}
